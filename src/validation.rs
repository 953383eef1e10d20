// 📐 Form Validation - Raw form input → PriceQuery
// The estimator trusts its input; every range check lives here

use crate::estimator::PriceQuery;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_AREA_SQFT: f64 = 300.0;
pub const MAX_AREA_SQFT: f64 = 10_000.0;

// ============================================================================
// FORM INPUT
// ============================================================================

/// Values exactly as the form submits them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub location: String,

    /// `None` when the field was left blank
    #[serde(default)]
    pub total_sqft: Option<f64>,

    #[serde(default = "default_count")]
    pub bhk: u32,

    #[serde(default = "default_count")]
    pub bath: u32,
}

fn default_count() -> u32 {
    1
}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub type ValidationResult = Result<PriceQuery, Vec<ValidationError>>;

/// Validate a submitted form, collecting every problem
pub fn validate_form(input: &FormInput) -> ValidationResult {
    let mut errors = Vec::new();

    let location = input.location.trim();
    if location.is_empty() {
        errors.push(ValidationError::new("location", "Please select a location"));
    }

    let area = match input.total_sqft {
        Some(area) if area.is_finite() && (MIN_AREA_SQFT..=MAX_AREA_SQFT).contains(&area) => area,
        _ => {
            errors.push(ValidationError::new(
                "total_sqft",
                "Please enter a valid square footage between 300 and 10,000",
            ));
            0.0
        }
    };

    if input.bhk == 0 {
        errors.push(ValidationError::new("bhk", "Bedroom count must be at least 1"));
    }

    if input.bath == 0 {
        errors.push(ValidationError::new("bath", "Bathroom count must be at least 1"));
    }

    if errors.is_empty() {
        Ok(PriceQuery::new(location, area, input.bhk, input.bath))
    } else {
        Err(errors)
    }
}

// ============================================================================
// TESTS
// ============================================================================
