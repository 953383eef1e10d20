// 🔮 Predictor - Backend first, mock formula as fallback

use crate::estimator::{MockEstimator, PriceQuery, RandomSource};
use crate::format::{format_inr, format_lakh, lakh_to_rupees};
use crate::rates::sample_locations;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// BACKEND COLLABORATOR
// ============================================================================

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("prediction backend unavailable: {0}")]
    Unavailable(String),

    #[error("prediction backend returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// The remote service answering `get_location_names` and `predict_home_price`
pub trait PriceBackend {
    fn location_names(&self) -> Result<Vec<String>, BackendError>;

    /// Predicted price in lakh
    fn predict(&self, query: &PriceQuery) -> Result<f64, BackendError>;
}

/// A backend that is never reachable; every call takes the fallback path
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineBackend;

impl PriceBackend for OfflineBackend {
    fn location_names(&self) -> Result<Vec<String>, BackendError> {
        Err(BackendError::Unavailable("no backend configured".to_string()))
    }

    fn predict(&self, _query: &PriceQuery) -> Result<f64, BackendError> {
        Err(BackendError::Unavailable("no backend configured".to_string()))
    }
}

// ============================================================================
// PREDICTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// Answered by the prediction backend (lakh)
    Backend,
    /// Computed locally by the mock estimator (rupees)
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub price_rupees: u64,

    /// Only set when the backend answered
    pub price_lakh: Option<f64>,

    pub source: PriceSource,
}

impl Prediction {
    pub fn is_fallback(&self) -> bool {
        self.source == PriceSource::Fallback
    }

    /// Backend answers read as lakh, fallback answers as full rupees
    pub fn display_price(&self) -> String {
        match (self.source, self.price_lakh) {
            (PriceSource::Backend, Some(lakh)) => format_lakh(lakh),
            _ => format_inr(self.price_rupees),
        }
    }
}

/// Reject backend prices that cannot be shown
fn checked_lakh(lakh: f64) -> Result<f64, BackendError> {
    if lakh.is_finite() && lakh >= 0.0 {
        Ok(lakh)
    } else {
        Err(BackendError::InvalidResponse(format!("price {} lakh", lakh)))
    }
}

/// Location list plus whether it came from the backend
#[derive(Debug, Clone, PartialEq)]
pub struct LocationList {
    pub names: Vec<String>,
    pub from_backend: bool,
}

// ============================================================================
// PREDICTOR
// ============================================================================

pub struct Predictor<B: PriceBackend> {
    backend: B,
    fallback: MockEstimator,
}

impl<B: PriceBackend> Predictor<B> {
    pub fn new(backend: B, fallback: MockEstimator) -> Self {
        Predictor { backend, fallback }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn estimator(&self) -> &MockEstimator {
        &self.fallback
    }

    /// Ask the backend; on any failure compute the mock estimate
    pub fn predict<R: RandomSource + ?Sized>(&self, query: &PriceQuery, rng: &mut R) -> Prediction {
        match self.backend.predict(query).and_then(checked_lakh) {
            Ok(lakh) => Prediction {
                price_rupees: lakh_to_rupees(lakh),
                price_lakh: Some(lakh),
                source: PriceSource::Backend,
            },
            Err(err) => {
                tracing::warn!(error = %err, "backend prediction failed, using mock estimate");
                self.fallback_prediction(query, rng)
            }
        }
    }

    fn fallback_prediction<R: RandomSource + ?Sized>(&self, query: &PriceQuery, rng: &mut R) -> Prediction {
        let result = self.fallback.estimate(query, rng);
        Prediction {
            price_rupees: result.price,
            price_lakh: None,
            source: PriceSource::Fallback,
        }
    }

    /// Backend locations, or the built-in sample list when it fails
    pub fn locations(&self) -> LocationList {
        match self.backend.location_names() {
            Ok(names) => {
                tracing::debug!(count = names.len(), "locations loaded from backend");
                LocationList {
                    names,
                    from_backend: true,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not load locations, using sample data");
                LocationList {
                    names: sample_locations(),
                    from_backend: false,
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
