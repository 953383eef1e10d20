// 📤 Share text for an estimate

use serde::{Deserialize, Serialize};
use std::fmt;

pub const SHARE_TITLE: &str = "Bangalore Home Price Estimate";

/// What the share button hands out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCard {
    pub location: String,
    pub area_sqft: f64,
    pub bhk: u32,
    pub bath: u32,

    /// Already formatted, e.g. "₹ 98,17,500"
    pub price: String,
}

impl ShareCard {
    pub fn new(location: impl Into<String>, area_sqft: f64, bhk: u32, bath: u32, price: impl Into<String>) -> Self {
        ShareCard {
            location: location.into(),
            area_sqft,
            bhk,
            bath,
            price: price.into(),
        }
    }

    /// "1200 sq. ft."
    pub fn sqft_label(&self) -> String {
        format!("{} sq. ft.", self.area_sqft)
    }

    pub fn share_text(&self) -> String {
        format!(
            "Check out this home price estimate for Bangalore:\n\n\
             Location: {}\n\
             Size: {}\n\
             {} BHK\n\
             Estimated Price: {}\n\n\
             Generated by Bangalore Home Price Predictor",
            self.location,
            self.sqft_label(),
            self.bhk,
            self.price
        )
    }

    /// Link back to the form with this estimate's inputs filled in
    pub fn share_url(&self, base: &str) -> String {
        format!(
            "{}?location={}&total_sqft={}&bhk={}&bath={}",
            base.trim_end_matches('?'),
            urlencoding::encode(&self.location),
            self.area_sqft,
            self.bhk,
            self.bath
        )
    }
}

impl fmt::Display for ShareCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.share_text())
    }
}
