// Home Price Estimator - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod rates;
pub mod estimator;
pub mod validation;
pub mod predictor;
pub mod format;
pub mod share;
pub mod store;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use rates::{LocationRateTable, DEFAULT_BASE_RATE, sample_locations};
pub use estimator::{
    MockEstimator, PriceQuery, EstimateResult,
    RandomSource, RngSource, jitter_from_unit,
};
pub use validation::{
    FormInput, ValidationError, ValidationResult, validate_form,
    MIN_AREA_SQFT, MAX_AREA_SQFT,
};
pub use predictor::{
    PriceBackend, BackendError, OfflineBackend,
    Predictor, Prediction, PriceSource, LocationList,
};
pub use format::{format_inr, format_lakh, group_indian, rupees_to_lakh, lakh_to_rupees};
pub use share::{ShareCard, SHARE_TITLE};
pub use store::{
    SavedEstimate, MAX_SAVED_ESTIMATES,
    open_store, setup_store, save_estimate, list_saved_estimates,
    count_saved_estimates, clear_saved_estimates, export_csv,
};
pub use config::{Config, init_tracing, CLI_LOG_FILTER, DEFAULT_LOG_FILTER, TUI_LOG_FILTER};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
