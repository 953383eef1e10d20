// Home Price Estimator - HTTP API
// Serves the two endpoints the browser form calls, backed by the mock estimator

use crate::estimator::{MockEstimator, RngSource};
use crate::format::{format_inr, rupees_to_lakh};
use crate::share::{ShareCard, SHARE_TITLE};
use crate::store::{list_saved_estimates, save_estimate, SavedEstimate};
use crate::validation::{validate_form, FormInput, ValidationError, ValidationResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Form, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<MockEstimator>,
    pub db: Arc<Mutex<Connection>>,

    /// Page the share link points back to
    pub public_url: String,
}

impl AppState {
    pub fn new(estimator: MockEstimator, conn: Connection, public_url: impl Into<String>) -> Self {
        AppState {
            estimator: Arc::new(estimator),
            db: Arc::new(Mutex::new(conn)),
            public_url: public_url.into(),
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Connection>, Response> {
        self.db.lock().map_err(|_| {
            tracing::error!("estimate store lock poisoned");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "store unavailable")
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ApiResponse {
        success: false,
        data: (),
        error: Some(message.to_string()),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Request / response shapes
// ============================================================================

#[derive(Serialize, Deserialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

/// Form fields arrive as text; blanks and junk become validation errors
#[derive(Debug, Default, Deserialize)]
pub struct PredictForm {
    #[serde(default)]
    location: String,
    #[serde(default)]
    total_sqft: String,
    #[serde(default)]
    bhk: String,
    #[serde(default)]
    bath: String,
}

impl PredictForm {
    /// Counts that are not whole numbers are reported here; blanks fall through to `validate_form`
    fn into_input(self) -> (FormInput, Vec<ValidationError>) {
        let mut errors = Vec::new();
        let bhk = parse_count(&self.bhk, "bhk", "Bedroom count must be a whole number", &mut errors);
        let bath = parse_count(&self.bath, "bath", "Bathroom count must be a whole number", &mut errors);

        let input = FormInput {
            location: self.location,
            total_sqft: self.total_sqft.trim().parse().ok(),
            bhk,
            bath,
        };
        (input, errors)
    }

    fn validate(self) -> ValidationResult {
        let (input, mut errors) = self.into_input();
        match validate_form(&input) {
            Ok(query) if errors.is_empty() => Ok(query),
            Ok(_) => Err(errors),
            Err(more) => {
                errors.extend(more);
                Err(errors)
            }
        }
    }
}

fn parse_count(text: &str, field: &str, message: &str, errors: &mut Vec<ValidationError>) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    match text.parse() {
        Ok(count) => count,
        Err(_) => {
            errors.push(ValidationError::new(field, message));
            // already reported; keep the range check quiet
            1
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PredictResponse {
    /// Lakh, two decimals
    pub estimated_price: f64,
}

#[derive(Serialize)]
struct ValidationFailure {
    success: bool,
    errors: Vec<ValidationError>,
}

fn validation_failure(errors: Vec<ValidationError>) -> Response {
    let body = ValidationFailure {
        success: false,
        errors,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

#[derive(Serialize)]
struct RateResponse {
    location: String,
    rate: f64,
    known: bool,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub location: String,
    pub total_sqft: f64,
    pub bhk: u32,
    pub bath: u32,
    pub price: u64,
}

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub location: String,
    pub total_sqft: f64,
    pub bhk: u32,
    pub bath: u32,
    pub price: u64,
}

#[derive(Serialize)]
struct ShareResponse {
    title: &'static str,
    text: String,
    url: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /get_location_names
async fn get_location_names(State(state): State<AppState>) -> impl IntoResponse {
    Json(LocationsResponse {
        locations: state.estimator.table().location_names(),
    })
}

/// POST /predict_home_price - form-encoded location, total_sqft, bhk, bath
async fn predict_home_price(State(state): State<AppState>, Form(form): Form<PredictForm>) -> Response {
    let query = match form.validate() {
        Ok(query) => query,
        Err(errors) => {
            tracing::info!(errors = errors.len(), "rejected prediction request");
            return validation_failure(errors);
        }
    };

    let result = state.estimator.estimate(&query, &mut RngSource::thread());
    tracing::info!(location = %query.location, price = result.price, "prediction served");

    Json(PredictResponse {
        estimated_price: rupees_to_lakh(result.price),
    })
    .into_response()
}

/// GET /api/rates/:location
async fn get_rate(State(state): State<AppState>, Path(location): Path<String>) -> impl IntoResponse {
    let table = state.estimator.table();
    Json(ApiResponse::ok(RateResponse {
        rate: table.rate_for(&location),
        known: table.contains(&location),
        location,
    }))
}

/// GET /api/estimates - saved estimates, newest first
async fn get_estimates(State(state): State<AppState>) -> Response {
    let conn = match state.db() {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };

    match list_saved_estimates(&conn) {
        Ok(estimates) => (StatusCode::OK, Json(ApiResponse::ok(estimates))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "listing saved estimates failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "could not list estimates")
        }
    }
}

/// POST /api/estimates - save one estimate (JSON body)
async fn post_estimate(State(state): State<AppState>, Json(req): Json<SaveRequest>) -> Response {
    let input = FormInput {
        location: req.location,
        total_sqft: Some(req.total_sqft),
        bhk: req.bhk,
        bath: req.bath,
    };
    let query = match validate_form(&input) {
        Ok(query) => query,
        Err(errors) => {
            tracing::info!(errors = errors.len(), "rejected save request");
            return validation_failure(errors);
        }
    };

    let estimate = SavedEstimate::new(
        format_inr(req.price),
        query.location,
        query.area_sqft,
        query.bedrooms,
        query.bathrooms,
    );

    let conn = match state.db() {
        Ok(conn) => conn,
        Err(resp) => return resp,
    };

    match save_estimate(&conn, &estimate) {
        Ok(_) => (StatusCode::CREATED, Json(ApiResponse::ok(estimate))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "saving estimate failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "could not save estimate")
        }
    }
}

/// GET /api/share?location=..&total_sqft=..&bhk=..&bath=..&price=..
async fn share(State(state): State<AppState>, Query(q): Query<ShareQuery>) -> impl IntoResponse {
    let card = ShareCard::new(q.location, q.total_sqft, q.bhk, q.bath, format_inr(q.price));

    Json(ApiResponse::ok(ShareResponse {
        title: SHARE_TITLE,
        text: card.share_text(),
        url: card.share_url(&state.public_url),
    }))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/rates/:location", get(get_rate))
        .route("/estimates", get(get_estimates).post(post_estimate))
        .route("/share", get(share))
        .with_state(state.clone());

    Router::new()
        .route("/get_location_names", get(get_location_names))
        .route("/predict_home_price", axum::routing::post(predict_home_price))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================
