// Form → estimate → save → export, through the public API only

use home_price_estimator::{
    export_csv, format_inr, list_saved_estimates, save_estimate, setup_store, validate_form,
    FormInput, LocationRateTable, MockEstimator, OfflineBackend, Predictor, PriceQuery,
    RngSource, SavedEstimate, ShareCard, DEFAULT_BASE_RATE,
};
use rusqlite::Connection;

fn form(location: &str, sqft: f64, bhk: u32, bath: u32) -> FormInput {
    FormInput {
        location: location.to_string(),
        total_sqft: Some(sqft),
        bhk,
        bath,
    }
}

#[test]
fn every_known_location_stays_inside_jitter_band() {
    let estimator = MockEstimator::default();
    let mut rng = RngSource::seeded(7);

    for location in estimator.table().location_names() {
        let base = estimator.table().rate_for(&location) * 1500.0;
        let query = PriceQuery::new(location.clone(), 1500.0, 1, 1);

        for _ in 0..50 {
            let price = estimator.estimate(&query, &mut rng).price as f64;
            assert!(price >= (base * 0.9).floor(), "{} too low: {}", location, price);
            assert!(price <= (base * 1.1).ceil(), "{} too high: {}", location, price);
        }
    }
}

#[test]
fn unknown_location_prices_at_default_rate() {
    let estimator = MockEstimator::default();
    let result = estimator.estimate(&PriceQuery::new("Nowhere", 1000.0, 1, 1), &mut || 0.5);

    assert_eq!(result.price, (DEFAULT_BASE_RATE * 1000.0) as u64);
}

#[test]
fn offline_form_submission_end_to_end() {
    let conn = Connection::open_in_memory().unwrap();
    setup_store(&conn).unwrap();

    let predictor = Predictor::new(OfflineBackend, MockEstimator::default());
    let query = validate_form(&form("Koramangala", 1000.0, 2, 2)).unwrap();
    let prediction = predictor.predict(&query, &mut || 0.5);

    assert!(prediction.is_fallback());
    assert_eq!(prediction.display_price(), format_inr(9_817_500));

    let card = ShareCard::new(&query.location, query.area_sqft, query.bedrooms, query.bathrooms, prediction.display_price());
    assert!(card.share_text().contains("Estimated Price: ₹ 98,17,500"));

    let saved = SavedEstimate::new(prediction.display_price(), query.location, query.area_sqft, query.bedrooms, query.bathrooms);
    save_estimate(&conn, &saved).unwrap();

    let listed = list_saved_estimates(&conn).unwrap();
    assert_eq!(listed.len(), 1);

    let mut csv_out = Vec::new();
    export_csv(&listed, &mut csv_out).unwrap();
    let csv_text = String::from_utf8(csv_out).unwrap();
    assert!(csv_text.contains("\"₹ 98,17,500\""));
}

#[test]
fn invalid_form_never_reaches_estimator() {
    let errors = validate_form(&form("Koramangala", 12_000.0, 2, 2)).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Please enter a valid square footage between 300 and 10,000"
    );
}

#[test]
fn custom_table_from_json() {
    let table = LocationRateTable::from_json_str(
        r#"{"default_rate": 4000, "rates": {"Hebbal": 7000, "Jayanagar": 9500}}"#,
    )
    .unwrap();
    let estimator = MockEstimator::new(table);

    let hebbal = estimator.estimate_with_jitter(&PriceQuery::new("Hebbal", 1000.0, 3, 1), 1.0);
    let elsewhere = estimator.estimate_with_jitter(&PriceQuery::new("Whitefield", 1000.0, 1, 1), 1.0);

    assert_eq!(hebbal.price, 8_400_000);
    assert_eq!(elsewhere.price, 4_000_000);
}
