// Home Price Estimator - Web Server
// Answers the form's location and prediction requests with the mock estimator

use anyhow::{Context, Result};
use home_price_estimator::api::{router, AppState};
use home_price_estimator::{init_tracing, open_store, Config, MockEstimator, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_LOG_FILTER);

    println!("🌐 Home Price Estimator - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env()?;

    let table = config.load_rate_table()?;
    println!("✓ Rate table: {} locations", table.len());

    let conn = open_store(&config.db_path)?;
    println!("✓ Estimate store opened: {:?}", config.db_path);

    let public_url = format!("http://localhost:{}/", config.addr.port());
    let state = AppState::new(MockEstimator::new(table), conn, public_url);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.addr))?;

    println!("\n🚀 Server running on http://{}", config.addr);
    println!("   Locations: GET  /get_location_names");
    println!("   Predict:   POST /predict_home_price");
    println!("   Saved:     GET  /api/estimates");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
