use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{
    analysis_history, health_check, ingest_reading, latest_reading, list_readings, run_analysis,
    AppState,
};

pub fn create_api_router(state: Arc<AppState>) -> Router {
    // The dashboard is served from a different origin than the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/readings", post(ingest_reading).get(list_readings))
        .route("/api/readings/latest", get(latest_reading))
        .route("/api/analyze", post(run_analysis))
        .route("/api/analysis/history", get(analysis_history))
        .layer(cors)
        .with_state(state)
}
