use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::{AnalysisError, AnalysisOrchestrator};
use crate::models::{HistoryEntry, PumpStatus, Reading, TimeRange, WindowSpec};
use crate::storage::{HistoryStore, ReadingStore};

pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub readings: Arc<dyn ReadingStore>,
    pub history: Arc<dyn HistoryStore>,
    pub history_limit: usize,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(rename = "retryAfterSeconds", skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            retry_after_seconds: None,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Device push: one sensor sample. Timestamp defaults to server time for
/// firmware that does not carry a clock.
#[derive(Deserialize)]
pub struct IngestReading {
    pub moisture: f64,
    #[serde(rename = "rawADC", default)]
    pub raw_adc: i64,
    #[serde(rename = "pumpStatus", default)]
    pub pump_status: PumpStatus,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

pub async fn ingest_reading(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestReading>,
) -> Result<(StatusCode, Json<Reading>), (StatusCode, Json<ErrorResponse>)> {
    if !payload.moisture.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("moisture must be a finite number")),
        ));
    }

    let timestamp = payload
        .timestamp
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let reading = Reading::new(payload.moisture, payload.raw_adc, payload.pump_status, timestamp);

    match state.readings.append(&reading).await {
        Ok(()) => Ok((StatusCode::CREATED, Json(reading))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to store reading: {e}"))),
        )),
    }
}

#[derive(Deserialize)]
pub struct ReadingsQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
}

fn default_hours() -> i64 {
    24
}

pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<Vec<Reading>>, (StatusCode, Json<ErrorResponse>)> {
    let cutoff = Utc::now().timestamp_millis() - query.hours.max(0) * 60 * 60 * 1000;
    match state.readings.readings_since(cutoff).await {
        Ok(readings) => Ok(Json(readings)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to read store: {e}"))),
        )),
    }
}

pub async fn latest_reading(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Reading>, (StatusCode, Json<ErrorResponse>)> {
    match state.readings.latest().await {
        Ok(Some(reading)) => Ok(Json(reading)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("No readings available")),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to read store: {e}"))),
        )),
    }
}

#[derive(Deserialize, Default)]
pub struct AnalyzeRequest {
    /// Explicit window; omitted means the manual 24-hour window.
    #[serde(default)]
    pub range: Option<TimeRange>,
    /// Most recent N readings regardless of age. Wins over `range`.
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default = "default_manual")]
    pub manual: bool,
}

fn default_manual() -> bool {
    true
}

pub async fn run_analysis(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<crate::models::AnalysisResult>, (StatusCode, Json<ErrorResponse>)> {
    let spec = match (payload.count, payload.range) {
        (Some(count), _) => WindowSpec::Latest(count),
        (None, Some(range)) => WindowSpec::Range(range),
        (None, None) => WindowSpec::Manual,
    };

    match state.orchestrator.run_analysis(spec, payload.manual).await {
        Ok(result) => Ok(Json(result)),
        Err(e @ AnalysisError::InsufficientData) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(AnalysisError::RateLimited {
            retry_after_seconds,
        }) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: format!(
                    "Terlalu banyak request. Mohon tunggu {retry_after_seconds} detik sebelum analisis berikutnya."
                ),
                retry_after_seconds: Some(retry_after_seconds),
            }),
        )),
        Err(AnalysisError::Storage(e)) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to analyze: {e}"))),
        )),
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_page")]
    pub limit: usize,
}

fn default_history_page() -> usize {
    20
}

pub async fn analysis_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.clamp(1, state.history_limit);
    match state.history.list_newest_first(limit).await {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to load history: {e}"))),
        )),
    }
}
