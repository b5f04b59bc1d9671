//! HTTP-level tests: the axum router served on an ephemeral port,
//! exercised with reqwest the way the dashboard talks to the API.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use siram::analysis::{
    AnalysisOrchestrator, AnalysisPrompt, AnalysisProvider, OrchestratorConfig, ProviderError,
};
use siram::api::{create_api_router, AppState};
use siram::models::{PumpStatus, Reading};
use siram::storage::{HistoryStore, MemoryStore, ReadingStore};

struct StaticProvider(&'static str);

#[async_trait]
impl AnalysisProvider for StaticProvider {
    async fn generate(&self, _prompt: &AnalysisPrompt<'_>) -> Result<String, ProviderError> {
        Ok(self.0.to_string())
    }
}

async fn spawn_server(provider: Arc<dyn AnalysisProvider>) -> (Arc<MemoryStore>, String) {
    let store = Arc::new(MemoryStore::new());
    let readings: Arc<dyn ReadingStore> = store.clone();
    let history: Arc<dyn HistoryStore> = store.clone();
    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        readings,
        history,
        provider,
        OrchestratorConfig::default(),
    ));
    let state = Arc::new(AppState {
        orchestrator,
        readings: store.clone(),
        history: store.clone(),
        history_limit: 50,
    });

    let router = create_api_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (store, format!("http://{addr}"))
}

async fn seed_window(store: &MemoryStore, n: usize) {
    let now = chrono::Utc::now().timestamp_millis();
    for i in 0..n {
        let status = if i % 2 == 0 {
            PumpStatus::On
        } else {
            PumpStatus::Off
        };
        let timestamp = now - (n - i) as i64 * 60_000;
        ReadingStore::append(store, &Reading::new(45.0, 2048, status, timestamp))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_store, base) = spawn_server(Arc::new(StaticProvider("ok"))).await;
    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ingest_and_read_back() {
    let (_store, base) = spawn_server(Arc::new(StaticProvider("ok"))).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/readings"))
        .json(&json!({ "moisture": 55.5, "rawADC": 2100, "pumpStatus": "ON" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // out-of-range values are clamped, not rejected
    let response = client
        .post(format!("{base}/api/readings"))
        .json(&json!({ "moisture": 130.0, "rawADC": 9000, "pumpStatus": "OFF" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let clamped: Value = response.json().await.unwrap();
    assert_eq!(clamped["moisture"], 100.0);
    assert_eq!(clamped["rawADC"], 4095);

    let latest: Value = client
        .get(format!("{base}/api/readings/latest"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["moisture"], 100.0);

    let readings: Value = client
        .get(format!("{base}/api/readings?hours=24"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(readings.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_latest_is_404_when_empty() {
    let (_store, base) = spawn_server(Arc::new(StaticProvider("ok"))).await;
    let response = reqwest::get(format!("{base}/api/readings/latest"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_analyze_flow_with_cache_and_rate_limit() {
    let (store, base) = spawn_server(Arc::new(StaticProvider("laporan AI"))).await;
    seed_window(&store, 20).await;
    let client = reqwest::Client::new();

    // First run goes to the provider.
    let response = client
        .post(format!("{base}/api/analyze"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "provider");
    assert_eq!(body["timeRange"], "24 jam terakhir");
    assert_eq!(body["metadata"]["fromCache"], false);
    assert_eq!(body["metadata"]["dataPoints"], 20);
    assert_eq!(body["statistics"]["rata_rata"], 45.0);
    assert_eq!(body["pumpUsage"]["persentase"], 50.0);

    // Identical request hits the cache.
    let body: Value = client
        .post(format!("{base}/api/analyze"))
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["metadata"]["fromCache"], true);
    assert_eq!(body["metadata"]["cacheExpiresIn"], 30);

    // A different window misses the cache and trips the limiter.
    let response = client
        .post(format!("{base}/api/analyze"))
        .json(&json!({ "range": "12h" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    let body: Value = response.json().await.unwrap();
    let retry = body["retryAfterSeconds"].as_u64().unwrap();
    assert!((1..=15).contains(&retry), "unexpected retry: {retry}");

    // The single successful analysis is in the history.
    let history: Value = client
        .get(format!("{base}/api/analysis/history"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["id"].is_string());
    assert_eq!(entries[0]["analysis"], "laporan AI");
}

#[tokio::test]
async fn test_analyze_with_explicit_count_window() {
    let (store, base) = spawn_server(Arc::new(StaticProvider("ok"))).await;
    seed_window(&store, 20).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/analyze"))
        .json(&json!({ "count": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["timeRange"], "5 data terakhir");
    assert_eq!(body["metadata"]["dataPoints"], 5);

    // limit=0 is clamped up to one entry, not an empty page
    let history: Value = client
        .get(format!("{base}/api/analysis/history?limit=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_analyze_without_data_is_400() {
    let (_store, base) = spawn_server(Arc::new(StaticProvider("ok"))).await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/analyze"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("tidak cukup data"));
}
