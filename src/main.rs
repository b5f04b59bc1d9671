use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use siram::analysis::{AnalysisOrchestrator, OpenRouterClient, OrchestratorConfig};
use siram::api::{create_api_router, AppState};
use siram::config::{Config, StorageBackend};
use siram::storage::{HistoryStore, MemoryStore, ReadingStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let (readings, history): (Arc<dyn ReadingStore>, Arc<dyn HistoryStore>) =
        match config.storage.backend {
            StorageBackend::Sqlite => {
                info!("Using SQLite storage: {}", config.storage.url);
                let store = Arc::new(SqliteStore::new(&config.storage.url, 5).await?);
                store.init().await?;
                info!("Database initialized successfully");
                let readings: Arc<dyn ReadingStore> = store.clone();
                let history: Arc<dyn HistoryStore> = store;
                (readings, history)
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage (readings are lost on restart)");
                let store = Arc::new(MemoryStore::new());
                let readings: Arc<dyn ReadingStore> = store.clone();
                let history: Arc<dyn HistoryStore> = store;
                (readings, history)
            }
        };

    // Analysis provider and orchestrator
    let provider = Arc::new(OpenRouterClient::new(&config.provider)?);
    info!(
        "Analysis provider: {} via {}",
        config.provider.model, config.provider.base_url
    );

    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        Arc::clone(&readings),
        Arc::clone(&history),
        provider,
        OrchestratorConfig {
            cache_ttl: Duration::from_secs(config.analysis.cache_ttl_mins * 60),
            min_request_interval: Duration::from_secs(config.analysis.min_interval_secs),
        },
    ));

    let state = Arc::new(AppState {
        orchestrator,
        readings,
        history,
        history_limit: config.analysis.history_limit,
    });
    let router = create_api_router(state);

    // Start API server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
