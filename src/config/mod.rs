use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenRouter API key. Empty means every call fails and analyses fall
    /// back to the local report.
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    #[serde(default = "ProviderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "AnalysisConfig::default_cache_ttl_mins")]
    pub cache_ttl_mins: u64,
    #[serde(default = "AnalysisConfig::default_min_interval_secs")]
    pub min_interval_secs: u64,
    /// Maximum number of history entries exposed to clients.
    #[serde(default = "AnalysisConfig::default_history_limit")]
    pub history_limit: usize,
}

impl ProviderConfig {
    const fn default_timeout_secs() -> u64 {
        45
    }
}

impl AnalysisConfig {
    const fn default_cache_ttl_mins() -> u64 {
        30
    }

    const fn default_min_interval_secs() -> u64 {
        15
    }

    const fn default_history_limit() -> usize {
        50
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());
        let backend = match backend_str.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "sqlite" => StorageBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown STORAGE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, memory"
                );
                StorageBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://siram.db?mode=rwc".to_string());

        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let api_key = std::env::var("OPENROUTER_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                "OPENROUTER_API_KEY is not set - analyses will use the local fallback report"
            );
        }
        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        let model = std::env::var("OPENROUTER_MODEL")
            .unwrap_or_else(|_| "meta-llama/llama-3.3-70b-instruct:free".to_string());
        let timeout_secs = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(ProviderConfig::default_timeout_secs);

        let cache_ttl_mins = std::env::var("ANALYSIS_CACHE_TTL_MINS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(AnalysisConfig::default_cache_ttl_mins);
        let min_interval_secs = std::env::var("ANALYSIS_MIN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(AnalysisConfig::default_min_interval_secs);
        let history_limit = std::env::var("HISTORY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or_else(AnalysisConfig::default_history_limit);

        Ok(Config {
            storage: StorageConfig {
                backend,
                url: database_url,
            },
            server: ServerConfig { host, port },
            provider: ProviderConfig {
                api_key,
                base_url,
                model,
                timeout_secs,
            },
            analysis: AnalysisConfig {
                cache_ttl_mins,
                min_interval_secs,
                history_limit,
            },
        })
    }
}
