pub mod fallback;
pub mod orchestrator;
pub mod provider;
pub mod statistics;

pub use fallback::generate_fallback_report;
pub use orchestrator::{AnalysisError, AnalysisOrchestrator, OrchestratorConfig};
pub use provider::{AnalysisPrompt, AnalysisProvider, OpenRouterClient, ProviderError};
pub use statistics::{compute_pump_usage, compute_statistics};
