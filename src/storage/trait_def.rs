use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AnalysisResult, HistoryEntry, Reading};

/// The time-series store soil-moisture readings are appended to and read
/// back from.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append one sample.
    async fn append(&self, reading: &Reading) -> Result<()>;

    /// All readings with `timestamp >= cutoff_ms`, oldest first.
    async fn readings_since(&self, cutoff_ms: i64) -> Result<Vec<Reading>>;

    /// The most recent reading, if any.
    async fn latest(&self) -> Result<Option<Reading>>;
}

/// Append-only log of past analysis results.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a result, returning the generated entry id.
    async fn append(&self, result: &AnalysisResult) -> Result<String>;

    /// Entries sorted by their own analysis timestamp descending, capped
    /// at `limit`. Insertion order is not trusted: concurrent writers can
    /// interleave.
    async fn list_newest_first(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
}
