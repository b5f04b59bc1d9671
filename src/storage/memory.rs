use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::models::{AnalysisResult, HistoryEntry, Reading};
use crate::storage::{generate_entry_id, HistoryStore, ReadingStore};

/// In-memory backend for tests and ephemeral deployments. Holds nothing
/// across restarts.
#[derive(Default)]
pub struct MemoryStore {
    readings: RwLock<Vec<Reading>>,
    history: DashMap<String, AnalysisResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn append(&self, reading: &Reading) -> Result<()> {
        self.readings.write().await.push(reading.clone());
        Ok(())
    }

    async fn readings_since(&self, cutoff_ms: i64) -> Result<Vec<Reading>> {
        let mut matching: Vec<Reading> = self
            .readings
            .read()
            .await
            .iter()
            .filter(|r| r.timestamp >= cutoff_ms)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }

    async fn latest(&self) -> Result<Option<Reading>> {
        Ok(self
            .readings
            .read()
            .await
            .iter()
            .max_by_key(|r| r.timestamp)
            .cloned())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, result: &AnalysisResult) -> Result<String> {
        let id = generate_entry_id();
        self.history.insert(id.clone(), result.clone());
        Ok(id)
    }

    async fn list_newest_first(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self
            .history
            .iter()
            .map(|entry| HistoryEntry {
                id: entry.key().clone(),
                result: entry.value().clone(),
            })
            .collect();
        // Sort by the result's own timestamp, not insertion order.
        entries.sort_by_key(|e| {
            std::cmp::Reverse(
                DateTime::parse_from_rfc3339(&e.result.timestamp)
                    .map(|t| t.timestamp_millis())
                    .unwrap_or(0),
            )
        });
        entries.truncate(limit);
        Ok(entries)
    }
}
