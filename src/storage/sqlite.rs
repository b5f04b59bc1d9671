use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::warn;

use crate::models::{AnalysisResult, HistoryEntry, Reading};
use crate::storage::{generate_entry_id, HistoryStore, ReadingStore};

/// SQLite backend serving both the reading store and the history log.
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Create tables and indexes if they do not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                moisture REAL NOT NULL,
                raw_adc INTEGER NOT NULL,
                pump_status TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_readings_timestamp ON readings(timestamp)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analysis_history (
                id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_created_at ON analysis_history(created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn append(&self, reading: &Reading) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO readings (moisture, raw_adc, pump_status, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(reading.moisture)
        .bind(reading.raw_adc)
        .bind(reading.pump_status)
        .bind(reading.timestamp)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn readings_since(&self, cutoff_ms: i64) -> Result<Vec<Reading>> {
        let readings = sqlx::query_as::<_, Reading>(
            r#"
            SELECT moisture, raw_adc, pump_status, timestamp
            FROM readings
            WHERE timestamp >= ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(cutoff_ms)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(readings)
    }

    async fn latest(&self) -> Result<Option<Reading>> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            SELECT moisture, raw_adc, pump_status, timestamp
            FROM readings
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool.as_ref())
        .await?;
        Ok(reading)
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn append(&self, result: &AnalysisResult) -> Result<String> {
        let id = generate_entry_id();
        let created_at = DateTime::parse_from_rfc3339(&result.timestamp)
            .map(|t| t.timestamp_millis())
            .unwrap_or_else(|_| Utc::now().timestamp_millis());
        let payload = serde_json::to_string(result)?;

        sqlx::query(
            r#"
            INSERT INTO analysis_history (id, created_at, payload)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(created_at)
        .bind(payload)
        .execute(self.pool.as_ref())
        .await?;
        Ok(id)
    }

    async fn list_newest_first(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload
            FROM analysis_history
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let payload: String = row.try_get("payload")?;
            match serde_json::from_str::<AnalysisResult>(&payload) {
                Ok(result) => entries.push(HistoryEntry { id, result }),
                Err(e) => warn!(entry_id = %id, error = %e, "skipping corrupt history entry"),
            }
        }
        Ok(entries)
    }
}
