//! The stateful heart of the analysis pipeline: window resolution, result
//! caching, global rate limiting, the provider call, and the fallback
//! path. Cache and limiter live on the orchestrator instance so tests can
//! construct fresh state instead of relying on process restarts.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::fallback::generate_fallback_report;
use crate::analysis::provider::{AnalysisPrompt, AnalysisProvider};
use crate::analysis::statistics::{compute_pump_usage, compute_statistics};
use crate::models::{
    AnalysisMetadata, AnalysisResult, Reading, ReportSource, TimeRange, WindowSpec,
};
use crate::storage::{HistoryStore, ReadingStore};

/// Only these two outcomes deny the caller a report; a provider failure
/// degrades to the fallback report instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("tidak cukup data untuk dianalisis")]
    InsufficientData,
    #[error("terlalu banyak request, coba lagi dalam {retry_after_seconds} detik")]
    RateLimited { retry_after_seconds: u64 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Lifetime of a cached analysis for one (label, window-size) key.
    pub cache_ttl: Duration,
    /// Minimum spacing between provider-call attempts, across all keys.
    pub min_request_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(30 * 60),
            min_request_interval: Duration::from_secs(15),
        }
    }
}

#[derive(Clone)]
struct CachedAnalysis {
    result: AnalysisResult,
    created_at: Instant,
}

pub struct AnalysisOrchestrator {
    readings: Arc<dyn ReadingStore>,
    history: Arc<dyn HistoryStore>,
    provider: Arc<dyn AnalysisProvider>,
    cache: Cache<(String, usize), CachedAnalysis>,
    last_request: Mutex<Option<Instant>>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    pub fn new(
        readings: Arc<dyn ReadingStore>,
        history: Arc<dyn HistoryStore>,
        provider: Arc<dyn AnalysisProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(config.cache_ttl)
            .build();
        Self {
            readings,
            history,
            provider,
            cache,
            last_request: Mutex::new(None),
            config,
        }
    }

    /// Run one analysis. Automatic triggers pass `manual_trigger = false`;
    /// the cache and rate limiter apply to both equally.
    pub async fn run_analysis(
        &self,
        spec: WindowSpec,
        manual_trigger: bool,
    ) -> Result<AnalysisResult, AnalysisError> {
        let window = self.resolve_window(&spec).await?;
        if window.is_empty() {
            return Err(AnalysisError::InsufficientData);
        }

        let label = spec.label();
        let key = (label.clone(), window.len());

        // A fresh cache entry short-circuits everything, including the
        // rate limiter.
        if let Some(entry) = self.cache.get(&key).await {
            let elapsed = entry.created_at.elapsed();
            if elapsed < self.config.cache_ttl {
                let remaining = self.config.cache_ttl - elapsed;
                let mut result = entry.result.clone();
                result.metadata.from_cache = true;
                result.metadata.cache_expires_in = Some(whole_minutes(remaining));
                info!(time_range = %label, "returning cached analysis");
                return Ok(result);
            }
        }

        self.check_rate_limit()?;

        info!(
            time_range = %label,
            data_points = window.len(),
            manual = manual_trigger,
            "running soil analysis"
        );

        let statistics = compute_statistics(&window);
        let pump_usage = compute_pump_usage(&window);

        let sample_start = window.len().saturating_sub(20);
        let prompt = AnalysisPrompt {
            time_range: &label,
            total_readings: window.len(),
            statistics: &statistics,
            pump_usage: &pump_usage,
            sample: &window[sample_start..],
        };

        let (analysis, source) = match self.provider.generate(&prompt).await {
            Ok(text) => (text, ReportSource::Provider),
            Err(e) => {
                warn!(error = %e, "provider call failed, using fallback report");
                (
                    generate_fallback_report(&statistics, &pump_usage, window.len()),
                    ReportSource::Fallback,
                )
            }
        };

        let now = Utc::now();
        let result = AnalysisResult {
            success: true,
            timestamp: now.to_rfc3339(),
            time_range: label,
            statistics,
            pump_usage,
            analysis,
            source,
            metadata: AnalysisMetadata {
                data_points: window.len(),
                analyzed_at: now.format("%d/%m/%Y %H.%M.%S").to_string(),
                from_cache: false,
                cache_expires_in: None,
            },
        };

        // Fallback results are not cached: the next attempt should retry
        // the provider.
        if result.source == ReportSource::Provider {
            self.cache
                .insert(
                    key,
                    CachedAnalysis {
                        result: result.clone(),
                        created_at: Instant::now(),
                    },
                )
                .await;
        }

        // The history write is post-commit: a storage failure must not fail
        // an analysis the caller already earned.
        if let Err(e) = self.history.append(&result).await {
            warn!(error = %e, "failed to append analysis to history");
        }

        Ok(result)
    }

    async fn resolve_window(&self, spec: &WindowSpec) -> Result<Vec<Reading>, AnalysisError> {
        let mut window = match spec {
            WindowSpec::Manual => self.window_since(TimeRange::Hours24.span_ms()).await?,
            WindowSpec::Range(range) => self.window_since(range.span_ms()).await?,
            WindowSpec::Latest(n) => {
                let mut all = self.readings.readings_since(0).await?;
                let start = all.len().saturating_sub(*n);
                all.split_off(start)
            }
        };
        window.sort_by_key(|r| r.timestamp);
        Ok(window)
    }

    async fn window_since(&self, span_ms: i64) -> Result<Vec<Reading>, AnalysisError> {
        let cutoff = Utc::now().timestamp_millis() - span_ms;
        let window = self.readings.readings_since(cutoff).await?;
        if !window.is_empty() {
            return Ok(window);
        }
        // No readings in range: a lone latest reading still makes a usable
        // single-point window.
        Ok(self.readings.latest().await?.into_iter().collect())
    }

    /// Atomic check-and-set on the global limiter. Gates entry to the
    /// provider-call stage regardless of how the call turns out.
    fn check_rate_limit(&self) -> Result<(), AnalysisError> {
        let mut last = self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.config.min_request_interval {
                let remaining = self.config.min_request_interval - elapsed;
                return Err(AnalysisError::RateLimited {
                    retry_after_seconds: remaining.as_secs_f64().ceil() as u64,
                });
            }
        }
        *last = Some(Instant::now());
        Ok(())
    }
}

fn whole_minutes(duration: Duration) -> i64 {
    (duration.as_secs_f64() / 60.0).round() as i64
}
