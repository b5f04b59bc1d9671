//! Client for the external language-analysis provider (OpenRouter-style
//! chat-completions API). The `AnalysisProvider` trait is the seam the
//! orchestrator depends on; tests substitute stub implementations.

use async_trait::async_trait;
use chrono::TimeZone;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::ProviderConfig;
use crate::models::{PumpStatus, PumpUsage, Reading, Statistics};

/// Any of these is a provider failure: the orchestrator recovers with the
/// rule-based fallback report.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// Everything the provider needs to write a report: the aggregates plus a
/// bounded sample of the most recent readings.
pub struct AnalysisPrompt<'a> {
    pub time_range: &'a str,
    pub total_readings: usize,
    pub statistics: &'a Statistics,
    pub pump_usage: &'a PumpUsage,
    pub sample: &'a [Reading],
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn generate(&self, prompt: &AnalysisPrompt<'_>) -> Result<String, ProviderError>;
}

pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for OpenRouterClient {
    async fn generate(&self, prompt: &AnalysisPrompt<'_>) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": build_prompt(prompt) }],
            "temperature": 0.7,
            "max_tokens": 2048,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

fn build_prompt(prompt: &AnalysisPrompt<'_>) -> String {
    let stats = prompt.statistics;
    let pump = prompt.pump_usage;

    let sample_lines: String = prompt
        .sample
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let status = match r.pump_status {
                PumpStatus::On => "ON",
                PumpStatus::Off => "OFF",
            };
            let waktu = chrono::Utc
                .timestamp_millis_opt(r.timestamp)
                .single()
                .map(|t| t.format("%d/%m/%Y %H.%M.%S").to_string())
                .unwrap_or_else(|| r.timestamp.to_string());
            format!(
                "{}. Moisture: {}%, ADC: {}, Pompa: {status}, Waktu: {waktu}\n",
                i + 1,
                r.moisture,
                r.raw_adc,
            )
        })
        .collect();

    format!(
        "Kamu adalah ahli agrikultur dan sistem irigasi pintar. Analisis data \
         kelembaban tanah berikut dan berikan rekomendasi yang detail dan praktis.\n\n\
         DATA ANALISIS ({time_range}):\n\
         - Total pembacaan: {total}\n\
         - Kelembaban rata-rata: {mean:.1}%\n\
         - Kelembaban minimum: {min}%\n\
         - Kelembaban maksimum: {max}%\n\
         - Tren kelembaban: {trend}\n\
         - Aktivasi pompa: {activations} kali ({percentage:.1}% dari total pembacaan)\n\n\
         SAMPLE DATA TERBARU:\n{sample_lines}\n\
         Berikan analisis terstruktur: status kesehatan tanah, pola dan tren, \
         efisiensi pompa, rekomendasi jangka pendek dan jangka panjang, serta \
         peringatan bila ada anomali. Gunakan bahasa Indonesia yang profesional \
         namun mudah dimengerti.",
        time_range = prompt.time_range,
        total = prompt.total_readings,
        mean = stats.mean,
        min = stats.min,
        max = stats.max,
        trend = stats.trend,
        activations = pump.activations,
        percentage = pump.percentage,
    )
}
