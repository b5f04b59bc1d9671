use serde::{Deserialize, Serialize};

/// Time spans offered by the analysis scheduler. Wire format matches the
/// dashboard's interval codes (`"3h"`, `"24h"`, `"30d"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "3h")]
    Hours3,
    #[serde(rename = "6h")]
    Hours6,
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "3d")]
    Days3,
    #[serde(rename = "7d")]
    Days7,
    #[serde(rename = "30d")]
    Days30,
}

impl TimeRange {
    pub fn span_ms(&self) -> i64 {
        const HOUR: i64 = 60 * 60 * 1000;
        match self {
            TimeRange::Hours3 => 3 * HOUR,
            TimeRange::Hours6 => 6 * HOUR,
            TimeRange::Hours12 => 12 * HOUR,
            TimeRange::Hours24 => 24 * HOUR,
            TimeRange::Days3 => 3 * 24 * HOUR,
            TimeRange::Days7 => 7 * 24 * HOUR,
            TimeRange::Days30 => 30 * 24 * HOUR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Hours3 => "3 Jam",
            TimeRange::Hours6 => "6 Jam",
            TimeRange::Hours12 => "12 Jam",
            TimeRange::Hours24 => "24 Jam",
            TimeRange::Days3 => "3 Hari",
            TimeRange::Days7 => "7 Hari",
            TimeRange::Days30 => "1 Bulan",
        }
    }
}

/// Window selection for one analysis run. `Manual` is the dashboard's
/// on-demand trigger: the last 24 hours, labelled "24 jam terakhir".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    Manual,
    Range(TimeRange),
    Latest(usize),
}

impl WindowSpec {
    /// Human-readable label, also one half of the analysis cache key.
    pub fn label(&self) -> String {
        match self {
            WindowSpec::Manual => "24 jam terakhir".to_string(),
            WindowSpec::Range(range) => range.label().to_string(),
            WindowSpec::Latest(n) => format!("{n} data terakhir"),
        }
    }
}

/// Moisture trend over the window: mean of the last ten readings compared
/// against the mean of the first ten. Wire values stay Indonesian for
/// compatibility with the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Meningkat,
    Menurun,
    Stabil,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trend::Meningkat => "meningkat",
            Trend::Menurun => "menurun",
            Trend::Stabil => "stabil",
        };
        f.write_str(s)
    }
}

/// Aggregate moisture statistics over one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean moisture, rounded to one decimal place.
    #[serde(rename = "rata_rata")]
    pub mean: f64,
    #[serde(rename = "minimum")]
    pub min: f64,
    #[serde(rename = "maksimum")]
    pub max: f64,
    #[serde(rename = "tren")]
    pub trend: Trend,
}

/// Pump-activation accounting over one analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpUsage {
    #[serde(rename = "aktivasi")]
    pub activations: u32,
    /// Share of readings with the pump ON, rounded to one decimal place.
    #[serde(rename = "persentase")]
    pub percentage: f64,
}

/// Whether the report text came from the language-analysis provider or
/// from the local rule-based generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Provider,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    #[serde(rename = "dataPoints")]
    pub data_points: usize,
    /// Localized timestamp shown in the dashboard.
    #[serde(rename = "analyzedAt")]
    pub analyzed_at: String,
    #[serde(rename = "fromCache")]
    pub from_cache: bool,
    /// Remaining cache lifetime in whole minutes, only set on cache hits.
    #[serde(rename = "cacheExpiresIn", skip_serializing_if = "Option::is_none")]
    pub cache_expires_in: Option<i64>,
}

/// The outcome of one analysis run. Immutable; appended once to the
/// history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    #[serde(rename = "timeRange")]
    pub time_range: String,
    pub statistics: Statistics,
    #[serde(rename = "pumpUsage")]
    pub pump_usage: PumpUsage,
    pub analysis: String,
    pub source: ReportSource,
    pub metadata: AnalysisMetadata,
}

/// An analysis result as stored in the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_labels_and_spans() {
        assert_eq!(TimeRange::Hours24.label(), "24 Jam");
        assert_eq!(TimeRange::Hours24.span_ms(), 86_400_000);
        assert_eq!(TimeRange::Days30.label(), "1 Bulan");
    }

    #[test]
    fn test_time_range_wire_codes() {
        let range: TimeRange = serde_json::from_str("\"12h\"").unwrap();
        assert_eq!(range, TimeRange::Hours12);
        assert_eq!(serde_json::to_string(&TimeRange::Days7).unwrap(), "\"7d\"");
    }

    #[test]
    fn test_manual_window_label() {
        assert_eq!(WindowSpec::Manual.label(), "24 jam terakhir");
        assert_eq!(WindowSpec::Range(TimeRange::Hours3).label(), "3 Jam");
        assert_eq!(WindowSpec::Latest(500).label(), "500 data terakhir");
    }

    #[test]
    fn test_trend_serialization() {
        assert_eq!(serde_json::to_string(&Trend::Meningkat).unwrap(), "\"meningkat\"");
        assert_eq!(Trend::Stabil.to_string(), "stabil");
    }

    #[test]
    fn test_statistics_wire_field_names() {
        let stats = Statistics {
            mean: 45.0,
            min: 40.0,
            max: 50.0,
            trend: Trend::Stabil,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert!(json.get("rata_rata").is_some());
        assert!(json.get("tren").is_some());
    }
}
