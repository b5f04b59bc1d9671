pub mod analysis;
pub mod reading;

pub use analysis::{
    AnalysisMetadata, AnalysisResult, HistoryEntry, PumpUsage, ReportSource, Statistics,
    TimeRange, Trend, WindowSpec,
};
pub use reading::{PumpStatus, Reading};
