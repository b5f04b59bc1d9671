use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pump state as reported by the sensing device. Serialized as `"ON"` /
/// `"OFF"` on the wire and in the database for compatibility with the
/// device firmware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PumpStatus {
    On,
    #[default]
    Off,
}

/// One soil-moisture sample. Immutable once appended to the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reading {
    /// Calibrated moisture percentage, clamped to 0..=100.
    pub moisture: f64,
    /// Raw ADC value from the probe (12-bit, 0..=4095).
    #[serde(rename = "rawADC")]
    pub raw_adc: i64,
    #[serde(rename = "pumpStatus")]
    pub pump_status: PumpStatus,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl Reading {
    pub fn new(moisture: f64, raw_adc: i64, pump_status: PumpStatus, timestamp: i64) -> Self {
        Self {
            moisture: moisture.clamp(0.0, 100.0),
            raw_adc: raw_adc.clamp(0, 4095),
            pump_status,
            timestamp,
        }
    }
}
