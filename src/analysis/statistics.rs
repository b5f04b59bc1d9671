//! Pure aggregation over an analysis window. No I/O, no state;
//! identical input ordering produces identical output.

use crate::models::{PumpStatus, PumpUsage, Reading, Statistics, Trend};

/// Compute mean/min/max and the trend classification for a non-empty
/// window, ordered oldest first.
pub fn compute_statistics(window: &[Reading]) -> Statistics {
    debug_assert!(!window.is_empty(), "analysis window must be non-empty");

    let sum: f64 = window.iter().map(|r| r.moisture).sum();
    let mean = round1(sum / window.len() as f64);
    let min = window
        .iter()
        .map(|r| r.moisture)
        .fold(f64::INFINITY, f64::min);
    let max = window
        .iter()
        .map(|r| r.moisture)
        .fold(f64::NEG_INFINITY, f64::max);

    Statistics {
        mean,
        min,
        max,
        trend: classify_trend(window),
    }
}

/// Count and percentage of readings with the pump ON.
pub fn compute_pump_usage(window: &[Reading]) -> PumpUsage {
    let activations = window
        .iter()
        .filter(|r| r.pump_status == PumpStatus::On)
        .count();
    let percentage = if window.is_empty() {
        0.0
    } else {
        round1(activations as f64 * 100.0 / window.len() as f64)
    };

    PumpUsage {
        activations: activations as u32,
        percentage,
    }
}

/// Compare the mean of the last ten readings against the first ten.
/// On windows smaller than 20 the two slices overlap; a single-reading
/// window degenerates to comparing the reading with itself (stable).
fn classify_trend(window: &[Reading]) -> Trend {
    let head = &window[..window.len().min(10)];
    let tail = &window[window.len().saturating_sub(10)..];

    let head_mean = head.iter().map(|r| r.moisture).sum::<f64>() / head.len() as f64;
    let tail_mean = tail.iter().map(|r| r.moisture).sum::<f64>() / tail.len() as f64;

    if tail_mean > head_mean {
        Trend::Meningkat
    } else if tail_mean < head_mean {
        Trend::Menurun
    } else {
        Trend::Stabil
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(moisture: f64, pump_status: PumpStatus, index: i64) -> Reading {
        Reading::new(moisture, 2048, pump_status, 1_700_000_000_000 + index * 60_000)
    }

    fn constant_window(moisture: f64, n: usize) -> Vec<Reading> {
        (0..n)
            .map(|i| {
                let status = if i % 2 == 0 {
                    PumpStatus::On
                } else {
                    PumpStatus::Off
                };
                reading(moisture, status, i as i64)
            })
            .collect()
    }

    #[test]
    fn test_constant_window_is_stable() {
        // 20 readings at 45%, pump alternating ON/OFF
        let window = constant_window(45.0, 20);
        let stats = compute_statistics(&window);
        assert_eq!(stats.mean, 45.0);
        assert_eq!(stats.min, 45.0);
        assert_eq!(stats.max, 45.0);
        assert_eq!(stats.trend, Trend::Stabil);

        let pump = compute_pump_usage(&window);
        assert_eq!(pump.activations, 10);
        assert_eq!(pump.percentage, 50.0);
    }

    #[test]
    fn test_linear_increase_is_meningkat() {
        let window: Vec<Reading> = (0..20)
            .map(|i| reading(20.0 + i as f64 * (58.0 / 19.0), PumpStatus::Off, i))
            .collect();
        let stats = compute_statistics(&window);
        assert_eq!(stats.trend, Trend::Meningkat);

        let pump = compute_pump_usage(&window);
        assert_eq!(pump.activations, 0);
        assert_eq!(pump.percentage, 0.0);
    }

    #[test]
    fn test_linear_decrease_is_menurun() {
        let window: Vec<Reading> = (0..20)
            .map(|i| reading(80.0 - i as f64 * 2.0, PumpStatus::Off, i))
            .collect();
        assert_eq!(compute_statistics(&window).trend, Trend::Menurun);
    }

    #[test]
    fn test_single_reading_window() {
        let window = vec![reading(15.0, PumpStatus::On, 0)];
        let stats = compute_statistics(&window);
        assert_eq!(stats.mean, 15.0);
        assert_eq!(stats.min, 15.0);
        assert_eq!(stats.max, 15.0);
        // first-10 and last-10 are both the single reading
        assert_eq!(stats.trend, Trend::Stabil);

        let pump = compute_pump_usage(&window);
        assert_eq!(pump.activations, 1);
        assert_eq!(pump.percentage, 100.0);
    }

    #[test]
    fn test_small_window_slices_overlap() {
        // 5 readings: head and tail slices are the whole window, so even a
        // steep ramp classifies as stable.
        let window: Vec<Reading> = (0..5)
            .map(|i| reading(10.0 + i as f64 * 15.0, PumpStatus::Off, i))
            .collect();
        assert_eq!(compute_statistics(&window).trend, Trend::Stabil);
    }

    #[test]
    fn test_fifteen_reading_window_overlapping_trend() {
        // With 15 readings the first-10 and last-10 slices share the middle
        // five; a monotone increase must still classify as increasing.
        let window: Vec<Reading> = (0..15)
            .map(|i| reading(30.0 + i as f64 * 3.0, PumpStatus::Off, i))
            .collect();
        assert_eq!(compute_statistics(&window).trend, Trend::Meningkat);
    }

    #[test]
    fn test_mean_rounded_to_one_decimal() {
        let window = vec![
            reading(33.0, PumpStatus::Off, 0),
            reading(33.0, PumpStatus::Off, 1),
            reading(34.0, PumpStatus::Off, 2),
        ];
        // 100/3 = 33.333... -> 33.3
        assert_eq!(compute_statistics(&window).mean, 33.3);
    }

    #[test]
    fn test_mean_within_extrema() {
        let window: Vec<Reading> = [12.0, 87.0, 45.0, 61.0, 3.0, 99.0]
            .iter()
            .enumerate()
            .map(|(i, &m)| reading(m, PumpStatus::Off, i as i64))
            .collect();
        let stats = compute_statistics(&window);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_eq!(stats.min, 3.0);
        assert_eq!(stats.max, 99.0);
        for r in &window {
            assert!(stats.min <= r.moisture && r.moisture <= stats.max);
        }
    }

    #[test]
    fn test_pump_percentage_rounding() {
        // 1 of 3 ON -> 33.333... -> 33.3
        let window = vec![
            reading(50.0, PumpStatus::On, 0),
            reading(50.0, PumpStatus::Off, 1),
            reading(50.0, PumpStatus::Off, 2),
        ];
        let pump = compute_pump_usage(&window);
        assert_eq!(pump.activations, 1);
        assert_eq!(pump.percentage, 33.3);
    }

    #[test]
    fn test_pump_usage_empty_window_is_zero() {
        let pump = compute_pump_usage(&[]);
        assert_eq!(pump.activations, 0);
        assert_eq!(pump.percentage, 0.0);
    }

    #[test]
    fn test_determinism() {
        let window = constant_window(45.0, 20);
        assert_eq!(compute_statistics(&window), compute_statistics(&window));
        assert_eq!(compute_pump_usage(&window), compute_pump_usage(&window));
    }
}
