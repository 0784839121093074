//! Series post-processing for charts
//!
//! Pure transforms over a fetched series; no store access and no shared
//! state:
//!
//! - **Smoothing**: causal first-order exponential filter,
//!   `s[i] = s[i-1]·α + x[i]·(1-α)` with `α = alpha/100` and `s[0] = x[0]`
//! - **Trend**: trailing moving average of the smoothed values over
//!   `w = max(1, ⌊n/10⌋)` points ending at `i`
//! - **Stats**: average/min/max of the unsmoothed input, zeros when empty
//!
//! Thresholds never alter values; they ride along for the renderer.

use serde::{Deserialize, Serialize};

use crate::reading::Timestamp;
use crate::series::SeriesPoint;

/// Largest accepted smoothing factor, in percent
pub const MAX_ALPHA: u8 = 100;

/// Immutable post-processing settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessingConfig {
    /// Smoothing factor in percent (0 = off, 100 = hold first value)
    pub alpha: u8,
    /// Attach a trend value to every point
    pub show_trend: bool,
    /// Lower reference band
    pub min_threshold: Option<f64>,
    /// Upper reference band
    pub max_threshold: Option<f64>,
}

impl ProcessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the smoothing factor, clamped to `0..=100`
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha.min(MAX_ALPHA);
        self
    }

    /// Enable or disable the trend line
    pub fn with_trend(mut self, show_trend: bool) -> Self {
        self.show_trend = show_trend;
        self
    }

    /// Set reference bands
    pub fn with_thresholds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_threshold = min;
        self.max_threshold = max;
        self
    }

    /// Smoothing factor as a fraction in `[0, 1]`
    pub fn alpha_fraction(&self) -> f64 {
        f64::from(self.alpha.min(MAX_ALPHA)) / 100.0
    }
}

/// A display point: smoothed value plus optional trend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPoint {
    pub timestamp: Timestamp,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// Summary statistics of a series
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Compute over the point values; all zero for an empty series
    pub fn from_series(series: &[SeriesPoint]) -> Self {
        if series.is_empty() {
            return Self::default();
        }

        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for point in series {
            sum += point.value;
            min = min.min(point.value);
            max = max.max(point.value);
        }

        Self {
            average: sum / series.len() as f64,
            min,
            max,
        }
    }

}

/// Reference bands passed through to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Output of [`process_series`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSeries {
    pub points: Vec<ProcessedPoint>,
    pub stats: Stats,
    pub thresholds: Thresholds,
}

/// Exponential smoothing with `alpha` as a fraction, clamped to `[0, 1]`
pub fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let a = alpha.clamp(0.0, 1.0);
    let mut out = Vec::with_capacity(values.len());
    for (i, &x) in values.iter().enumerate() {
        let s = if i == 0 { x } else { out[i - 1] * a + x * (1.0 - a) };
        out.push(s);
    }
    out
}

/// Trend window for a series of `n` points.
///
/// The window holds `w` points ending at `i` (indices `i + 1 - w ..= i`),
/// so a series shorter than ten points has a trend equal to its smoothed
/// values.
pub fn trend_window(n: usize) -> usize {
    (n / 10).max(1)
}

/// Mean of the `window` values ending at each index (fewer at the start)
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let slice = &values[(i + 1).saturating_sub(window)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Apply smoothing, optional trend and stats to a fetched series
pub fn process_series(series: &[SeriesPoint], config: &ProcessingConfig) -> ProcessedSeries {
    let raw: Vec<f64> = series.iter().map(|p| p.value).collect();
    let smoothed = smooth(&raw, config.alpha_fraction());
    let trend = config
        .show_trend
        .then(|| trailing_mean(&smoothed, trend_window(smoothed.len())));

    let points = series
        .iter()
        .zip(&smoothed)
        .enumerate()
        .map(|(i, (point, &value))| ProcessedPoint {
            timestamp: point.timestamp,
            value,
            trend: trend.as_ref().map(|t| t[i]),
        })
        .collect();

    ProcessedSeries {
        points,
        stats: Stats::from_series(series),
        thresholds: Thresholds {
            min: config.min_threshold,
            max: config.max_threshold,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        let t0 = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SeriesPoint::new(t0 + Duration::minutes(i as i64), v))
            .collect()
    }

    #[test]
    fn test_alpha_zero_is_identity() {
        let input = series(&[3.0, 9.5, -1.0, 4.25, 100.0]);
        let out = process_series(&input, &ProcessingConfig::new());

        assert_eq!(out.points.len(), input.len());
        for (p, q) in out.points.iter().zip(&input) {
            assert_eq!(p.timestamp, q.timestamp);
            assert_eq!(p.value, q.value);
            assert_eq!(p.trend, None);
        }
    }

    #[test]
    fn test_alpha_hundred_holds_first_value() {
        let input = series(&[7.0, 1.0, 2.0, 3.0, 50.0]);
        let out = process_series(&input, &ProcessingConfig::new().with_alpha(100));
        assert!(out.points.iter().all(|p| p.value == 7.0));
    }

    #[test]
    fn test_smoothing_compounds() {
        // s1 = 0*0.5 + 10*0.5 = 5; s2 = 5*0.5 + 10*0.5 = 7.5
        let smoothed = smooth(&[0.0, 10.0, 10.0], 0.5);
        assert_relative_eq!(smoothed[0], 0.0);
        assert_relative_eq!(smoothed[1], 5.0);
        assert_relative_eq!(smoothed[2], 7.5);
    }

    #[test]
    fn test_alpha_clamped() {
        assert_eq!(ProcessingConfig::new().with_alpha(250).alpha, 100);
        assert_eq!(smooth(&[1.0, 5.0], 2.5), vec![1.0, 1.0]);

        let config = ProcessingConfig {
            alpha: 255,
            ..ProcessingConfig::new()
        };
        assert_relative_eq!(config.alpha_fraction(), 1.0);
        let out = process_series(&series(&[1.0, 5.0, 9.0]), &config);
        assert!(out.points.iter().all(|p| p.value == 1.0));
    }

    #[test]
    fn test_trend_window_sizes() {
        assert_eq!(trend_window(0), 1);
        assert_eq!(trend_window(9), 1);
        assert_eq!(trend_window(10), 1);
        assert_eq!(trend_window(19), 1);
        assert_eq!(trend_window(20), 2);
        assert_eq!(trend_window(105), 10);
    }

    #[test]
    fn test_short_series_trend_equals_smoothed() {
        let input = series(&[1.0, 4.0, 2.0, 8.0, 5.0, 7.0]);
        let out = process_series(&input, &ProcessingConfig::new().with_alpha(30).with_trend(true));
        for p in &out.points {
            assert_eq!(p.trend, Some(p.value));
        }
    }

    #[test]
    fn test_trend_is_trailing() {
        let values: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let trend = trailing_mean(&values, trend_window(values.len()));

        // w = 3: first points average what exists so far
        assert_relative_eq!(trend[0], 0.0);
        assert_relative_eq!(trend[1], 0.5);
        assert_relative_eq!(trend[2], 1.0);
        assert_relative_eq!(trend[10], 9.0);
        assert_relative_eq!(trend[29], 28.0);
    }

    #[test]
    fn test_trend_never_looks_ahead() {
        let mut values = vec![1.0; 40];
        let before = trailing_mean(&values, 4);
        values[39] = 1000.0;
        let after = trailing_mean(&values, 4);
        assert_eq!(before[..39], after[..39]);
    }

    #[test]
    fn test_stats_use_raw_values() {
        let input = series(&[2.0, 4.0, 9.0]);
        let out = process_series(&input, &ProcessingConfig::new().with_alpha(90));

        assert_relative_eq!(out.stats.average, 5.0);
        assert_eq!(out.stats.min, 2.0);
        assert_eq!(out.stats.max, 9.0);
    }

    #[test]
    fn test_stats_empty() {
        let stats = Stats::from_series(&[]);
        assert_eq!(stats, Stats { average: 0.0, min: 0.0, max: 0.0 });

        let out = process_series(&[], &ProcessingConfig::new().with_trend(true));
        assert!(out.points.is_empty());
        assert_eq!(out.stats, Stats::default());
    }

    #[test]
    fn test_thresholds_pass_through() {
        let input = series(&[5.0, 50.0]);
        let config = ProcessingConfig::new().with_thresholds(Some(10.0), Some(40.0));
        let out = process_series(&input, &config);

        assert_eq!(out.thresholds.min, Some(10.0));
        assert_eq!(out.thresholds.max, Some(40.0));
        let values: Vec<_> = out.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![5.0, 50.0]);
    }

    #[test]
    fn test_config_from_json() {
        let config: ProcessingConfig =
            serde_json::from_str(r#"{"alpha":40,"showTrend":true,"maxThreshold":30.5}"#).unwrap();
        assert_eq!(config.alpha, 40);
        assert!(config.show_trend);
        assert_eq!(config.min_threshold, None);
        assert_eq!(config.max_threshold, Some(30.5));
        assert_relative_eq!(config.alpha_fraction(), 0.4);
    }
}
