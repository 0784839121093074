//! Series point types shared by the aggregation engine and the post-processor

use serde::{Deserialize, Serialize};

use crate::reading::Timestamp;

/// One `(timestamp, value)` sample of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: Timestamp,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered sequence of points, non-decreasing in timestamp
pub type Series = Vec<SeriesPoint>;

/// Check the ordering invariant of a series
pub fn is_time_ordered(series: &[SeriesPoint]) -> bool {
    series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_is_time_ordered() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        assert!(is_time_ordered(&[]));
        assert!(is_time_ordered(&[SeriesPoint::new(t0, 1.0)]));
        assert!(is_time_ordered(&[
            SeriesPoint::new(t0, 1.0),
            SeriesPoint::new(t0, 2.0),
            SeriesPoint::new(t1, 3.0),
        ]));
        assert!(!is_time_ordered(&[
            SeriesPoint::new(t1, 1.0),
            SeriesPoint::new(t0, 2.0),
        ]));
    }

    #[test]
    fn test_point_json_shape() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let json = serde_json::to_value(SeriesPoint::new(t0, 21.5)).unwrap();
        assert_eq!(json["timestamp"], "2024-01-01T10:00:00Z");
        assert_eq!(json["value"], 21.5);
    }
}
