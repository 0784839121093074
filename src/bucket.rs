//! Time bucketing
//!
//! Bucket boundaries are computed here with explicit UTC calendar
//! arithmetic, so every store groups readings the same way.
//!
//! | Granularity | Bucket start |
//! |-------------|--------------|
//! | `5m`        | start of hour + ⌊minute / 5⌋ × 5 min |
//! | `hourly`    | start of hour |
//! | `daily`     | midnight UTC |
//!
//! Five-minute slices are aligned to the hour, not to an independent epoch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::QueryError;
use crate::reading::{Reading, Timestamp};
use crate::series::{Series, SeriesPoint};

/// Query resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Every reading, no bucketing
    #[default]
    Raw,
    /// Five-minute buckets
    #[serde(rename = "5m")]
    FiveMinutes,
    /// One-hour buckets
    Hourly,
    /// One-day buckets
    Daily,
}

impl Granularity {
    /// Wire name (`raw`, `5m`, `hourly`, `daily`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Raw => "raw",
            Granularity::FiveMinutes => "5m",
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }

    /// Fixed bucket width, `None` for raw
    pub fn bucket_width(&self) -> Option<Duration> {
        match self {
            Granularity::Raw => None,
            Granularity::FiveMinutes => Some(Duration::minutes(5)),
            Granularity::Hourly => Some(Duration::hours(1)),
            Granularity::Daily => Some(Duration::days(1)),
        }
    }

    /// True when readings are grouped into buckets
    pub fn is_bucketed(&self) -> bool {
        !matches!(self, Granularity::Raw)
    }

    /// Interval rule of the HTTP surface: missing means raw, unknown means hourly
    pub fn from_interval_param(interval: Option<&str>) -> Self {
        match interval {
            None | Some("") => Granularity::Raw,
            Some(s) => s.parse().unwrap_or(Granularity::Hourly),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Granularity::Raw),
            "5m" => Ok(Granularity::FiveMinutes),
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            other => Err(QueryError::InvalidGranularity(other.to_string())),
        }
    }
}

/// Start of the bucket containing `ts`; `ts` itself for raw
pub fn truncate(ts: Timestamp, granularity: Granularity) -> Timestamp {
    let time = match granularity {
        Granularity::Raw => return ts,
        Granularity::FiveMinutes => NaiveTime::from_hms_opt(ts.hour(), ts.minute() / 5 * 5, 0),
        Granularity::Hourly => NaiveTime::from_hms_opt(ts.hour(), 0, 0),
        Granularity::Daily => NaiveTime::from_hms_opt(0, 0, 0),
    };

    match time {
        Some(t) => Utc.from_utc_datetime(&ts.date_naive().and_time(t)),
        // hour < 24 and minute < 60 always hold for a valid timestamp
        None => ts,
    }
}

/// Running sum for one bucket
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: u64,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Group readings into buckets and average one channel per bucket.
///
/// Readings without a value for `channel` do not contribute; a bucket with
/// no contributing value is omitted. Points come out ascending by bucket
/// start. With [`Granularity::Raw`] each contributing reading becomes its
/// own point, ordered stably by timestamp.
pub fn bucket_means<'a, I>(readings: I, channel: Channel, granularity: Granularity) -> Series
where
    I: IntoIterator<Item = &'a Reading>,
{
    if !granularity.is_bucketed() {
        let mut series: Series = readings
            .into_iter()
            .filter_map(|r| r.value(channel).map(|v| SeriesPoint::new(r.created_at, v)))
            .collect();
        series.sort_by_key(|p| p.timestamp);
        return series;
    }

    let mut buckets: BTreeMap<Timestamp, Accumulator> = BTreeMap::new();
    for reading in readings {
        if let Some(value) = reading.value(channel) {
            buckets
                .entry(truncate(reading.created_at, granularity))
                .or_default()
                .add(value);
        }
    }

    buckets
        .into_iter()
        .map(|(start, acc)| SeriesPoint::new(start, acc.mean()))
        .collect()
}
