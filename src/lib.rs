//! # Garden - field sensor time-series core
//!
//! Turns a stream of irregularly timed environmental readings
//! (temperature, humidity, light, soil moisture, rainfall) into series
//! ready for charting.
//!
//! ## Key Features
//!
//! - **Best-effort ingestion**: one payload at a time, bad payloads dropped
//! - **Bucketed queries**: raw, 5-minute, hourly or daily means
//! - **Deterministic zero-states**: empty stores yield defaults, not errors
//! - **Chart post-processing**: exponential smoothing, trailing trend, stats
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{TimeZone, Utc};
//! use garden::{Granularity, MemoryStore, SensorHub};
//!
//! let hub = SensorHub::new(Arc::new(MemoryStore::new()));
//!
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
//! let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
//! hub.ingest_at(br#"{"temperature":12.0}"#, t0).unwrap();
//! hub.ingest_at(br#"{"temperature":8.0}"#, t1).unwrap();
//!
//! let daily = hub.get_series("temperature", t0, t1, Granularity::Daily).unwrap();
//! assert_eq!(daily.len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`reading`]: Stored readings and wire payloads
//! - [`channel`]: The five queryable channels
//! - [`bucket`]: Granularity and bucket boundary arithmetic
//! - [`store`]: Store contract, in-memory and JSON-lines stores
//! - [`ingest`]: Ingestion adapter
//! - [`aggregate`]: Aggregation engine
//! - [`snapshot`]: Latest-reading snapshot
//! - [`process`]: Smoothing, trend and stats
//! - [`hub`]: High-level API over all of the above

// Modules
pub mod aggregate;
pub mod bucket;
pub mod channel;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod process;
pub mod reading;
pub mod series;
pub mod snapshot;
pub mod store;

// Re-exports for convenient access
pub use aggregate::AggregationEngine;
pub use bucket::{truncate, Granularity};
pub use channel::Channel;
pub use error::{IngestError, QueryError, StoreError, StoreResult};
pub use hub::SensorHub;
pub use ingest::{IngestCounts, IngestStats, IngestionAdapter};
pub use process::{
    process_series, ProcessedPoint, ProcessedSeries, ProcessingConfig, Stats, Thresholds,
};
pub use reading::{Reading, ReadingPayload, Timestamp};
pub use series::{Series, SeriesPoint};
pub use snapshot::{Snapshot, SnapshotService};
pub use store::{JsonlStore, MemoryStore, ReadingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
