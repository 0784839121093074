//! High-level API
//!
//! [`SensorHub`] wires the write path and the read paths to one store and
//! exposes the query surface consumed by a presentation layer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use garden::{Granularity, MemoryStore, ProcessingConfig, SensorHub};
//!
//! let hub = SensorHub::new(Arc::new(MemoryStore::new()));
//!
//! hub.ingest(br#"{"temperature":21.5,"humidity":60}"#).unwrap();
//!
//! let now = Utc::now();
//! let series = hub
//!     .get_series("temperature", now - Duration::hours(1), now, Granularity::Raw)
//!     .unwrap();
//! assert_eq!(series.len(), 1);
//!
//! let processed = SensorHub::process_series(&series, &ProcessingConfig::new().with_alpha(20));
//! assert_eq!(processed.stats.max, 21.5);
//! ```

use std::sync::Arc;

use crate::aggregate::AggregationEngine;
use crate::bucket::Granularity;
use crate::error::{IngestError, QueryError};
use crate::ingest::{IngestStats, IngestionAdapter};
use crate::process::{self, ProcessedSeries, ProcessingConfig};
use crate::reading::Timestamp;
use crate::series::{Series, SeriesPoint};
use crate::snapshot::{Snapshot, SnapshotService};
use crate::store::ReadingStore;

/// Ingestion, series queries and snapshots over one store
pub struct SensorHub {
    store: Arc<dyn ReadingStore>,
    adapter: IngestionAdapter,
    engine: AggregationEngine,
    snapshots: SnapshotService,
}

impl SensorHub {
    /// Create a hub over the given store
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            adapter: IngestionAdapter::new(Arc::clone(&store)),
            engine: AggregationEngine::new(Arc::clone(&store)),
            snapshots: SnapshotService::new(Arc::clone(&store)),
            store,
        }
    }

    /// Ingest one raw payload observed now
    pub fn ingest(&self, raw: &[u8]) -> Result<(), IngestError> {
        self.adapter.ingest(raw)
    }

    /// Ingest one raw payload with an explicit observation time
    pub fn ingest_at(&self, raw: &[u8], observed_at: Timestamp) -> Result<(), IngestError> {
        self.adapter.ingest_at(raw, observed_at)
    }

    /// Ordered series for a channel name, range and granularity
    pub fn get_series(
        &self,
        channel: &str,
        start: Timestamp,
        end: Timestamp,
        granularity: Granularity,
    ) -> Result<Series, QueryError> {
        self.engine.query(channel, start, end, granularity)
    }

    /// Most recent reading or the default snapshot
    pub fn get_latest(&self) -> Result<Snapshot, QueryError> {
        self.snapshots.latest()
    }

    /// Smoothing, trend and stats for display
    pub fn process_series(series: &[SeriesPoint], config: &ProcessingConfig) -> ProcessedSeries {
        process::process_series(series, config)
    }

    /// Ingestion outcome counters
    pub fn ingest_stats(&self) -> Arc<IngestStats> {
        self.adapter.stats()
    }

    /// The aggregation engine, for callers that validate channels themselves
    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn ReadingStore> {
        &self.store
    }
}

impl std::fmt::Debug for SensorHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorHub")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}
