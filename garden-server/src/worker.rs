// Garden Server - Ingestion worker
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ingestion worker loop.
//!
//! Payload sources (replay, simulation, a broker bridge) push raw bytes
//! into one `mpsc` channel; a single worker drains it in delivery order.

use std::sync::Arc;

use garden::{IngestCounts, IngestError, SensorHub};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::metrics::{record_ingest, update_stored_readings, IngestOutcome};

/// Bound on payloads waiting for the worker.
pub const INGEST_QUEUE_DEPTH: usize = 1024;

/// Drain `rx` into the hub until every sender is dropped.
///
/// A rejected payload is counted and skipped; it never stops the loop.
pub async fn run_ingest_loop(
    hub: Arc<SensorHub>,
    mut rx: mpsc::Receiver<Vec<u8>>,
) -> IngestCounts {
    info!("Ingest worker started");

    while let Some(payload) = rx.recv().await {
        let outcome = match hub.ingest(&payload) {
            Ok(()) => IngestOutcome::Accepted,
            Err(IngestError::Malformed(_)) => IngestOutcome::Malformed,
            Err(IngestError::StoreUnavailable(_)) => IngestOutcome::StoreFailure,
        };
        record_ingest(outcome);

        match hub.store().len() {
            Ok(count) => update_stored_readings(count),
            Err(e) => warn!("Failed to read store size: {}", e),
        }
    }

    let counts = hub.ingest_stats().snapshot();
    info!(
        "Ingest channel closed: {} accepted, {} malformed, {} store failures",
        counts.accepted, counts.malformed, counts.store_failures
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use garden::{
        Granularity, MemoryStore, Reading, ReadingStore, StoreError, StoreResult, Timestamp,
    };

    struct BrokenStore;

    impl ReadingStore for BrokenStore {
        fn append(&self, _reading: Reading) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }

        fn range(&self, _start: Timestamp, _end: Timestamp) -> StoreResult<Vec<Reading>> {
            Err(StoreError::Unavailable("disk full".to_string()))
        }

        fn latest(&self) -> StoreResult<Option<Reading>> {
            Ok(None)
        }

        fn len(&self) -> StoreResult<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_loop_stores_in_order_and_skips_bad_payloads() {
        let hub = Arc::new(SensorHub::new(Arc::new(MemoryStore::new())));
        let (tx, rx) = mpsc::channel(INGEST_QUEUE_DEPTH);
        let worker = tokio::spawn(run_ingest_loop(Arc::clone(&hub), rx));

        tx.send(br#"{"temperature":20.0}"#.to_vec()).await.unwrap();
        tx.send(b"not json".to_vec()).await.unwrap();
        tx.send(br#"{"temperature":21.0}"#.to_vec()).await.unwrap();
        drop(tx);

        let counts = worker.await.unwrap();
        assert_eq!(counts.accepted, 2);
        assert_eq!(counts.malformed, 1);

        let now = Utc::now();
        let series = hub
            .get_series(
                "temperature",
                now - Duration::minutes(1),
                now,
                Granularity::Raw,
            )
            .unwrap();
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![20.0, 21.0]);
    }

    #[tokio::test]
    async fn test_loop_survives_store_failures() {
        let hub = Arc::new(SensorHub::new(Arc::new(BrokenStore)));
        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(run_ingest_loop(hub, rx));

        for _ in 0..3 {
            tx.send(br#"{"rainfall":1.0}"#.to_vec()).await.unwrap();
        }
        drop(tx);

        let counts = worker.await.unwrap();
        assert_eq!(counts.store_failures, 3);
        assert_eq!(counts.accepted, 0);
    }
}
