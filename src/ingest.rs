//! Ingestion adapter
//!
//! Turns one raw payload into one stored [`Reading`]. Delivery is
//! best-effort and at-most-once: a payload that cannot be parsed or
//! stored is logged, counted, and dropped. Nothing here retries, and no
//! failure stops the caller from handing over the next payload.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::IngestError;
use crate::reading::{Reading, ReadingPayload, Timestamp};
use crate::store::ReadingStore;

/// Outcome counters, shareable between the ingest worker and observers
#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    malformed: AtomicU64,
    store_failures: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestCounts {
    pub accepted: u64,
    pub malformed: u64,
    pub store_failures: u64,
}

impl IngestCounts {
    /// Payloads seen, whatever their outcome
    pub fn total(&self) -> u64 {
        self.accepted + self.malformed + self.store_failures
    }
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestCounts {
        IngestCounts {
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Sequential write-path stage: payload in, reading stored or error out
pub struct IngestionAdapter {
    store: Arc<dyn ReadingStore>,
    stats: Arc<IngestStats>,
}

impl IngestionAdapter {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            store,
            stats: Arc::new(IngestStats::default()),
        }
    }

    /// Ingest a payload observed now
    pub fn ingest(&self, raw: &[u8]) -> Result<(), IngestError> {
        self.ingest_at(raw, Utc::now())
    }

    /// Ingest a payload with an explicit observation time.
    ///
    /// Any timestamp carried inside the payload is ignored; `observed_at`
    /// becomes the reading's `created_at`.
    pub fn ingest_at(&self, raw: &[u8], observed_at: Timestamp) -> Result<(), IngestError> {
        let payload = match ReadingPayload::parse(raw) {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(bytes = raw.len(), error = %e, "dropping malformed payload");
                return Err(e);
            }
        };

        let reading = Reading::from_payload(payload, observed_at);
        if let Err(e) = self.store.append(reading) {
            self.stats.store_failures.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, "failed to store reading");
            return Err(IngestError::StoreUnavailable(e));
        }

        self.stats.accepted.fetch_add(1, Ordering::Relaxed);
        debug!(created_at = %observed_at, "stored reading");
        Ok(())
    }

    /// Shared handle to the outcome counters
    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }
}

impl std::fmt::Debug for IngestionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionAdapter")
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
