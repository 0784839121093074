//! Reading store contract and the in-memory store
//!
//! The core treats persistence as a collaborator behind [`ReadingStore`].
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, lost on restart
//! - [`JsonlStore`]: append-only JSON-lines file, reloaded at open
//!
//! Both keep readings ordered by `created_at`; readings with equal
//! timestamps keep their insertion order.

mod jsonl;

pub use jsonl::JsonlStore;

use std::sync::RwLock;

use crate::bucket::{self, Granularity};
use crate::channel::Channel;
use crate::error::{StoreError, StoreResult};
use crate::reading::{Reading, Timestamp};
use crate::series::Series;

/// Append-only record keeper queryable by time range
pub trait ReadingStore: Send + Sync {
    /// Append one reading
    fn append(&self, reading: Reading) -> StoreResult<()>;

    /// Readings with `start <= created_at <= end`, ascending
    fn range(&self, start: Timestamp, end: Timestamp) -> StoreResult<Vec<Reading>>;

    /// Most recent reading, if any
    fn latest(&self) -> StoreResult<Option<Reading>>;

    /// Number of stored readings
    fn len(&self) -> StoreResult<usize>;

    /// True when nothing has been stored
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Per-bucket means of one channel over `[start, end]`.
    ///
    /// The default groups the output of [`range`](Self::range) with the
    /// core's calendar arithmetic; a backend with native grouping may
    /// override it as long as boundaries match [`bucket::truncate`].
    fn bucket_means(
        &self,
        channel: Channel,
        start: Timestamp,
        end: Timestamp,
        granularity: Granularity,
    ) -> StoreResult<Series> {
        let readings = self.range(start, end)?;
        Ok(bucket::bucket_means(&readings, channel, granularity))
    }
}

/// Time-ordered reading buffer shared by the bundled stores
#[derive(Debug, Default)]
pub(crate) struct ReadingLog {
    readings: Vec<Reading>,
}

impl ReadingLog {
    pub(crate) fn insert(&mut self, reading: Reading) {
        // Upper bound keeps insertion order among equal timestamps
        let at = self
            .readings
            .partition_point(|r| r.created_at <= reading.created_at);
        self.readings.insert(at, reading);
    }

    pub(crate) fn range(&self, start: Timestamp, end: Timestamp) -> Vec<Reading> {
        if start > end {
            return Vec::new();
        }
        let lo = self.readings.partition_point(|r| r.created_at < start);
        let hi = self.readings.partition_point(|r| r.created_at <= end);
        self.readings[lo..hi].to_vec()
    }

    pub(crate) fn latest(&self) -> Option<Reading> {
        self.readings.last().cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.readings.len()
    }
}

pub(crate) fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

/// Process-local store; concurrent readers never block each other
#[derive(Debug, Default)]
pub struct MemoryStore {
    log: RwLock<ReadingLog>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with readings
    pub fn with_readings(readings: impl IntoIterator<Item = Reading>) -> Self {
        let mut log = ReadingLog::default();
        for reading in readings {
            log.insert(reading);
        }
        Self {
            log: RwLock::new(log),
        }
    }
}

impl ReadingStore for MemoryStore {
    fn append(&self, reading: Reading) -> StoreResult<()> {
        self.log.write().map_err(poisoned)?.insert(reading);
        Ok(())
    }

    fn range(&self, start: Timestamp, end: Timestamp) -> StoreResult<Vec<Reading>> {
        Ok(self.log.read().map_err(poisoned)?.range(start, end))
    }

    fn latest(&self) -> StoreResult<Option<Reading>> {
        Ok(self.log.read().map_err(poisoned)?.latest())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.log.read().map_err(poisoned)?.len())
    }
}
