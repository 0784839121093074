//! Latest-reading snapshot
//!
//! Dashboards always get something to render: the most recent stored
//! reading, or an all-zero default stamped with the current time when the
//! store is empty.

use std::sync::Arc;

use chrono::Utc;
use serde::{Serialize, Serializer};

use crate::channel::Channel;
use crate::error::QueryError;
use crate::reading::{Reading, Timestamp};
use crate::store::ReadingStore;

/// Result of a latest-reading request
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// The most recent stored reading
    Stored(Reading),
    /// Zero-state for an empty store
    Default {
        /// Wall-clock time of the request
        last_updated: Timestamp,
    },
}

impl Snapshot {
    /// Channel value; the default snapshot reports 0 for every channel
    pub fn value(&self, channel: Channel) -> Option<f64> {
        match self {
            Snapshot::Stored(reading) => reading.value(channel),
            Snapshot::Default { .. } => Some(0.0),
        }
    }

    /// Time the values refer to
    pub fn last_updated(&self) -> Timestamp {
        match self {
            Snapshot::Stored(reading) => reading.created_at,
            Snapshot::Default { last_updated } => *last_updated,
        }
    }

    /// True for the empty-store fallback
    pub fn is_default(&self) -> bool {
        matches!(self, Snapshot::Default { .. })
    }
}

/// Wire shape of a snapshot
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotView {
    temperature: Option<f64>,
    humidity: Option<f64>,
    light: Option<f64>,
    soil_moisture: Option<f64>,
    rainfall: Option<f64>,
    last_updated: Timestamp,
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SnapshotView {
            temperature: self.value(Channel::Temperature),
            humidity: self.value(Channel::Humidity),
            light: self.value(Channel::Light),
            soil_moisture: self.value(Channel::SoilMoisture),
            rainfall: self.value(Channel::Rainfall),
            last_updated: self.last_updated(),
        }
        .serialize(serializer)
    }
}

/// Read-only "most recent reading" stage
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn ReadingStore>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    /// Most recent reading, or the default snapshot stamped now
    pub fn latest(&self) -> Result<Snapshot, QueryError> {
        Ok(match self.store.latest()? {
            Some(reading) => Snapshot::Stored(reading),
            None => Snapshot::Default {
                last_updated: Utc::now(),
            },
        })
    }
}

impl std::fmt::Debug for SnapshotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotService").finish_non_exhaustive()
    }
}
