//! Aggregation engine
//!
//! Answers `(channel, start, end, granularity)` with an ordered series:
//! raw readings projected onto the channel, or per-bucket means. The
//! channel is validated before the store is touched, and an inverted
//! range short-circuits to an empty series.

use std::sync::Arc;

use tracing::debug;

use crate::bucket::{self, Granularity};
use crate::channel::Channel;
use crate::error::QueryError;
use crate::reading::Timestamp;
use crate::series::Series;
use crate::store::ReadingStore;

/// Read-only query stage over a [`ReadingStore`]
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn ReadingStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    /// Query by channel name.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidChannel`] if `channel` is not one of the five
    ///   known names (no store access happens)
    /// - [`QueryError::StoreUnavailable`] if the store read fails
    pub fn query(
        &self,
        channel: &str,
        start: Timestamp,
        end: Timestamp,
        granularity: Granularity,
    ) -> Result<Series, QueryError> {
        let channel: Channel = channel.parse()?;
        self.query_channel(channel, start, end, granularity)
    }

    /// Query an already validated channel.
    ///
    /// `start` and `end` are inclusive. Readings lacking the channel's
    /// field are left out; bucketed queries return one point per non-empty
    /// bucket, stamped at the bucket start.
    pub fn query_channel(
        &self,
        channel: Channel,
        start: Timestamp,
        end: Timestamp,
        granularity: Granularity,
    ) -> Result<Series, QueryError> {
        if start > end {
            return Ok(Series::new());
        }

        let series = if granularity.is_bucketed() {
            self.store.bucket_means(channel, start, end, granularity)?
        } else {
            let readings = self.store.range(start, end)?;
            bucket::bucket_means(&readings, channel, Granularity::Raw)
        };

        debug!(
            channel = %channel,
            granularity = %granularity,
            points = series.len(),
            "series query"
        );
        Ok(series)
    }
}

impl std::fmt::Debug for AggregationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregationEngine").finish_non_exhaustive()
    }
}
