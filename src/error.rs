//! Error types for the garden core
//!
//! Three families, one per direction of travel:
//! - [`StoreError`]: the persistence collaborator failed
//! - [`IngestError`]: a payload on the write path was dropped
//! - [`QueryError`]: a read-path request could not be answered
//!
//! An empty series or a default snapshot is never an error.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a [`ReadingStore`](crate::store::ReadingStore)
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying file or device failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A reading could not be serialized for persistence
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted record could not be read back
    #[error("Corrupt record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    /// The store cannot serve requests (poisoned lock, closed backend, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors on the ingestion path.
///
/// Neither variant is fatal: the adapter logs it and keeps consuming.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Payload is not an object of optional numeric fields
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The parsed reading could not be written
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

/// Errors on the query path
#[derive(Error, Debug)]
pub enum QueryError {
    /// Channel name outside the fixed set; raised before any store access
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// Granularity name outside `raw | 5m | hourly | daily`
    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    /// The store failed while answering
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}
