// Garden Sim - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for payload generation.

use thiserror::Error;

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Generator errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// A probability outside `[0, 1]`.
    #[error("Invalid probability for {name}: {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    /// A sensor with an empty or inverted valid range.
    #[error("Invalid range for {channel}: [{min}, {max}]")]
    InvalidRange { channel: String, min: f64, max: f64 },

    /// Zero sample interval.
    #[error("Sample interval must be positive")]
    ZeroInterval,
}
