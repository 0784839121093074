// Garden Sim - Synthetic field-sensor payloads
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Garden Sim
//!
//! Synthetic payload generator for the garden sensor core.
//!
//! Produces the same JSON payloads a field sensor publishes, with:
//!
//! - **Signal patterns**: constants, sines, diurnal curves, random walks
//! - **Dropouts**: individual fields omitted or sent as `null`
//! - **Corruption**: truncated JSON, non-numeric values, non-object bodies
//!
//! ## Quick Start
//!
//! ```rust
//! use garden_sim::{generate_payloads, GardenSensors, GeneratorConfig};
//!
//! let config = GeneratorConfig::new()
//!     .with_num_samples(60)
//!     .with_sample_interval_secs(60)
//!     .with_seed(42);
//!
//! let payloads = generate_payloads(&config, &GardenSensors::default()).unwrap();
//! assert_eq!(payloads.len(), 60);
//! ```

pub mod error;
pub mod generator;
pub mod patterns;
pub mod sensors;

// Re-exports for convenience
pub use error::{Result, SimError};
pub use generator::{
    generate_payloads, GeneratedPayload, GeneratorConfig, PayloadGenerator, PayloadKind,
};
pub use patterns::{PatternState, SignalPattern};
pub use sensors::{GardenSensors, SensorSpec};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
