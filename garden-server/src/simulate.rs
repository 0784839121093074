// Garden Server - Simulated field sensor
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Simulated field sensor feeding the ingestion worker.

use std::time::Duration;

use chrono::Utc;
use garden_sim::{GardenSensors, GeneratorConfig, PayloadGenerator, SimError};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

/// Per-field dropout rate of the simulated sensor.
pub const SIM_DROPOUT: f64 = 0.02;
/// Per-payload corruption rate of the simulated sensor.
pub const SIM_CORRUPTION: f64 = 0.01;

/// Build a generator starting now with the default garden sensors.
pub fn build_generator(
    interval_ms: u64,
    seed: Option<u64>,
) -> Result<PayloadGenerator, SimError> {
    let mut config = GeneratorConfig::new()
        .with_start(Utc::now())
        .with_sample_interval_ms(interval_ms)
        .with_dropout(SIM_DROPOUT)
        .with_corruption(SIM_CORRUPTION);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    PayloadGenerator::new(config, GardenSensors::default())
}

/// Publish generated payloads every `interval_ms`.
///
/// Runs until `limit` payloads are sent (unbounded when `None`) or the
/// worker goes away. Returns the number of payloads sent.
pub async fn run_simulation(
    mut generator: PayloadGenerator,
    interval_ms: u64,
    limit: Option<usize>,
    tx: mpsc::Sender<Vec<u8>>,
) -> usize {
    info!("Starting simulated sensor: interval={}ms", interval_ms);
    let mut sent = 0;

    while limit.map_or(true, |max| sent < max) {
        let payload = generator.next_payload();
        debug!(kind = ?payload.kind, "Simulated payload");

        if tx.send(payload.bytes).await.is_err() {
            info!("Ingest channel closed, stopping simulation");
            break;
        }
        sent += 1;

        if interval_ms > 0 {
            sleep(Duration::from_millis(interval_ms)).await;
        }
    }

    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use garden::{MemoryStore, SensorHub};

    use crate::worker::run_ingest_loop;

    #[test]
    fn test_build_generator_rejects_zero_interval() {
        assert!(matches!(
            build_generator(0, Some(1)),
            Err(SimError::ZeroInterval)
        ));
    }

    #[tokio::test]
    async fn test_simulation_feeds_worker() {
        let hub = Arc::new(SensorHub::new(Arc::new(MemoryStore::new())));
        let (tx, rx) = mpsc::channel(8);
        let worker = tokio::spawn(run_ingest_loop(Arc::clone(&hub), rx));

        let generator = build_generator(1_000, Some(42)).unwrap();
        let sent = run_simulation(generator, 0, Some(50), tx).await;
        assert_eq!(sent, 50);

        let counts = worker.await.unwrap();
        assert_eq!(counts.total(), 50);
        assert_eq!(counts.store_failures, 0);
        assert_eq!(hub.store().len().unwrap() as u64, counts.accepted);
    }
}
