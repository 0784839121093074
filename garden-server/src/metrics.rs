// Garden Server - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for the garden server.
//!
//! All collectors live in the default registry and are exposed on
//! `/metrics` in the text format.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Encoder, Histogram,
    IntCounterVec, IntGauge, TextEncoder,
};
use tracing::warn;

lazy_static! {
    // ============================================================
    // Ingestion
    // ============================================================

    /// Payloads handed to the ingestion adapter, by outcome.
    pub static ref INGEST_PAYLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "garden_ingest_payloads_total",
        "Payloads received by the ingestion worker",
        &["outcome"]
    ).unwrap();

    /// Readings held by the store.
    pub static ref STORED_READINGS: IntGauge = register_int_gauge!(
        "garden_stored_readings",
        "Readings currently held by the store"
    ).unwrap();

    // ============================================================
    // Queries
    // ============================================================

    /// Queries served, by endpoint and outcome.
    pub static ref QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "garden_queries_total",
        "Queries served by the HTTP surface",
        &["endpoint", "outcome"]
    ).unwrap();

    /// Points returned per series query.
    pub static ref QUERY_POINTS: Histogram = register_histogram!(
        "garden_query_points",
        "Points returned per series query",
        vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0, 10_000.0]
    ).unwrap();

    // ============================================================
    // Replay
    // ============================================================

    /// Current replay position (payload index).
    pub static ref REPLAY_POSITION: IntGauge = register_int_gauge!(
        "garden_replay_position",
        "Current replay position (payload index)"
    ).unwrap();

    /// Payloads in the replay file.
    pub static ref REPLAY_TOTAL_PAYLOADS: IntGauge = register_int_gauge!(
        "garden_replay_total_payloads",
        "Payloads in the replay file"
    ).unwrap();
}

/// Ingestion outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    Malformed,
    StoreFailure,
}

impl IngestOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestOutcome::Accepted => "accepted",
            IngestOutcome::Malformed => "malformed",
            IngestOutcome::StoreFailure => "store_failure",
        }
    }
}

/// Query outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Ok,
    ClientError,
    ServerError,
}

impl QueryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOutcome::Ok => "ok",
            QueryOutcome::ClientError => "client_error",
            QueryOutcome::ServerError => "server_error",
        }
    }
}

/// Count one ingested payload.
pub fn record_ingest(outcome: IngestOutcome) {
    INGEST_PAYLOADS_TOTAL
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Update the stored readings gauge.
pub fn update_stored_readings(count: usize) {
    STORED_READINGS.set(count as i64);
}

/// Count one query.
pub fn record_query(endpoint: &str, outcome: QueryOutcome) {
    QUERIES_TOTAL
        .with_label_values(&[endpoint, outcome.as_str()])
        .inc();
}

/// Observe the size of a returned series.
pub fn observe_query_points(points: usize) {
    QUERY_POINTS.observe(points as f64);
}

/// Update replay position metrics.
pub fn update_replay_metrics(position: usize, total: usize) {
    REPLAY_POSITION.set(position as i64);
    REPLAY_TOTAL_PAYLOADS.set(total as i64);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
