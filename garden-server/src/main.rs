// Garden Server - HTTP query surface for field sensor readings
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Garden Server
//!
//! Serves series queries and snapshots over HTTP, runs the ingestion
//! worker and exports Prometheus metrics.
//!
//! ## Usage
//!
//! ```bash
//! # In-memory store fed by a simulated sensor
//! garden-server --simulate --simulate-interval-ms 2000
//!
//! # Persistent store, replaying a capture of raw payloads
//! garden-server --data-file readings.jsonl --replay capture.jsonl
//!
//! # Run on custom port
//! garden-server --port 8080
//! ```

mod error;
mod metrics;
mod replay;
mod routes;
#[cfg(feature = "simulate")]
mod simulate;
mod worker;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use garden::{JsonlStore, MemoryStore, ReadingStore, SensorHub};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use error::ServerError;
use metrics::update_stored_readings;
use replay::{ReplayConfig, ReplayEngine};
use routes::AppState;
use worker::{run_ingest_loop, INGEST_QUEUE_DEPTH};

/// Garden sensor server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// JSON-lines file backing the store (in-memory when absent)
    #[arg(short, long)]
    data_file: Option<String>,

    /// JSON-lines capture of raw payloads to replay
    #[arg(short, long)]
    replay: Option<String>,

    /// Delay between replayed payloads in milliseconds
    #[arg(long, default_value = "1000")]
    replay_interval_ms: u64,

    /// Start the capture over when it ends
    #[arg(long)]
    loop_replay: bool,

    /// Feed a simulated garden sensor into ingestion
    #[arg(short, long)]
    simulate: bool,

    /// Delay between simulated payloads in milliseconds
    #[arg(long, default_value = "5000")]
    simulate_interval_ms: u64,

    /// Seed for the simulated sensor
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Garden Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    // Open store
    let store: Arc<dyn ReadingStore> = match args.data_file {
        Some(ref path) => Arc::new(JsonlStore::open(path)?),
        None => {
            info!("No data file specified, readings are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };
    update_stored_readings(store.len()?);

    let hub = Arc::new(SensorHub::new(store));

    // Ingestion worker; it stops once every payload source is done
    let (tx, rx) = mpsc::channel(INGEST_QUEUE_DEPTH);
    tokio::spawn(run_ingest_loop(Arc::clone(&hub), rx));

    let mut state = AppState::new(Arc::clone(&hub));

    if let Some(path) = args.replay.clone() {
        let engine = ReplayEngine::from_file(ReplayConfig {
            path,
            interval_ms: args.replay_interval_ms,
            loop_replay: args.loop_replay,
        })?;
        state = state.with_replay(engine.state());

        let tx = tx.clone();
        tokio::spawn(async move {
            engine.run(tx).await;
        });
    }

    #[cfg(feature = "simulate")]
    if args.simulate {
        let generator = simulate::build_generator(args.simulate_interval_ms, args.seed)?;
        tokio::spawn(simulate::run_simulation(
            generator,
            args.simulate_interval_ms,
            None,
            tx.clone(),
        ));
    }

    #[cfg(not(feature = "simulate"))]
    if args.simulate {
        tracing::warn!("Simulate feature not enabled, ignoring --simulate");
    }

    drop(tx);

    // Build router
    let app = routes::router(Arc::new(state));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting server on http://{}", addr);
    info!("Series endpoint: http://{}/api/sensor-data", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["garden-server"]);
        assert_eq!(args.port, 3001);
        assert!(args.data_file.is_none());
        assert!(args.replay.is_none());
        assert!(!args.simulate);
        assert_eq!(args.simulate_interval_ms, 5000);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_args_full() {
        let args = Args::parse_from([
            "garden-server",
            "--port",
            "8080",
            "--data-file",
            "readings.jsonl",
            "--replay",
            "capture.jsonl",
            "--replay-interval-ms",
            "10",
            "--loop-replay",
            "--simulate",
            "--seed",
            "7",
        ]);
        assert_eq!(args.port, 8080);
        assert_eq!(args.data_file.as_deref(), Some("readings.jsonl"));
        assert_eq!(args.replay.as_deref(), Some("capture.jsonl"));
        assert_eq!(args.replay_interval_ms, 10);
        assert!(args.loop_replay);
        assert!(args.simulate);
        assert_eq!(args.seed, Some(7));
    }
}
