// Garden Server - Payload replay
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Payload replay from a JSON-lines capture.
//!
//! Each non-blank line of the file is one raw payload as a field sensor
//! published it. Lines are sent to the ingestion worker verbatim, so a
//! capture containing malformed payloads exercises the drop path too.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::metrics::update_replay_metrics;

/// Configuration for payload replay.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path to the JSON-lines capture.
    pub path: String,
    /// Delay between payloads in milliseconds.
    pub interval_ms: u64,
    /// Whether to start over at the end of the file.
    pub loop_replay: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            interval_ms: 1_000,
            loop_replay: false,
        }
    }
}

/// State of the replay engine.
#[derive(Debug, Default)]
pub struct ReplayState {
    /// Payloads sent in the current pass.
    pub position: AtomicUsize,
    /// Payloads in the capture.
    pub total_payloads: AtomicUsize,
    /// Whether replay is running.
    pub running: AtomicBool,
}

/// Replays a capture into the ingestion channel.
pub struct ReplayEngine {
    config: ReplayConfig,
    state: Arc<ReplayState>,
    payloads: Vec<Vec<u8>>,
}

impl ReplayEngine {
    /// Load a capture file.
    pub fn from_file(config: ReplayConfig) -> Result<Self, ReplayError> {
        let path = Path::new(&config.path);
        if !path.exists() {
            return Err(ReplayError::FileNotFound(config.path.clone()));
        }

        let payloads = Self::parse_lines(&std::fs::read(path)?);
        if payloads.is_empty() {
            return Err(ReplayError::EmptyCapture);
        }

        let state = Arc::new(ReplayState::default());
        state.total_payloads.store(payloads.len(), Ordering::SeqCst);

        info!(
            "Loaded capture: {} payloads, {}ms interval",
            payloads.len(),
            config.interval_ms
        );

        Ok(Self {
            config,
            state,
            payloads,
        })
    }

    fn parse_lines(contents: &[u8]) -> Vec<Vec<u8>> {
        contents
            .split(|&b| b == b'\n')
            .map(trim_ascii)
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Get the replay state.
    pub fn state(&self) -> Arc<ReplayState> {
        Arc::clone(&self.state)
    }

    /// Send payloads until the capture ends or the worker goes away.
    pub async fn run(&self, tx: mpsc::Sender<Vec<u8>>) {
        self.state.running.store(true, Ordering::SeqCst);
        info!(
            "Starting replay: interval={}ms, loop={}",
            self.config.interval_ms, self.config.loop_replay
        );

        loop {
            let position = self.state.position.load(Ordering::SeqCst);

            if position >= self.payloads.len() {
                if self.config.loop_replay {
                    info!("Capture complete, looping...");
                    self.state.position.store(0, Ordering::SeqCst);
                    continue;
                }
                info!("Capture complete, stopping");
                break;
            }

            debug!("Replaying payload {}", position);
            if tx.send(self.payloads[position].clone()).await.is_err() {
                info!("Ingest channel closed, stopping replay");
                break;
            }

            self.state.position.fetch_add(1, Ordering::SeqCst);
            update_replay_metrics(position + 1, self.payloads.len());

            if self.config.interval_ms > 0 {
                sleep(Duration::from_millis(self.config.interval_ms)).await;
            }
        }

        self.state.running.store(false, Ordering::SeqCst);
    }
}

fn trim_ascii(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Capture contains no payloads")]
    EmptyCapture,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
