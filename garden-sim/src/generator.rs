// Garden Sim - Payload generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Payload generation.
//!
//! Each sample evaluates every fitted sensor, adds noise, clamps to the
//! sensor's range and encodes the result as the JSON payload a field
//! sensor would publish. Dropouts remove single fields (or send them as
//! `null`); corruption replaces the whole payload with bytes the
//! ingestion adapter must reject.

use chrono::{Duration, TimeZone, Timelike, Utc};
use garden::{Channel, Timestamp};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SimError};
use crate::patterns::{gaussian, PatternState};
use crate::sensors::GardenSensors;

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Observation time of the first sample.
    pub start: Timestamp,
    /// Interval between samples in milliseconds.
    pub sample_interval_ms: u64,
    /// Number of samples for [`generate_payloads`].
    pub num_samples: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Chance that any one field is left out of a payload.
    pub dropout_probability: f64,
    /// Chance that a whole payload is corrupted.
    pub corrupt_probability: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            // 2024-06-01 00:00:00 UTC
            start: Utc
                .timestamp_opt(1_717_200_000, 0)
                .single()
                .unwrap_or_default(),
            sample_interval_ms: 60_000, // 1 minute
            num_samples: 60,            // 1 hour
            seed: None,
            dropout_probability: 0.0,
            corrupt_probability: 0.0,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first observation time.
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = start;
        self
    }

    /// Set sample interval.
    pub fn with_sample_interval_ms(mut self, interval_ms: u64) -> Self {
        self.sample_interval_ms = interval_ms;
        self
    }

    /// Set sample interval in seconds.
    pub fn with_sample_interval_secs(mut self, secs: u64) -> Self {
        self.sample_interval_ms = secs * 1000;
        self
    }

    /// Set number of samples.
    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Set duration in hours (calculates num_samples from interval).
    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        let total_ms = hours * 3_600_000.0;
        self.num_samples = (total_ms / self.sample_interval_ms.max(1) as f64).ceil() as usize;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set per-field dropout probability.
    pub fn with_dropout(mut self, probability: f64) -> Self {
        self.dropout_probability = probability;
        self
    }

    /// Set per-payload corruption probability.
    pub fn with_corruption(mut self, probability: f64) -> Self {
        self.corrupt_probability = probability;
        self
    }

    /// Check probabilities and interval.
    pub fn validate(&self) -> Result<()> {
        check_probability("dropout_probability", self.dropout_probability)?;
        check_probability("corrupt_probability", self.corrupt_probability)?;
        if self.sample_interval_ms == 0 {
            return Err(SimError::ZeroInterval);
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidProbability { name, value })
    }
}

/// What a generated payload should do to the ingestion adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Every fitted sensor reported.
    Complete,
    /// Some fields absent or null; still accepted.
    Partial,
    /// Rejected as malformed.
    Corrupt,
}

/// One generated payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPayload {
    /// Intended observation time.
    pub observed_at: Timestamp,
    /// Raw payload bytes.
    pub bytes: Vec<u8>,
    /// Expected outcome.
    pub kind: PayloadKind,
}

/// Unbounded payload stream.
///
/// Iterating never ends; use `take` or [`generate_payloads`] for a fixed
/// number of samples.
#[derive(Debug)]
pub struct PayloadGenerator {
    config: GeneratorConfig,
    sensors: GardenSensors,
    states: Vec<PatternState>,
    rng: StdRng,
    index: u64,
}

impl PayloadGenerator {
    /// Create a generator, validating config and sensors.
    pub fn new(config: GeneratorConfig, sensors: GardenSensors) -> Result<Self> {
        config.validate()?;
        sensors.validate()?;

        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let states = sensors
            .iter()
            .map(|s| PatternState::for_pattern(&s.pattern))
            .collect();

        Ok(Self {
            config,
            sensors,
            states,
            rng,
            index: 0,
        })
    }

    /// Samples produced so far.
    pub fn samples_generated(&self) -> u64 {
        self.index
    }

    /// Produce the next payload.
    pub fn next_payload(&mut self) -> GeneratedPayload {
        let elapsed_ms = self.index.saturating_mul(self.config.sample_interval_ms);
        self.index += 1;

        let observed_at = i64::try_from(elapsed_ms)
            .ok()
            .and_then(|ms| self.config.start.checked_add_signed(Duration::milliseconds(ms)))
            .unwrap_or(self.config.start);
        let hour_of_day = observed_at.hour() as f64
            + observed_at.minute() as f64 / 60.0
            + observed_at.second() as f64 / 3600.0;

        let mut fields = Map::new();
        let mut dropped = false;

        for (sensor, state) in self.sensors.iter().zip(self.states.iter_mut()) {
            let base = state.evaluate(&sensor.pattern, elapsed_ms, hour_of_day, &mut self.rng);
            let noise = gaussian(sensor.noise_std, &mut self.rng);
            let value = (base + noise).clamp(sensor.min, sensor.max);
            state.clamp_walk(sensor.min, sensor.max);

            if self.rng.gen_bool(self.config.dropout_probability) {
                dropped = true;
                if self.rng.gen_bool(0.5) {
                    fields.insert(wire_key(sensor.channel).to_string(), Value::Null);
                }
                continue;
            }

            fields.insert(
                wire_key(sensor.channel).to_string(),
                Value::from(round2(value)),
            );
        }

        if self.rng.gen_bool(self.config.corrupt_probability) {
            let bytes = self.corrupt(&fields);
            return GeneratedPayload {
                observed_at,
                bytes,
                kind: PayloadKind::Corrupt,
            };
        }

        GeneratedPayload {
            observed_at,
            bytes: Value::Object(fields).to_string().into_bytes(),
            kind: if dropped {
                PayloadKind::Partial
            } else {
                PayloadKind::Complete
            },
        }
    }

    fn corrupt(&mut self, fields: &Map<String, Value>) -> Vec<u8> {
        match self.rng.gen_range(0..3) {
            // Cut off mid-object
            0 => {
                let full = Value::Object(fields.clone()).to_string();
                full.as_bytes()[..full.len() / 2].to_vec()
            }
            // Sensor fault string in place of a number
            1 => {
                let mut bad = fields.clone();
                bad.insert(
                    wire_key(Channel::Temperature).to_string(),
                    Value::from("ERR"),
                );
                Value::Object(bad).to_string().into_bytes()
            }
            // Bare array of values
            _ => Value::Array(fields.values().cloned().collect())
                .to_string()
                .into_bytes(),
        }
    }
}

impl Iterator for PayloadGenerator {
    type Item = GeneratedPayload;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_payload())
    }
}

/// Generate `config.num_samples` payloads.
pub fn generate_payloads(
    config: &GeneratorConfig,
    sensors: &GardenSensors,
) -> Result<Vec<GeneratedPayload>> {
    let generator = PayloadGenerator::new(config.clone(), sensors.clone())?;
    Ok(generator.take(config.num_samples).collect())
}

/// Payload key a field sensor uses for a channel.
fn wire_key(channel: Channel) -> &'static str {
    match channel {
        Channel::Temperature => "temperature",
        Channel::Humidity => "humidity",
        Channel::Light => "light",
        Channel::SoilMoisture => "soilMoisture",
        Channel::Rainfall => "rainfall",
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
