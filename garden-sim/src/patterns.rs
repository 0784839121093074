// Garden Sim - Signal patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Signal pattern generators for field sensors.
//!
//! Patterns are evaluated at a sample time given both as milliseconds
//! since the start of generation and as the UTC hour of day, so diurnal
//! curves line up with the wall clock wherever generation starts.

use rand::prelude::*;
use rand_distr::{Normal, Poisson};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Signal pattern definition.
///
/// Patterns can be combined using `Composite` to create complex behaviors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    /// Constant value.
    Constant { value: f64 },

    /// Sinusoidal wave.
    ///
    /// `value = offset + amplitude * sin(2*PI*t/period_ms + phase)`
    Sine {
        amplitude: f64,
        period_ms: u64,
        phase: f64,
        offset: f64,
    },

    /// Linear trend.
    ///
    /// `value = start + slope_per_ms * t`
    Linear { start: f64, slope_per_ms: f64 },

    /// Random walk, stateful through [`PatternState`].
    RandomWalk { start: f64, step_std: f64 },

    /// 24-hour bell curve around `peak_hour` (UTC).
    ///
    /// `max < min` gives an inverted curve, low at the peak hour.
    Diurnal {
        min: f64,
        max: f64,
        peak_hour: f64,
        spread: f64,
    },

    /// Sparse events, e.g. rain: Poisson count times `scale`.
    Poisson { lambda: f64, scale: f64 },

    /// Composite: sum of multiple patterns.
    Composite(Vec<SignalPattern>),
}

impl SignalPattern {
    /// Evaluate the pattern.
    ///
    /// For `RandomWalk`, use [`PatternState::evaluate`] to carry the walk.
    pub fn evaluate(
        &self,
        elapsed_ms: u64,
        hour_of_day: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> f64 {
        match self {
            SignalPattern::Constant { value } => *value,

            SignalPattern::Sine {
                amplitude,
                period_ms,
                phase,
                offset,
            } => {
                if *period_ms == 0 {
                    return *offset;
                }
                let t = elapsed_ms as f64;
                offset + amplitude * (2.0 * PI * t / *period_ms as f64 + phase).sin()
            }

            SignalPattern::Linear {
                start,
                slope_per_ms,
            } => start + slope_per_ms * elapsed_ms as f64,

            SignalPattern::RandomWalk { start, step_std } => start + gaussian(*step_std, rng),

            SignalPattern::Diurnal {
                min,
                max,
                peak_hour,
                spread,
            } => {
                let diff = (hour_of_day - peak_hour).rem_euclid(24.0);
                let diff = if diff > 12.0 { 24.0 - diff } else { diff };
                let factor = if *spread > 0.0 {
                    (-diff * diff / (2.0 * spread * spread)).exp()
                } else if diff == 0.0 {
                    1.0
                } else {
                    0.0
                };
                min + (max - min) * factor
            }

            SignalPattern::Poisson { lambda, scale } => match Poisson::new(*lambda) {
                Ok(dist) => dist.sample(rng) * scale,
                Err(_) => 0.0,
            },

            SignalPattern::Composite(patterns) => patterns
                .iter()
                .map(|p| p.evaluate(elapsed_ms, hour_of_day, rng))
                .sum(),
        }
    }

    /// Warm afternoons, cool nights.
    pub fn temperature_diurnal(min: f64, max: f64) -> Self {
        SignalPattern::Diurnal {
            min,
            max,
            peak_hour: 14.0,
            spread: 4.0,
        }
    }

    /// Daylight bell curve, zero at night.
    pub fn daylight(max_lux: f64) -> Self {
        SignalPattern::Diurnal {
            min: 0.0,
            max: max_lux,
            peak_hour: 12.0,
            spread: 3.0,
        }
    }
}

/// Zero-mean normal sample; zero for an invalid deviation.
pub(crate) fn gaussian(std: f64, rng: &mut (impl Rng + ?Sized)) -> f64 {
    if std <= 0.0 {
        return 0.0;
    }
    Normal::new(0.0, std).map(|n| n.sample(rng)).unwrap_or(0.0)
}

/// State for patterns that need history.
#[derive(Debug, Clone, Default)]
pub struct PatternState {
    /// Current value for random walk.
    pub random_walk_value: f64,
}

impl PatternState {
    /// Create state initialized for a pattern.
    pub fn for_pattern(pattern: &SignalPattern) -> Self {
        let mut state = Self::default();
        if let SignalPattern::RandomWalk { start, .. } = pattern {
            state.random_walk_value = *start;
        }
        state
    }

    /// Evaluate pattern with state update.
    pub fn evaluate(
        &mut self,
        pattern: &SignalPattern,
        elapsed_ms: u64,
        hour_of_day: f64,
        rng: &mut (impl Rng + ?Sized),
    ) -> f64 {
        match pattern {
            SignalPattern::RandomWalk { step_std, .. } => {
                self.random_walk_value += gaussian(*step_std, rng);
                self.random_walk_value
            }
            _ => pattern.evaluate(elapsed_ms, hour_of_day, rng),
        }
    }

    /// Pull the walk back inside a range after clamping.
    pub fn clamp_walk(&mut self, min: f64, max: f64) {
        self.random_walk_value = self.random_walk_value.clamp(min, max);
    }
}
