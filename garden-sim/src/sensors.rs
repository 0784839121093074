// Garden Sim - Garden sensor presets
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor configurations for a garden plot.
//!
//! One [`SensorSpec`] per channel: the pattern driving it, the noise on
//! top and the physical range every sample is clamped to.

use garden::Channel;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::patterns::SignalPattern;

/// Sensor configuration for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSpec {
    /// Channel this sensor reports.
    pub channel: Channel,
    /// Minimum physical value.
    pub min: f64,
    /// Maximum physical value.
    pub max: f64,
    /// Signal pattern.
    pub pattern: SignalPattern,
    /// Standard deviation of added noise.
    pub noise_std: f64,
}

impl SensorSpec {
    /// Create a sensor configuration.
    pub fn new(channel: Channel, min: f64, max: f64, pattern: SignalPattern) -> Self {
        Self {
            channel,
            min,
            max,
            pattern,
            noise_std: 0.0,
        }
    }

    /// Add noise to the sensor.
    pub fn with_noise(mut self, std: f64) -> Self {
        self.noise_std = std;
        self
    }

    /// Check the range is usable for clamping.
    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(SimError::InvalidRange {
                channel: self.channel.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// The set of sensors on one garden station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GardenSensors {
    sensors: Vec<SensorSpec>,
}

impl GardenSensors {
    /// A station with no sensors.
    pub fn empty() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Add or replace the sensor for a channel.
    pub fn with_sensor(mut self, sensor: SensorSpec) -> Self {
        self.sensors.retain(|s| s.channel != sensor.channel);
        self.sensors.push(sensor);
        self
    }

    /// Dry spell: soil moisture drains steadily and it never rains.
    pub fn drought() -> Self {
        Self::default()
            .with_sensor(
                SensorSpec::new(
                    Channel::SoilMoisture,
                    0.0,
                    100.0,
                    SignalPattern::Linear {
                        start: 40.0,
                        slope_per_ms: -0.000_000_1,
                    },
                )
                .with_noise(0.3),
            )
            .with_sensor(SensorSpec::new(
                Channel::Rainfall,
                0.0,
                100.0,
                SignalPattern::Constant { value: 0.0 },
            ))
    }

    /// Sensor for a channel, if fitted.
    pub fn get(&self, channel: Channel) -> Option<&SensorSpec> {
        self.sensors.iter().find(|s| s.channel == channel)
    }

    /// All fitted sensors.
    pub fn iter(&self) -> impl Iterator<Item = &SensorSpec> {
        self.sensors.iter()
    }

    /// Number of fitted sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// True when no sensor is fitted.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Validate every sensor.
    pub fn validate(&self) -> Result<()> {
        self.sensors.iter().try_for_each(SensorSpec::validate)
    }
}

impl Default for GardenSensors {
    fn default() -> Self {
        Self::empty()
            // Air temperature, °C
            .with_sensor(
                SensorSpec::new(
                    Channel::Temperature,
                    -20.0,
                    50.0,
                    SignalPattern::temperature_diurnal(12.0, 27.0),
                )
                .with_noise(0.4),
            )
            // Relative humidity, %, lowest in the warm afternoon
            .with_sensor(
                SensorSpec::new(
                    Channel::Humidity,
                    0.0,
                    100.0,
                    SignalPattern::Composite(vec![
                        SignalPattern::Constant { value: 85.0 },
                        SignalPattern::Diurnal {
                            min: 0.0,
                            max: -30.0,
                            peak_hour: 14.0,
                            spread: 4.0,
                        },
                    ]),
                )
                .with_noise(1.5),
            )
            // Light, lux
            .with_sensor(
                SensorSpec::new(
                    Channel::Light,
                    0.0,
                    120_000.0,
                    SignalPattern::daylight(50_000.0),
                )
                .with_noise(250.0),
            )
            // Soil moisture, %, slow drift
            .with_sensor(
                SensorSpec::new(
                    Channel::SoilMoisture,
                    0.0,
                    100.0,
                    SignalPattern::RandomWalk {
                        start: 45.0,
                        step_std: 0.2,
                    },
                )
                .with_noise(0.3),
            )
            // Rainfall, mm per sample
            .with_sensor(SensorSpec::new(
                Channel::Rainfall,
                0.0,
                100.0,
                SignalPattern::Poisson {
                    lambda: 0.05,
                    scale: 0.5,
                },
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_covers_every_channel() {
        let sensors = GardenSensors::default();
        assert_eq!(sensors.len(), Channel::ALL.len());
        for channel in Channel::ALL {
            assert!(sensors.get(channel).is_some(), "{} missing", channel);
        }
        assert!(sensors.validate().is_ok());
    }

    #[test]
    fn test_with_sensor_replaces() {
        let sensors = GardenSensors::default().with_sensor(SensorSpec::new(
            Channel::Light,
            0.0,
            10.0,
            SignalPattern::Constant { value: 3.0 },
        ));

        assert_eq!(sensors.len(), 5);
        assert_eq!(sensors.get(Channel::Light).unwrap().max, 10.0);
    }

    #[test]
    fn test_drought_has_no_rain() {
        let sensors = GardenSensors::drought();
        assert_eq!(
            sensors.get(Channel::Rainfall).unwrap().pattern,
            SignalPattern::Constant { value: 0.0 }
        );
    }

    #[test]
    fn test_invalid_range() {
        let sensors = GardenSensors::empty().with_sensor(SensorSpec::new(
            Channel::Humidity,
            100.0,
            0.0,
            SignalPattern::Constant { value: 50.0 },
        ));

        assert!(matches!(
            sensors.validate(),
            Err(SimError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_nan_range_rejected() {
        let sensor = SensorSpec::new(
            Channel::Rainfall,
            f64::NAN,
            1.0,
            SignalPattern::Constant { value: 0.0 },
        );
        assert!(sensor.validate().is_err());
    }
}
