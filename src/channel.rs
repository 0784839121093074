//! Sensor channel selection
//!
//! A [`Channel`] picks exactly one numeric field out of a
//! [`Reading`](crate::reading::Reading). The set is closed: names outside
//! it are rejected while parsing, before any store is touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// One of the five measured quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Air temperature, °C
    Temperature,
    /// Relative humidity, %
    Humidity,
    /// Light intensity, lux
    Light,
    /// Soil moisture, %
    SoilMoisture,
    /// Rainfall, mm
    Rainfall,
}

impl Channel {
    /// Every channel, in display order
    pub const ALL: [Channel; 5] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Light,
        Channel::SoilMoisture,
        Channel::Rainfall,
    ];

    /// Query name of the channel (`soil_moisture`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Light => "light",
            Channel::SoilMoisture => "soil_moisture",
            Channel::Rainfall => "rainfall",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| QueryError::InvalidChannel(s.to_string()))
    }
}
