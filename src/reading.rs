//! Readings and their wire payloads
//!
//! A [`ReadingPayload`] is what a field sensor publishes: up to five
//! optional numbers keyed by camelCase names. A [`Reading`] is the stored,
//! immutable form: the same five fields plus the time the adapter observed
//! the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::IngestError;

/// Point in time, always UTC
pub type Timestamp = DateTime<Utc>;

/// Decoded sensor payload.
///
/// Absent keys and explicit `null` both decode to `None`; unknown keys are
/// ignored. Any present value must be a JSON number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainfall: Option<f64>,
}

impl ReadingPayload {
    /// Decode a raw payload; the top level must be a JSON object
    pub fn parse(raw: &[u8]) -> Result<Self, IngestError> {
        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| IngestError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(IngestError::Malformed(
                "payload is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| IngestError::Malformed(e.to_string()))
    }

    /// Encode as JSON bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        // Serializing a struct of Option<f64> cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Set one channel's value
    pub fn with_value(mut self, channel: Channel, value: f64) -> Self {
        *self.slot(channel) = Some(value);
        self
    }

    /// Get one channel's value
    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Light => self.light,
            Channel::SoilMoisture => self.soil_moisture,
            Channel::Rainfall => self.rainfall,
        }
    }

    fn slot(&mut self, channel: Channel) -> &mut Option<f64> {
        match channel {
            Channel::Temperature => &mut self.temperature,
            Channel::Humidity => &mut self.humidity,
            Channel::Light => &mut self.light,
            Channel::SoilMoisture => &mut self.soil_moisture,
            Channel::Rainfall => &mut self.rainfall,
        }
    }
}

/// One stored sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub rainfall: Option<f64>,
    /// Observation time assigned on the write path
    pub created_at: Timestamp,
}

impl Reading {
    /// Build a reading from a decoded payload and its observation time
    pub fn from_payload(payload: ReadingPayload, created_at: Timestamp) -> Self {
        Self {
            temperature: payload.temperature,
            humidity: payload.humidity,
            light: payload.light,
            soil_moisture: payload.soil_moisture,
            rainfall: payload.rainfall,
            created_at,
        }
    }

    /// Value of one channel, `None` when the sensor did not report it
    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Light => self.light,
            Channel::SoilMoisture => self.soil_moisture,
            Channel::Rainfall => self.rainfall,
        }
    }

    /// True when no channel carries a value
    pub fn is_blank(&self) -> bool {
        Channel::ALL.iter().all(|c| self.value(*c).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_full_payload() {
        let raw = br#"{"temperature":21.5,"humidity":60,"light":1200.0,"soilMoisture":35.2,"rainfall":0}"#;
        let payload = ReadingPayload::parse(raw).unwrap();
        assert_eq!(payload.temperature, Some(21.5));
        assert_eq!(payload.humidity, Some(60.0));
        assert_eq!(payload.soil_moisture, Some(35.2));
        assert_eq!(payload.rainfall, Some(0.0));
    }

    #[test]
    fn test_parse_missing_and_null_fields() {
        let payload = ReadingPayload::parse(br#"{"temperature":null,"light":5}"#).unwrap();
        assert_eq!(payload.temperature, None);
        assert_eq!(payload.humidity, None);
        assert_eq!(payload.light, Some(5.0));

        let empty = ReadingPayload::parse(b"{}").unwrap();
        assert_eq!(empty, ReadingPayload::default());
    }

    #[test]
    fn test_parse_ignores_unknown_keys() {
        let payload = ReadingPayload::parse(br#"{"humidity":40,"deviceId":"bed-3"}"#).unwrap();
        assert_eq!(payload.humidity, Some(40.0));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let result = ReadingPayload::parse(br#"{"temperature":"warm"}"#);
        assert!(matches!(result, Err(IngestError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        for raw in [&b"not json"[..], b"[1,2,3]", b"42", b""] {
            assert!(matches!(
                ReadingPayload::parse(raw),
                Err(IngestError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_payload_serializes_only_present_fields() {
        let payload = ReadingPayload::default().with_value(Channel::SoilMoisture, 12.5);
        let json = String::from_utf8(payload.to_bytes()).unwrap();
        assert_eq!(json, r#"{"soilMoisture":12.5}"#);
    }

    #[test]
    fn test_reading_from_payload() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let payload = ReadingPayload::default()
            .with_value(Channel::Temperature, 18.0)
            .with_value(Channel::Rainfall, 2.5);
        let reading = Reading::from_payload(payload, at);

        assert_eq!(reading.created_at, at);
        assert_eq!(reading.value(Channel::Temperature), Some(18.0));
        assert_eq!(reading.value(Channel::Rainfall), Some(2.5));
        assert_eq!(reading.value(Channel::Humidity), None);
        assert!(!reading.is_blank());
    }

    #[test]
    fn test_reading_storage_shape() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let reading = Reading::from_payload(ReadingPayload::default(), at);
        assert!(reading.is_blank());

        let json = serde_json::to_value(&reading).unwrap();
        assert!(json["soil_moisture"].is_null());
        assert!(json["created_at"].is_string());

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);
    }
}
