//! Core types for vivarium sensor and device data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::ParseError;

/// A single temperature/humidity reading recorded by the vivarium backend.
///
/// Readings are immutable once received. The timestamp is serialized as
/// RFC 3339 under the backend's field name `reading_datetime`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorReading {
    /// When the reading was recorded.
    #[cfg_attr(
        feature = "serde",
        serde(
            rename = "reading_datetime",
            with = "crate::timestamp::serde_reading_datetime"
        )
    )]
    pub timestamp: OffsetDateTime,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Free-text comments attached by the backend (e.g. "Heat mat on.").
    #[cfg_attr(feature = "serde", serde(default))]
    pub comments: String,
}

impl SensorReading {
    /// Create a reading with no comments.
    pub fn new(timestamp: OffsetDateTime, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            comments: String::new(),
        }
    }

    /// Attach comments to the reading.
    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// The timestamp as shown in table rows and chart labels.
    pub fn label(&self) -> String {
        crate::timestamp::format_label(self.timestamp)
    }
}

/// Identifier of a switchable device (e.g. `heat_mat`, `pump`, `fan`, `light`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::EmptyDeviceId`] if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ParseError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ParseError::EmptyDeviceId);
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// On/off state of a switchable device.
///
/// Serializes as `"On"` / `"Off"`, matching the backend; parsing is
/// case-insensitive.
///
/// ```
/// use vivarium_types::DeviceStatus;
///
/// assert_eq!("on".parse::<DeviceStatus>(), Ok(DeviceStatus::On));
/// assert_eq!(DeviceStatus::On.toggled(), DeviceStatus::Off);
/// assert_eq!(DeviceStatus::Off.to_string(), "Off");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceStatus {
    /// The device is switched on.
    On,
    /// The device is switched off.
    #[default]
    Off,
}

impl DeviceStatus {
    /// The opposite state.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            DeviceStatus::On => DeviceStatus::Off,
            DeviceStatus::Off => DeviceStatus::On,
        }
    }

    /// Wire/display representation.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceStatus::On => "On",
            DeviceStatus::Off => "Off",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Ok(DeviceStatus::On),
            "off" | "0" | "false" => Ok(DeviceStatus::Off),
            _ => Err(ParseError::InvalidDeviceState(s.to_string())),
        }
    }
}

/// Authoritative state of one device as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    /// The device this state belongs to (wire name `device`).
    #[cfg_attr(feature = "serde", serde(rename = "device"))]
    pub device_id: DeviceId,
    /// Current on/off state.
    pub state: DeviceStatus,
}

impl DeviceState {
    /// Create a device state.
    pub fn new(device_id: DeviceId, state: DeviceStatus) -> Self {
        Self { device_id, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_device_id_rejects_empty() {
        assert_eq!(DeviceId::new(""), Err(ParseError::EmptyDeviceId));
        assert_eq!(DeviceId::new("   "), Err(ParseError::EmptyDeviceId));
        assert_eq!(DeviceId::new("pump").unwrap().as_str(), "pump");
    }

    #[test]
    fn test_device_status_parse() {
        assert_eq!("On".parse::<DeviceStatus>(), Ok(DeviceStatus::On));
        assert_eq!(" OFF ".parse::<DeviceStatus>(), Ok(DeviceStatus::Off));
        assert!(matches!(
            "dim".parse::<DeviceStatus>(),
            Err(ParseError::InvalidDeviceState(_))
        ));
    }

    #[test]
    fn test_reading_label() {
        let reading = SensorReading::new(datetime!(2024-05-01 13:37:05.9 UTC), 24.5, 61.0);
        assert_eq!(reading.label(), "2024-05-01 13:37:05");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_reading_deserializes_rfc3339() {
        let json = r#"{
            "reading_datetime": "2024-05-01T13:37:05.123456+01:00",
            "temperature": 24.5,
            "humidity": 61.2,
            "comments": "Heat mat on."
        }"#;
        let reading: SensorReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.timestamp.microsecond(), 123_456);
        assert_eq!(reading.timestamp, datetime!(2024-05-01 12:37:05.123456 UTC));
        assert!((reading.temperature - 24.5).abs() < f64::EPSILON);
        assert_eq!(reading.comments, "Heat mat on.");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_reading_comments_default_to_empty() {
        let json = r#"{"reading_datetime": "2024-05-01T13:37:05Z", "temperature": 20, "humidity": 50}"#;
        let reading: SensorReading = serde_json::from_str(json).unwrap();
        assert!(reading.comments.is_empty());

        // The naive backend form needs an offset and is decoded elsewhere.
        let naive = r#"{"reading_datetime": "2024-05-01 13:37:05", "temperature": 20, "humidity": 50}"#;
        assert!(serde_json::from_str::<SensorReading>(naive).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_device_state_wire_format() {
        let state: DeviceState = serde_json::from_str(r#"{"device": "pump", "state": "On"}"#).unwrap();
        assert_eq!(state.device_id.as_str(), "pump");
        assert_eq!(state.state, DeviceStatus::On);

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"device":"pump","state":"On"}"#);
    }
}
