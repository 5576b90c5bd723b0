//! Wire payloads and request forms for the backend endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::UtcOffset;
use vivarium_types::timestamp::parse_timestamp;
use vivarium_types::{DeviceId, DeviceState, DeviceStatus, SensorReading};

use crate::error::{Error, Result};
use crate::transport::FormFields;
use crate::watermark::SyncWatermark;

/// Body of a successful poll.
///
/// The backend omits both lists when its database has not changed since the
/// watermark, but always reports whether the controller process is alive.
/// Decode it with [`PollPayload::decode`]; the backend's naive timestamps
/// need its UTC offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollPayload {
    /// New readings, in whatever order the backend chose.
    #[serde(default)]
    pub sensor_readings: Option<Vec<SensorReading>>,
    /// Current state of every device.
    #[serde(default)]
    pub device_states: Option<Vec<DeviceState>>,
    /// Whether the backend controller process is running.
    #[serde(default)]
    pub backend_running: bool,
}

#[derive(Deserialize)]
struct WireReading {
    reading_datetime: String,
    temperature: f64,
    humidity: f64,
    #[serde(default)]
    comments: String,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(default)]
    sensor_readings: Option<Vec<WireReading>>,
    #[serde(default)]
    device_states: Option<Vec<DeviceState>>,
    #[serde(default)]
    backend_running: bool,
}

impl PollPayload {
    /// Decode a poll body, reading naive timestamps in `backend_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed JSON and [`Error::Parse`] for
    /// a timestamp in neither accepted format.
    pub fn decode(body: &[u8], backend_offset: UtcOffset) -> Result<Self> {
        let wire: WirePayload = serde_json::from_slice(body)?;
        let sensor_readings = wire
            .sensor_readings
            .map(|readings| {
                readings
                    .into_iter()
                    .map(|r| {
                        let timestamp = parse_timestamp(&r.reading_datetime, backend_offset)?;
                        Ok(SensorReading::new(timestamp, r.temperature, r.humidity)
                            .with_comments(r.comments))
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;

        Ok(Self {
            sensor_readings,
            device_states: wire.device_states,
            backend_running: wire.backend_running,
        })
    }
}

/// Form for the poll endpoint: `last` is the watermark in unix seconds.
pub fn poll_form(watermark: SyncWatermark) -> FormFields {
    vec![("last".to_string(), watermark.unix_seconds().to_string())]
}

/// Form for the toggle endpoint.
///
/// The backend flips whatever state it receives, so `state` carries the
/// state the device is leaving, not `requested`.
pub fn toggle_form(device: &DeviceId, requested: DeviceStatus) -> FormFields {
    vec![
        ("device".to_string(), device.to_string()),
        ("state".to_string(), requested.toggled().to_string()),
    ]
}

/// A settings submission: field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    fields: BTreeMap<String, String>,
}

impl SettingsForm {
    /// An empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Parse `NAME=VALUE` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a pair without `=` or with an
    /// empty name.
    ///
    /// ```
    /// use vivarium_core::protocol::SettingsForm;
    ///
    /// let form = SettingsForm::from_pairs(["day_temp=26.5", "lights_on=true"]).unwrap();
    /// assert_eq!(form.get("day_temp"), Some("26.5"));
    /// assert!(SettingsForm::from_pairs(["oops"]).is_err());
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut form = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::invalid_config(format!("expected NAME=VALUE, got '{}'", pair)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::invalid_config(format!("empty setting name in '{}'", pair)));
            }
            form.set(name, value.trim());
        }
        Ok(form)
    }

    /// Value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the form has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The form as request fields.
    pub fn to_fields(&self) -> FormFields {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
