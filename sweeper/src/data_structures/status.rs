use super::{time_format, Device};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Append-only audit entry posted to the status collection.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub device_id:  String,
    #[serde(serialize_with = "time_format::serialize")]
    pub timestamp:  DateTime<Utc>,
    pub note:       String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery:    Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirt_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obstacle:   Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode:       Option<String>,
}

impl StatusEvent {
    pub fn new(device_id: &str, note: &str) -> Self {
        Self {
            device_id:  device_id.into(),
            timestamp:  Utc::now(),
            note:       note.into(),
            battery:    None,
            dirt_level: None,
            obstacle:   None,
            mode:       None,
        }
    }

    /// Event carrying the device's current readings.
    pub fn snapshot(device: &Device, note: &str) -> Self {
        Self {
            battery: device.kind.battery(),
            dirt_level: device.kind.dirt_level(),
            obstacle: device.kind.obstacle(),
            mode: device.mode.as_ref().map(|m| m.to_string()),
            ..Self::new(&device.id, note)
        }
    }

    /// Sensor reading, dirt level only.
    pub fn reading(device: &Device, note: &str) -> Self {
        Self {
            dirt_level: device.kind.dirt_level(),
            ..Self::new(&device.id, note)
        }
    }
}
