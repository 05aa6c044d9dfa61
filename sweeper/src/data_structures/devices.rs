use super::{
    constants::FieldKeys,
    fields::*,
    time_format, Room,
};
use crate::error::{SweeperError, SweeperResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

pub type DeviceId = String;

/// A device record normalized out of the loosely-typed store shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Assigned by the store. Empty for drafts that have not been created yet.
    pub id:        DeviceId,
    pub name:      String,
    pub room:      Option<Room>,
    pub parent_id: Option<DeviceId>,
    pub active:    bool,
    pub mode:      Option<Mode>,
    pub last_used: Option<DateTime<Utc>>,
    pub kind:      DeviceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceKind {
    Robot {
        battery:    u8,
        dirt_level: u8,
        obstacle:   bool,
    },
    Dock {
        battery: Option<u8>,
    },
    Sensor {
        dirt_level: Option<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Mode {
    #[display(fmt = "Reposo")]
    Idle,
    #[display(fmt = "Limpieza")]
    Cleaning,
    #[display(fmt = "Reportando")]
    Reporting,
    #[display(fmt = "{}", _0)]
    Other(String),
}

impl Mode {
    pub fn parse(s: &str) -> Mode {
        match s.trim().to_lowercase().as_str() {
            "reposo" | "idle" => Mode::Idle,
            "limpieza" | "cleaning" => Mode::Cleaning,
            "reportando" | "reporting" => Mode::Reporting,
            _ => Mode::Other(s.trim().to_string()),
        }
    }
}

impl DeviceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceKind::Robot { .. } => "robot",
            DeviceKind::Dock { .. } => "dock",
            DeviceKind::Sensor { .. } => "sensor",
        }
    }

    pub fn battery(&self) -> Option<u8> {
        match self {
            DeviceKind::Robot { battery, .. } => Some(*battery),
            DeviceKind::Dock { battery } => *battery,
            DeviceKind::Sensor { .. } => None,
        }
    }

    pub fn dirt_level(&self) -> Option<u8> {
        match self {
            DeviceKind::Robot { dirt_level, .. } => Some(*dirt_level),
            DeviceKind::Sensor { dirt_level } => *dirt_level,
            DeviceKind::Dock { .. } => None,
        }
    }

    pub fn obstacle(&self) -> Option<bool> {
        match self {
            DeviceKind::Robot { obstacle, .. } => Some(*obstacle),
            _ => None,
        }
    }
}

impl Device {
    /// Normalizes a raw record. Records without an id or with a type other
    /// than robot, dock or sensor are rejected.
    pub fn from_record(record: &Record) -> SweeperResult<Self> {
        let id = field_str(record, FieldKeys::ID)
            .ok_or_else(|| SweeperError::Malformed("record has no id".into()))?;
        let typ = field_str(record, FieldKeys::TYPE)
            .unwrap_or_default()
            .to_lowercase();
        let kind = match typ.as_str() {
            "robot" => DeviceKind::Robot {
                battery:    field_percent(record, FieldKeys::BATTERY).unwrap_or(100),
                dirt_level: field_percent(record, FieldKeys::DIRT_LEVEL).unwrap_or(0),
                obstacle:   parse_flag(record, FieldKeys::OBSTACLE),
            },
            "dock" => DeviceKind::Dock {
                battery: field_percent(record, FieldKeys::BATTERY),
            },
            "sensor" => DeviceKind::Sensor {
                dirt_level: field_percent(record, FieldKeys::DIRT_LEVEL),
            },
            other => {
                return Err(SweeperError::Malformed(format!(
                    "device {} has unsupported type '{}'",
                    id, other
                )))
            }
        };
        let name = field_str(record, FieldKeys::NAME).unwrap_or_default();
        Ok(Device {
            room: Some(resolve_room(record)),
            parent_id: field_str(record, FieldKeys::PARENT),
            active: parse_active(record),
            mode: field_str(record, FieldKeys::MODE).map(|m| Mode::parse(&m)),
            last_used: get_field(record, FieldKeys::LAST_USED).and_then(time_format::parse),
            id,
            name,
            kind,
        })
    }

    /// A device that has not been created in the store yet.
    pub fn draft(name: String, room: Room, parent_id: Option<DeviceId>, kind: DeviceKind) -> Self {
        let mode = match kind {
            DeviceKind::Sensor { .. } => Mode::Reporting,
            _ => Mode::Idle,
        };
        Device {
            id: DeviceId::new(),
            room: Some(room),
            active: true,
            mode: Some(mode),
            last_used: Some(Utc::now()),
            name,
            parent_id,
            kind,
        }
    }

    pub fn is_robot(&self) -> bool {
        matches!(self.kind, DeviceKind::Robot { .. })
    }

    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, DeviceKind::Sensor { .. })
    }

    /// Dock by type, or by the `Dock <room>` naming convention.
    pub fn is_dock_like(&self) -> bool {
        matches!(self.kind, DeviceKind::Dock { .. }) || self.name.to_lowercase().starts_with("dock")
    }

    pub fn is_sensor_like(&self) -> bool {
        self.is_sensor() || self.name.to_lowercase().starts_with("sensor")
    }

    /// Body for create and update calls, written with the store's canonical keys.
    pub fn to_payload(&self) -> Value {
        let payload = DevicePayload {
            name:       &self.name,
            typ:        self.kind.type_name(),
            room:       self.room.map(|r| r.to_string()),
            parent_id:  self.parent_id.as_deref(),
            active:     self.active,
            mode:       self.mode.as_ref().map(|m| m.to_string()),
            battery:    self.kind.battery(),
            dirt_level: self.kind.dirt_level(),
            obstacle:   self.kind.obstacle(),
            last_used:  self.last_used,
        };
        serde_json::to_value(payload).unwrap_or(Value::Null)
    }
}

/// Explicit room field first, then inference from the name. A device with
/// neither lands in `General`.
pub fn resolve_room(record: &Record) -> Room {
    match field_str(record, FieldKeys::ROOM) {
        Some(room) => Room::from_field(&room),
        None => Room::from_name(&field_str(record, FieldKeys::NAME).unwrap_or_default()),
    }
}

#[derive(Serialize)]
struct DevicePayload<'a> {
    name:       &'a str,
    #[serde(rename = "tipo")]
    typ:        &'static str,
    #[serde(rename = "Ubicacion", skip_serializing_if = "Option::is_none")]
    room:       Option<String>,
    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    parent_id:  Option<&'a str>,
    #[serde(rename = "Activo")]
    active:     bool,
    #[serde(rename = "Modo", skip_serializing_if = "Option::is_none")]
    mode:       Option<String>,
    #[serde(rename = "Bateria")]
    battery:    Option<u8>,
    #[serde(rename = "Nivel_suciedad")]
    dirt_level: Option<u8>,
    #[serde(rename = "Obstaculo")]
    obstacle:   Option<bool>,
    #[serde(
        rename = "Ultimo_uso",
        serialize_with = "time_format::serialize_opt",
        skip_serializing_if = "Option::is_none"
    )]
    last_used:  Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn normalizes_mixed_casing() {
        let d = Device::from_record(&record(json!({
            "id": "4",
            "Nombre": "Robot Cocina",
            "Tipo": "Robot",
            "bateria": 55,
            "nivel_suciedad": "20",
            "obstaculo": "si",
            "modo": "Limpieza",
            "activo": "no",
            "createdAt": "2025-09-19T01:02:03.000Z"
        })))
        .unwrap();
        assert_eq!("4", d.id);
        assert_eq!("Robot Cocina", d.name);
        assert_eq!(Some(Room::Kitchen), d.room);
        assert_eq!(Some(Mode::Cleaning), d.mode);
        assert!(!d.active);
        assert!(d.last_used.is_some());
        assert_eq!(
            DeviceKind::Robot {
                battery:    55,
                dirt_level: 20,
                obstacle:   true,
            },
            d.kind
        );
    }

    #[test]
    fn explicit_room_beats_name() {
        let d = Device::from_record(&record(json!({
            "id": "1", "name": "Robot Cocina", "tipo": "robot", "Ubicacion": "Sala"
        })))
        .unwrap();
        assert_eq!(Some(Room::LivingRoom), d.room);
    }

    #[test]
    fn room_resolution_is_idempotent() {
        let r = record(json!({"id": "1", "name": "Robot Baño", "tipo": "robot"}));
        let first = Device::from_record(&r).unwrap();
        let second = Device::from_record(&r).unwrap();
        assert_eq!(Some(Room::Bathroom), first.room);
        assert_eq!(first.room, second.room);
        let reread = Device::from_record(first.to_payload().as_object().unwrap());
        assert!(reread.is_err(), "payloads carry no id");
    }

    #[test]
    fn nameless_device_lands_in_general() {
        let d = Device::from_record(&record(json!({"id": "9", "tipo": "sensor"}))).unwrap();
        assert_eq!(Some(Room::General), d.room);
        let blank = record(json!({"id": "9", "tipo": "robot", "name": "  "}));
        assert_eq!(Room::General, resolve_room(&blank));
    }

    #[test]
    fn rejects_unknown_types_and_missing_ids() {
        assert!(Device::from_record(&record(json!({"id": "1", "tipo": "lamp"}))).is_err());
        assert!(Device::from_record(&record(json!({"tipo": "robot"}))).is_err());
    }

    #[test]
    fn payload_uses_store_keys() {
        let mut d = Device::draft(
            "Sensor Kitchen".into(),
            Room::Kitchen,
            Some("3".into()),
            DeviceKind::Sensor {
                dirt_level: Some(12),
            },
        );
        d.last_used = None;
        assert_eq!(
            json!({
                "name": "Sensor Kitchen",
                "tipo": "sensor",
                "Ubicacion": "Kitchen",
                "parentId": "3",
                "Activo": true,
                "Modo": "Reportando",
                "Bateria": null,
                "Nivel_suciedad": 12,
                "Obstaculo": null
            }),
            d.to_payload()
        );
    }
}
