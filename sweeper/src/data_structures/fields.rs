use super::constants::FieldKeys;
use serde_json::{Map, Value};

/// A raw device record as it comes off the wire.
pub type Record = Map<String, Value>;

/// Returns the first of `keys` present on `record`, trying each key verbatim
/// and then lowercased. A present `null` counts as a hit.
pub fn get_field<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(v) = record.get(*key) {
            return Some(v);
        }
        let lower = key.to_lowercase();
        if let Some(v) = record.get(&lower) {
            return Some(v);
        }
    }
    None
}

/// Resolves the active flag. Devices are active unless a record says otherwise.
pub fn parse_active(record: &Record) -> bool {
    match get_field(record, FieldKeys::ACTIVE) {
        None | Some(Value::Null) => true,
        Some(v) => is_truthy(v),
    }
}

/// Boolean-like flag that defaults to false, e.g. the obstacle marker.
pub fn parse_flag(record: &Record, keys: &[&str]) -> bool {
    get_field(record, keys).map(is_truthy).unwrap_or(false)
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => {
            let s = s.trim().to_lowercase();
            s == "si" || s == "true"
        }
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String view of a field. Numbers are rendered, empty strings count as absent.
pub fn field_str(record: &Record, keys: &[&str]) -> Option<String> {
    match get_field(record, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Percentage field (battery, dirt level), clamped to 0..=100.
pub fn field_percent(record: &Record, keys: &[&str]) -> Option<u8> {
    let raw = match get_field(record, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if raw.is_nan() {
        return None;
    }
    Some(raw.round().max(0.0).min(100.0) as u8)
}
