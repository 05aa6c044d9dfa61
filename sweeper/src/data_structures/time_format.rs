use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use serde::{self, Serializer};
use serde_json::Value;

pub fn to_iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_iso(date))
}

pub fn serialize_opt<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        Some(d) => serialize(d, serializer),
        None => serializer.serialize_none(),
    }
}

/// Accepts RFC 3339 strings and unix timestamps (seconds or milliseconds).
pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(DateTime::<Utc>::from)
            .or_else(|| s.trim().parse::<i64>().ok().and_then(from_unix)),
        Value::Number(n) => n.as_i64().and_then(from_unix),
        _ => None,
    }
}

fn from_unix(ts: i64) -> Option<DateTime<Utc>> {
    // Anything past the year 33658 in seconds is a millisecond stamp.
    if ts.abs() >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(ts).single()
    } else {
        Utc.timestamp_opt(ts, 0).single()
    }
}

pub fn format_local(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
