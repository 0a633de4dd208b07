use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Custom deserializer for timestamps that accepts integers (ms), RFC3339 strings and
/// Firestore-style `{seconds, nanoseconds}` objects
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    timestamp_from_value(&value).map_err(Error::custom)
}

/// Same as [`deserialize_timestamp`] but maps `null` to `None`
///
/// Pair with `#[serde(default)]` so a missing field also becomes `None`.
pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    timestamp_from_value(&value).map(Some).map_err(Error::custom)
}

/// Custom deserializer for document IDs: any non-empty string
pub fn deserialize_document_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;

    if s.trim().is_empty() {
        return Err(Error::custom("document ID cannot be empty"));
    }

    Ok(s)
}

/// Treats an explicit `null` the same as a missing field: falls back to `T::default()`
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional timestamp for display-only fields: an unreadable value is logged and becomes `None`
/// instead of failing the whole document
pub fn deserialize_lenient_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match timestamp_from_value(&value) {
        Ok(timestamp) => Ok(Some(timestamp)),
        Err(e) => {
            warn!(%value, "Ignoring unreadable timestamp: {}", e);
            Ok(None)
        }
    }
}

/// Unread counters keyed by participant ID
///
/// Counts outside `0..=u32::MAX` are clamped and non-numeric entries dropped, both with a
/// warning. `null` is an empty map.
pub fn deserialize_unread_counts<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();

    let mut counts = BTreeMap::new();
    for (participant, value) in raw {
        let Value::Number(n) = &value else {
            warn!(participant = %participant, %value, "Dropping non-numeric unread counter");
            continue;
        };
        let count = match n.as_u64() {
            Some(count) => u32::try_from(count).unwrap_or(u32::MAX),
            // Negative or fractional; the float cast saturates into range
            None => n.as_f64().map_or(0, |count| count as u32),
        };
        if Value::from(count) != value {
            warn!(participant = %participant, %value, count, "Clamped unread counter");
        }
        counts.insert(participant, count);
    }
    Ok(counts)
}

fn timestamp_from_value(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::Number(n) => {
            // Unix timestamp in milliseconds
            let ms = n.as_i64().ok_or_else(|| "invalid timestamp".to_string())?;
            DateTime::from_timestamp_millis(ms).ok_or_else(|| "timestamp out of range".to_string())
        }
        Value::String(s) => {
            s.parse::<DateTime<Utc>>().map_err(|e| format!("invalid RFC3339 timestamp: {}", e))
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)
                .ok_or_else(|| "timestamp object is missing seconds".to_string())?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).map_err(|_| "nanoseconds out of range".to_string())?;
            DateTime::from_timestamp(seconds, nanos)
                .ok_or_else(|| "timestamp out of range".to_string())
        }
        _ => Err("timestamp must be a number, string or {seconds, nanoseconds} object".to_string()),
    }
}
