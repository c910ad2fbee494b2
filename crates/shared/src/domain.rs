use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A vote as reported by the device. Only `id` and `voto` are expected, every
/// other field is carried through untouched and in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteEvent(Map<String, Value>);

#[derive(Debug, Error)]
pub enum VoteParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl VoteEvent {
    /// Parses one serial line. Any JSON object is accepted.
    pub fn parse_line(line: &str) -> Result<Self, VoteParseError> {
        let value: Value = serde_json::from_str(line)?;
        Self::try_from(value)
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn voto(&self) -> Option<i64> {
        self.0.get("voto").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Value> for VoteEvent {
    type Error = VoteParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            Value::Null => Err(VoteParseError::NotAnObject("null")),
            Value::Bool(_) => Err(VoteParseError::NotAnObject("boolean")),
            Value::Number(_) => Err(VoteParseError::NotAnObject("number")),
            Value::String(_) => Err(VoteParseError::NotAnObject("string")),
            Value::Array(_) => Err(VoteParseError::NotAnObject("array")),
        }
    }
}

pub const RECEIVED_AT_FIELD: &str = "receivedAt";

/// One line of the vote log: the device fields plus the gateway's receive time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedVote {
    #[serde(flatten)]
    pub event: VoteEvent,
    #[serde(rename = "receivedAt", with = "iso_millis")]
    pub received_at: DateTime<Utc>,
}

impl LoggedVote {
    /// Stamps `event`. A `receivedAt` sent by the device is replaced.
    pub fn stamp(event: VoteEvent, received_at: DateTime<Utc>) -> Self {
        let mut fields = event.0;
        fields.shift_remove(RECEIVED_AT_FIELD);
        Self {
            event: VoteEvent(fields),
            received_at,
        }
    }

    /// Looks up a column by name, `receivedAt` included.
    pub fn field(&self, key: &str) -> Option<Value> {
        if key == RECEIVED_AT_FIELD {
            return Some(Value::String(format_timestamp(&self.received_at)));
        }
        self.event.get(key).cloned()
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T10:00:00.123Z`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
