//! Wire envelope exchanged with the intelligence backend.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Kind of message carried by an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Command,
    Response,
    Event,
    HealthCheck,
}

impl MessageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Response => "response",
            Self::Event => "event",
            Self::HealthCheck => "health_check",
        }
    }
}

/// Structured message unit carrying routing metadata and a payload object.
///
/// `target` names a logical backend service (`system`, `git_semantic`, ...)
/// and is not validated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub source: String,
    pub target: String,
    /// Epoch milliseconds.
    #[serde(deserialize_with = "deserialize_millis")]
    pub timestamp: i64,
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Envelope {
    /// `payload.success` as the backend reported it. Anything but a JSON `true`
    /// counts as failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.payload.get("success").and_then(Value::as_bool) == Some(true)
    }

    /// `payload.error` when it is a string.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.payload.get("error").and_then(Value::as_str)
    }
}

// Integers are read exactly. Backends written against float clocks send
// fractional milliseconds, which are truncated.
fn deserialize_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Number::deserialize(deserializer)?;
    let millis = raw
        .as_i64()
        .or_else(|| raw.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
        .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {raw}")))?;
    if millis < 0 {
        return Err(D::Error::custom(format!("negative timestamp: {raw}")));
    }
    Ok(millis)
}
