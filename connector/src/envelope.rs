//! Envelope codec: outgoing command construction and reply validation.

use sage_types::{Envelope, MessageType};
use serde_json::{Map, Value};

use crate::error::ConnectorError;

/// Fixed `source` identifying this connector on the wire.
pub const SOURCE: &str = "editor_connector";

/// Prefix of every message id issued by this connector.
pub const ORIGIN_TAG: &str = "editor";

/// Reserved payload key naming the command.
pub const COMMAND_KEY: &str = "command";

/// Failure message when the backend omits `payload.error`.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Issues `<origin>_<counter>_<epoch-millis>` ids.
///
/// The counter starts at 1 and strictly increases for the lifetime of the
/// generator, so ids stay unique even when two are minted in the same
/// millisecond.
#[derive(Debug)]
pub struct MessageIdGenerator {
    origin: &'static str,
    counter: u64,
}

impl MessageIdGenerator {
    #[must_use]
    pub fn new(origin: &'static str) -> Self {
        Self { origin, counter: 0 }
    }

    pub fn next_id(&mut self, now_millis: i64) -> String {
        self.counter += 1;
        format!("{}_{}_{}", self.origin, self.counter, now_millis)
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new(ORIGIN_TAG)
    }
}

#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build a command envelope whose payload is `{command} ⊕ params`.
///
/// `command` is reserved: a caller-supplied `command` key is dropped.
#[must_use]
pub fn build_command(
    id: String,
    target: &str,
    command: &str,
    params: Map<String, Value>,
    timestamp: i64,
) -> Envelope {
    let mut payload = Map::with_capacity(params.len() + 1);
    payload.insert(COMMAND_KEY.to_string(), Value::String(command.to_string()));
    for (key, value) in params {
        if key == COMMAND_KEY {
            tracing::debug!(command, "dropping reserved 'command' key from params");
            continue;
        }
        payload.insert(key, value);
    }

    Envelope {
        id,
        kind: MessageType::Command,
        source: SOURCE.to_string(),
        target: target.to_string(),
        timestamp,
        payload,
        correlation_id: None,
    }
}

pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, ConnectorError> {
    serde_json::to_vec(envelope)
        .map_err(|e| ConnectorError::Protocol(format!("cannot serialize envelope: {e}")))
}

/// Parse a reply frame and check it is a `response` envelope.
pub fn decode_reply(frame: &[u8]) -> Result<Envelope, ConnectorError> {
    let envelope: Envelope = serde_json::from_slice(frame)
        .map_err(|e| ConnectorError::Protocol(format!("unparsable reply: {e}")))?;
    if envelope.kind != MessageType::Response {
        return Err(ConnectorError::Protocol(format!(
            "expected a response envelope, got '{}'",
            envelope.kind.as_str()
        )));
    }
    Ok(envelope)
}

/// Unwrap the application-level outcome carried in `payload.success`.
pub fn into_payload(envelope: Envelope) -> Result<Map<String, Value>, ConnectorError> {
    if envelope.succeeded() {
        return Ok(envelope.payload);
    }
    let message = envelope.error_message().unwrap_or(UNKNOWN_ERROR).to_string();
    Err(ConnectorError::Application(message))
}
