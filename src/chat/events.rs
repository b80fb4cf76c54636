// ABOUTME: Typed chat events exchanged with the backend over the socket connection.
// ABOUTME: Maps Socket.IO event names and JSON payloads to ServerEvent / ClientEvent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Events pushed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A Dungeon Master response is starting.
    ResponseStart,
    /// Incremental text of the response in progress.
    ResponseChunk { chunk: String },
    /// The response in progress is complete.
    ResponseEnd,
    /// Out-of-band narration or a message from another participant.
    NewMessage {
        speaker: Option<String>,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("unknown event '{0}'")]
    Unknown(String),
    #[error("malformed payload for '{event}': {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    chunk: Option<String>,
}

#[derive(Deserialize)]
struct NewMessagePayload {
    #[serde(default)]
    speaker: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ServerEvent {
    /// Decode an event from its Socket.IO name and first argument.
    pub fn decode(name: &str, payload: Option<Value>) -> Result<Self, EventDecodeError> {
        let payload = payload.unwrap_or(Value::Null);
        match name {
            "dm_response_start" | "response_start" => Ok(Self::ResponseStart),
            "dm_response_end" | "response_end" => Ok(Self::ResponseEnd),
            "dm_chunk" | "response_chunk" => {
                let parsed: ChunkPayload = from_payload(name, payload)?;
                Ok(Self::ResponseChunk {
                    chunk: parsed.chunk.unwrap_or_default(),
                })
            }
            "new_message" => {
                let parsed: NewMessagePayload = from_payload(name, payload)?;
                Ok(Self::NewMessage {
                    speaker: parsed.speaker.filter(|s| !s.is_empty()),
                    message: parsed.message.unwrap_or_default(),
                })
            }
            other => Err(EventDecodeError::Unknown(other.to_string())),
        }
    }
}

/// A null payload decodes like an empty object, so `dm_chunk` with no data is an empty chunk.
fn from_payload<T: for<'de> Deserialize<'de>>(
    event: &str,
    payload: Value,
) -> Result<T, EventDecodeError> {
    let payload = if payload.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|source| EventDecodeError::Payload {
        event: event.to_string(),
        source,
    })
}

/// Payload of the `send_message` control message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub session_id: Option<i64>,
    pub campaign_id: i64,
    pub world_id: i64,
    pub player_id: i64,
    pub message: String,
}

/// Control messages emitted by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinSession { session_id: i64 },
    SendMessage(OutgoingMessage),
}

impl ClientEvent {
    /// Socket.IO event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinSession { .. } => "join_session",
            Self::SendMessage(_) => "send_message",
        }
    }

    /// JSON argument sent with the event.
    pub fn payload(&self) -> Value {
        match self {
            Self::JoinSession { session_id } => serde_json::json!({ "session_id": session_id }),
            Self::SendMessage(msg) => serde_json::to_value(msg).unwrap_or(Value::Null),
        }
    }
}
