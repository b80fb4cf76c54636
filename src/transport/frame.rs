// ABOUTME: Engine.IO v4 and Socket.IO v5 packet codec over websocket text frames.
// ABOUTME: Decodes handshake, heartbeat, and event packets; encodes connect, pong, and emits.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Socket.IO connect request for the default namespace.
pub const SOCKET_CONNECT: &str = "40";
/// Socket.IO disconnect for the default namespace.
pub const SOCKET_DISCONNECT: &str = "41";
/// Engine.IO heartbeat reply.
pub const ENGINE_PONG: &str = "3";

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine.io packet type '{0}'")]
    UnknownEngineType(char),
    #[error("unknown socket.io packet type '{0}'")]
    UnknownSocketType(char),
    #[error("malformed handshake: {0}")]
    Handshake(String),
    #[error("malformed packet data: {0}")]
    Data(String),
}

/// Parameters the server announces in its Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    /// Socket.IO payload carried inside an Engine.IO message packet.
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, FrameError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(FrameError::Empty)?;
        let body = chars.as_str();
        match kind {
            '0' => serde_json::from_str(body)
                .map(Self::Open)
                .map_err(|e| FrameError::Handshake(e.to_string())),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(body.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(FrameError::UnknownEngineType(other)),
        }
    }
}

/// One Socket.IO packet (the body of an Engine.IO message).
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        namespace: Option<String>,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack,
    ConnectError(String),
    /// Binary events carry attachments in separate frames; they are not used by the backend.
    Binary,
}

impl SocketPacket {
    pub fn decode(body: &str) -> Result<Self, FrameError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(FrameError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => {
                let (_, data) = split_header(rest);
                if data.is_empty() {
                    Ok(Self::Connect(None))
                } else {
                    parse_json(data).map(|v| Self::Connect(Some(v)))
                }
            }
            '1' => Ok(Self::Disconnect),
            '2' => {
                let (header, data) = split_header(rest);
                let value = parse_json(data)?;
                let Value::Array(mut items) = value else {
                    return Err(FrameError::Data("event payload is not an array".to_string()));
                };
                if items.is_empty() {
                    return Err(FrameError::Data("event array is empty".to_string()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(FrameError::Data(format!("event name is not a string: {other}")));
                    }
                };
                Ok(Self::Event {
                    namespace: header.namespace,
                    ack_id: header.ack_id,
                    name,
                    args: items,
                })
            }
            '3' => Ok(Self::Ack),
            '4' => {
                let (_, data) = split_header(rest);
                let message = match parse_json(data) {
                    Ok(Value::Object(obj)) => obj
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string(),
                    Ok(Value::String(s)) => s,
                    _ => data.to_string(),
                };
                Ok(Self::ConnectError(message))
            }
            '5' | '6' => Ok(Self::Binary),
            other => Err(FrameError::UnknownSocketType(other)),
        }
    }
}

struct Header {
    namespace: Option<String>,
    ack_id: Option<u64>,
}

/// Split `[/namespace,][ackid]json` into its header fields and the JSON data.
fn split_header(rest: &str) -> (Header, &str) {
    let mut rest = rest;
    let mut namespace = None;
    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => {
                namespace = Some(rest[..idx].to_string());
                rest = &rest[idx + 1..];
            }
            None => {
                return (
                    Header {
                        namespace: Some(rest.to_string()),
                        ack_id: None,
                    },
                    "",
                );
            }
        }
    }
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let ack_id = if digits > 0 {
        rest[..digits].parse().ok()
    } else {
        None
    };
    (Header { namespace, ack_id }, &rest[digits..])
}

fn parse_json(data: &str) -> Result<Value, FrameError> {
    serde_json::from_str(data).map_err(|e| FrameError::Data(e.to_string()))
}

/// Encode an event emit for the default namespace: `42["name",payload]`.
pub fn encode_event(name: &str, payload: &Value) -> String {
    let array = Value::Array(vec![Value::String(name.to_string()), payload.clone()]);
    format!("42{array}")
}
