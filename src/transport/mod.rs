// ABOUTME: Transport module: the duplex socket connection between the chat session and backend.
// ABOUTME: Defines the Connector/Connection seam and the events a connection reports.

pub mod frame;
pub mod socketio;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::chat::events::{ClientEvent, ServerEvent};
use crate::chat::session::SessionEvent;

pub use socketio::SocketIoConnector;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection is closed")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("server rejected connection: {0}")]
    Rejected(String),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

/// Lifecycle signals and inbound events reported by a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    ConnectFailed(String),
    Disconnected(String),
    Event(ServerEvent),
}

/// Where a connection delivers its events. Each sink is stamped with the
/// generation of the connection it belongs to.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::Sender<SessionEvent>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::Sender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event. Returns false once the session has stopped listening.
    pub async fn send(&self, event: TransportEvent) -> bool {
        self.tx
            .send(SessionEvent::Transport {
                generation: self.generation,
                event,
            })
            .await
            .is_ok()
    }
}

/// An open (or opening) duplex connection.
pub trait Connection: Send {
    /// Queue a control message for sending.
    fn emit(&self, event: ClientEvent) -> Result<(), TransportError>;

    /// Close the connection. Calling it again has no effect.
    fn close(&mut self);

    /// Hand over the task driving this connection, if there is one, so the
    /// owner can wait for a requested close to reach the wire.
    fn take_task(&mut self) -> Option<JoinHandle<()>> {
        None
    }
}

/// Opens connections to a socket endpoint.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &str, sink: EventSink) -> Box<dyn Connection>;
}
