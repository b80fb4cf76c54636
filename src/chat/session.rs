// ABOUTME: StreamingChatSession: owns one socket connection and the chat log it feeds.
// ABOUTME: Applies queued transport/lookup events in order and routes user intents.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::address::ServerAddress;
use crate::api::Backend;
use crate::chat::dice::Die;
use crate::chat::events::{ClientEvent, OutgoingMessage, ServerEvent};
use crate::chat::log::{ChatLog, EntryKind};
use crate::transport::{Connection, Connector, EventSink, TransportEvent};

pub const CONNECTED_TEXT: &str = "Connected to the server via SocketIO.";
pub const DISCONNECTED_TEXT: &str = "Disconnected from the server.";
pub const NOT_CONNECTED_TEXT: &str = "Not connected to SocketIO server.";
pub const NO_SESSION_TEXT: &str = "No session to end.";
pub const SESSION_ENDED_BANNER: &str = "----- SESSION ENDED -----";
pub const NO_RECAP_TEXT: &str = "No recap.";
pub const UNKNOWN_PLAYER: &str = "Unknown Player";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Identifiers scoping one chat interaction. Fixed for the life of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub server: ServerAddress,
    pub campaign_id: i64,
    pub session_id: Option<i64>,
    pub world_id: i64,
    pub player_id: i64,
}

/// Everything queued to a session: transport signals and completions of
/// outbound calls. Applied one at a time by `StreamingChatSession::update`.
#[derive(Debug)]
pub enum SessionEvent {
    Transport {
        generation: u64,
        event: TransportEvent,
    },
    /// The sender's display name was resolved for a submitted message.
    MessageReady {
        name: String,
        text: String,
    },
    /// Outcome of the end-session call: the recap, or an error description.
    SessionEnded(Result<Option<String>, String>),
}

pub struct SessionParams {
    pub context: SessionContext,
    pub socket_path: String,
    pub connector: Arc<dyn Connector>,
    pub backend: Arc<dyn Backend>,
    pub events: mpsc::Sender<SessionEvent>,
}

pub struct StreamingChatSession {
    context: SessionContext,
    endpoint: String,
    log: ChatLog,
    state: ConnectionState,
    connection: Option<Box<dyn Connection>>,
    generation: u64,
    connector: Arc<dyn Connector>,
    backend: Arc<dyn Backend>,
    events: mpsc::Sender<SessionEvent>,
    tasks: JoinSet<()>,
    closing: Option<JoinHandle<()>>,
    last_roll: Option<(Die, u32)>,
    disposed: bool,
}

impl StreamingChatSession {
    /// Create the session and open its connection.
    pub fn open(params: SessionParams) -> Self {
        let endpoint = params.context.server.socket_url(&params.socket_path);
        let mut session = Self {
            context: params.context,
            endpoint,
            log: ChatLog::new(),
            state: ConnectionState::Disconnected,
            connection: None,
            generation: 0,
            connector: params.connector,
            backend: params.backend,
            events: params.events,
            tasks: JoinSet::new(),
            closing: None,
            last_roll: None,
            disposed: false,
        };
        session.connect();
        session
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Generation of the current connection; bumps on every (re)connect.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_roll(&self) -> Option<(Die, u32)> {
        self.last_roll
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn connect(&mut self) {
        self.generation += 1;
        self.state = ConnectionState::Connecting;
        let sink = EventSink::new(self.generation, self.events.clone());
        self.connection = Some(self.connector.connect(&self.endpoint, sink));
    }

    /// Close the current connection and return the task still flushing it.
    fn close_connection(&mut self) -> Option<JoinHandle<()>> {
        let task = self.connection.take().and_then(|mut connection| {
            connection.close();
            connection.take_task()
        });
        self.state = ConnectionState::Disconnected;
        task
    }

    /// Drop the current connection and open a fresh one.
    pub fn reconnect(&mut self) {
        if self.disposed {
            return;
        }
        info!(generation = self.generation, "reconnecting");
        self.close_connection();
        self.connect();
    }

    /// Release the connection and stop all in-flight work. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.tasks.abort_all();
        self.closing = self.close_connection();
        info!("chat session torn down");
    }

    /// Tear down, then give the connection up to `grace` to send its close.
    pub async fn shutdown(&mut self, grace: Duration) {
        self.teardown();
        if let Some(task) = self.closing.take()
            && tokio::time::timeout(grace, task).await.is_err()
        {
            debug!("connection task still running after close");
        }
    }

    /// Apply one queued event to the log and connection state.
    pub fn update(&mut self, event: SessionEvent) {
        if self.disposed {
            debug!(?event, "ignoring event for disposed session");
            return;
        }
        while self.tasks.try_join_next().is_some() {}

        match event {
            SessionEvent::Transport { generation, event } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "ignoring stale connection event");
                    return;
                }
                self.apply_transport(event);
            }
            SessionEvent::MessageReady { name, text } => self.deliver_message(&name, text),
            SessionEvent::SessionEnded(Ok(recap)) => {
                let recap = recap
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| NO_RECAP_TEXT.to_string());
                self.log.push_line(EntryKind::System, SESSION_ENDED_BANNER);
                self.log
                    .push_line(EntryKind::System, format!("Recap:\n{recap}"));
            }
            SessionEvent::SessionEnded(Err(e)) => {
                self.log
                    .push_line(EntryKind::System, format!("Error ending session:\n{e}"));
            }
        }
    }

    fn apply_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.state = ConnectionState::Connected;
                self.log.push_line(EntryKind::System, CONNECTED_TEXT);
                if let Some(session_id) = self.context.session_id
                    && let Err(e) = self.emit(ClientEvent::JoinSession { session_id })
                {
                    warn!(session_id, error = %e, "join_session failed");
                }
            }
            TransportEvent::ConnectFailed(reason) => {
                self.state = ConnectionState::Disconnected;
                self.log
                    .push_line(EntryKind::System, format!("Connection failed: {reason}"));
            }
            TransportEvent::Disconnected(reason) => {
                info!(%reason, "disconnected");
                self.state = ConnectionState::Disconnected;
                self.log.push_line(EntryKind::System, DISCONNECTED_TEXT);
            }
            TransportEvent::Event(event) => self.apply_server_event(event),
        }
    }

    fn apply_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ResponseStart => self.log.start_response(),
            ServerEvent::ResponseChunk { chunk } => self.log.append_chunk(&chunk),
            ServerEvent::ResponseEnd => self.log.end_response(),
            ServerEvent::NewMessage { speaker, message } => {
                self.log.push_message(speaker.as_deref(), &message);
            }
        }
    }

    fn emit(&self, event: ClientEvent) -> Result<(), crate::transport::TransportError> {
        match self.connection.as_ref() {
            Some(connection) => connection.emit(event),
            None => Err(crate::transport::TransportError::Closed),
        }
    }

    /// Send a chat message. Blank input is ignored and returns false. The
    /// sender's name is looked up first; the message lands in the log (and on
    /// the wire) as soon as its own lookup completes.
    pub fn send_message(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.disposed {
            return false;
        }
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let player_id = self.context.player_id;
        let text = text.to_string();
        self.tasks.spawn(async move {
            let name = match backend.player(player_id).await {
                Ok(player) => player
                    .character_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
                Err(e) => {
                    debug!(player_id, error = %e, "player lookup failed");
                    UNKNOWN_PLAYER.to_string()
                }
            };
            let _ = events.send(SessionEvent::MessageReady { name, text }).await;
        });
        true
    }

    fn deliver_message(&mut self, name: &str, text: String) {
        self.log
            .push_line(EntryKind::Player, format!("\n{name}: {text}\n"));

        if self.state != ConnectionState::Connected {
            self.log.push_line(EntryKind::System, NOT_CONNECTED_TEXT);
            return;
        }

        let outgoing = OutgoingMessage {
            session_id: self.context.session_id,
            campaign_id: self.context.campaign_id,
            world_id: self.context.world_id,
            player_id: self.context.player_id,
            message: text,
        };
        if let Err(e) = self.emit(ClientEvent::SendMessage(outgoing)) {
            warn!(error = %e, "send_message failed");
            self.log
                .push_line(EntryKind::System, format!("Failed to send message: {e}"));
        }
    }

    /// End the backend session. The connection stays open.
    pub fn end_session(&mut self) {
        if self.disposed {
            return;
        }
        let Some(session_id) = self.context.session_id else {
            self.log.push_line(EntryKind::System, NO_SESSION_TEXT);
            return;
        };
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.tasks.spawn(async move {
            let result = backend
                .end_session(session_id)
                .await
                .map(|end| end.recap)
                .map_err(|e| e.to_string());
            let _ = events.send(SessionEvent::SessionEnded(result)).await;
        });
    }

    /// Roll a die given by name (`d4`..`d100`). Unknown names leave the log untouched.
    pub fn roll_dice(&mut self, die: &str) -> Option<u32> {
        match die.parse::<Die>() {
            Ok(die) => Some(self.roll(die)),
            Err(e) => {
                debug!(error = %e, "ignoring roll");
                None
            }
        }
    }

    pub fn roll(&mut self, die: Die) -> u32 {
        let result = die.roll();
        self.last_roll = Some((die, result));
        self.log
            .push_line(EntryKind::Roll, format!("\u{1f3b2} Roll {die}: {result}\n"));
        result
    }
}

impl Drop for StreamingChatSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
