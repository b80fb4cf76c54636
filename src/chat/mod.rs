// ABOUTME: Chat module: the streaming chat session, its log, wire events, and dice.
// ABOUTME: Everything that turns inbound frames and user intents into log mutations.

pub mod dice;
pub mod events;
pub mod log;
pub mod session;

pub use dice::Die;
pub use log::{ChatLog, EntryKind, LogEntry};
pub use session::{
    ConnectionState, SessionContext, SessionEvent, SessionParams, StreamingChatSession,
};
