// ABOUTME: Append-only chat log with open/terminated entries for streamed responses.
// ABOUTME: Implements the merge primitive and the start/chunk/end stream framing rules.

use tracing::warn;

/// Prefix that opens every streamed Dungeon Master response.
pub const DM_PREFIX: &str = "\nDM: ";

/// Presentation hint for an entry. Does not take part in merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    System,
    Narration,
    Player,
    Dm,
    /// Closing boundary written when a streamed response ends.
    Boundary,
    Roll,
}

/// One logical message unit of the chat log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub text: String,
    /// Whether the entry is closed. An unterminated entry at the tail receives appends.
    pub terminated: bool,
}

/// Ordered, append-only sequence of entries.
#[derive(Debug, Default, Clone)]
pub struct ChatLog {
    entries: Vec<LogEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry currently open for appending: the tail, if unterminated.
    pub fn open_entry(&self) -> Option<&LogEntry> {
        self.entries.last().filter(|e| !e.terminated)
    }

    /// Merge primitive. Unterminated text is concatenated onto the open entry
    /// when there is one; anything else becomes a new entry.
    pub fn append(&mut self, kind: EntryKind, text: &str, terminated: bool) {
        if !terminated
            && let Some(last) = self.entries.last_mut()
            && !last.terminated
        {
            last.text.push_str(text);
            return;
        }
        self.push(kind, text.to_string(), terminated);
    }

    /// Append a closed, standalone entry.
    pub fn push_line(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.push(kind, text.into(), true);
    }

    fn push(&mut self, kind: EntryKind, text: String, terminated: bool) {
        self.entries.push(LogEntry {
            kind,
            text,
            terminated,
        });
    }

    /// `response_start`: open a new DM entry.
    pub fn start_response(&mut self) {
        self.push(EntryKind::Dm, DM_PREFIX.to_string(), false);
    }

    /// `response_chunk`: extend the open entry. With no open entry (the start
    /// frame was lost, or another entry landed mid-stream) a fresh DM entry is
    /// opened so the chunk never lands in an unrelated message.
    pub fn append_chunk(&mut self, chunk: &str) {
        if self.open_entry().is_none() {
            warn!("chunk arrived with no open response; opening a new one");
            self.push(EntryKind::Dm, format!("{DM_PREFIX}{chunk}"), false);
            return;
        }
        self.append(EntryKind::Dm, chunk, false);
    }

    /// `response_end`: seal the stream with a closing boundary entry. The
    /// streamed text itself is left unchanged. Dropped when nothing is open.
    pub fn end_response(&mut self) {
        if self.open_entry().is_none() {
            warn!("response end arrived with no open response; ignoring");
            return;
        }
        self.push(EntryKind::Boundary, "\n".to_string(), true);
    }

    /// `new_message`: narration or a message from another participant.
    pub fn push_message(&mut self, speaker: Option<&str>, message: &str) {
        let text = match speaker {
            Some(speaker) if !speaker.is_empty() => format!("\n{speaker}: {message}\n"),
            _ => format!("\n{message}\n"),
        };
        self.push_line(EntryKind::Narration, text);
    }
}
