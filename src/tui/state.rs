// ABOUTME: TUI view state: input buffer, cursor, scroll position, and transient notices.
// ABOUTME: Presentation-only; the chat log and connection live in the StreamingChatSession.

use std::time::{Duration, Instant};

/// How long a status-bar notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// A short message shown in the status bar (e.g. "Invalid die type.").
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub shown_at: Instant,
}

/// Full view state of the chat screen.
pub struct ViewState {
    pub input: String,
    pub cursor_pos: usize,
    /// Lines scrolled up from the bottom (0 = pinned to bottom).
    pub scroll_offset: u16,
    pub notice: Option<Notice>,
    pub session_start: Instant,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            notice: None,
            session_start: Instant::now(),
        }
    }

    /// Show a transient notice in the status bar.
    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    /// The notice text, if it has not expired yet.
    pub fn active_notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| n.shown_at.elapsed() < NOTICE_TTL)
            .map(|n| n.text.as_str())
    }

    /// Submit the current input buffer. Returns the trimmed text if non-empty.
    pub fn submit_input(&mut self) -> Option<String> {
        let trimmed = self.input.trim().to_string();
        if trimmed.is_empty() {
            return None;
        }
        self.input.clear();
        self.cursor_pos = 0;
        Some(trimmed)
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor_pos = self.cursor_pos.min(self.input_char_len());
    }

    pub fn cursor_byte_index(&self) -> usize {
        char_index_to_byte_index(&self.input, self.cursor_pos)
    }

    pub fn input_char_len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char_at_cursor(&mut self, c: char) {
        self.clamp_cursor();
        let byte_index = self.cursor_byte_index();
        self.input.insert(byte_index, c);
        self.cursor_pos += 1;
    }

    /// Insert a pasted string at the cursor. Newlines are flattened to spaces
    /// because a chat message is a single line.
    pub fn insert_str_at_cursor(&mut self, text: &str) {
        for c in text.chars() {
            let c = if c == '\n' || c == '\r' { ' ' } else { c };
            self.insert_char_at_cursor(c);
        }
    }

    pub fn backspace_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos == 0 {
            return;
        }

        let end = self.cursor_byte_index();
        let start = char_index_to_byte_index(&self.input, self.cursor_pos - 1);
        self.input.replace_range(start..end, "");
        self.cursor_pos -= 1;
    }

    pub fn delete_char_at_cursor(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos >= self.input_char_len() {
            return;
        }

        let start = self.cursor_byte_index();
        let end = char_index_to_byte_index(&self.input, self.cursor_pos + 1);
        self.input.replace_range(start..end, "");
    }

    pub fn move_cursor_left(&mut self) {
        self.clamp_cursor();
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.clamp_cursor();
        if self.cursor_pos < self.input_char_len() {
            self.cursor_pos += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_pos = self.input_char_len();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }
}

fn char_index_to_byte_index(s: &str, char_index: usize) -> usize {
    if char_index == 0 {
        return 0;
    }

    match s.char_indices().nth(char_index) {
        Some((idx, _)) => idx,
        None => s.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty() {
        let state = ViewState::new();
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
        assert_eq!(state.scroll_offset, 0);
        assert!(state.active_notice().is_none());
    }

    #[test]
    fn submit_input_clears_buffer() {
        let mut state = ViewState::new();
        state.input = "  I search the room  ".to_string();
        state.cursor_pos = 10;
        assert_eq!(state.submit_input(), Some("I search the room".to_string()));
        assert_eq!(state.input, "");
        assert_eq!(state.cursor_pos, 0);
    }

    #[test]
    fn submit_blank_input_keeps_buffer() {
        let mut state = ViewState::new();
        state.input = "   ".to_string();
        assert_eq!(state.submit_input(), None);
        assert_eq!(state.input, "   ");
    }

    #[test]
    fn utf8_input_editing_is_safe() {
        let mut state = ViewState::new();
        state.insert_char_at_cursor('a');
        state.insert_char_at_cursor('🐉');
        state.insert_char_at_cursor('é');
        assert_eq!(state.input, "a🐉é");
        assert_eq!(state.cursor_pos, 3);

        state.move_cursor_left();
        state.backspace_char();
        assert_eq!(state.input, "aé");
        assert_eq!(state.cursor_pos, 1);

        state.delete_char_at_cursor();
        assert_eq!(state.input, "a");
        assert_eq!(state.cursor_pos, 1);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut state = ViewState::new();
        state.insert_str_at_cursor("draw\nsword");
        assert_eq!(state.input, "draw sword");
        assert_eq!(state.cursor_pos, 10);
    }

    #[test]
    fn notice_is_visible_until_expired() {
        let mut state = ViewState::new();
        state.set_notice("Invalid die type.");
        assert_eq!(state.active_notice(), Some("Invalid die type."));

        if let Some(notice) = state.notice.as_mut() {
            notice.shown_at = Instant::now() - NOTICE_TTL - Duration::from_millis(1);
        }
        assert!(state.active_notice().is_none());
    }
}
