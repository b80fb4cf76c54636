// ABOUTME: Keyboard input handling for the TUI: translates key events into chat actions.
// ABOUTME: Plain text is sent as a message; slash commands roll dice, end, reconnect, or quit.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::chat::Die;
use crate::tui::state::ViewState;

const SCROLL_PAGE: u16 = 10;

pub const HELP_TEXT: &str = "/roll [d4|d6|d8|d10|d12|d20|d100]  /end  /reconnect  /quit";

/// The result of processing a key event.
#[derive(Debug, PartialEq)]
pub enum InputAction {
    None,
    Send(String),
    Roll(Die),
    EndSession,
    Reconnect,
    Quit,
}

/// Process a key event against the view state and return the resulting action.
pub fn handle_key(state: &mut ViewState, key: KeyEvent) -> InputAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return InputAction::Quit;
    }

    match key.code {
        KeyCode::PageUp => {
            state.scroll_offset = state.scroll_offset.saturating_add(SCROLL_PAGE);
            InputAction::None
        }
        KeyCode::PageDown => {
            state.scroll_offset = state.scroll_offset.saturating_sub(SCROLL_PAGE);
            InputAction::None
        }
        KeyCode::Up => {
            state.scroll_offset = state.scroll_offset.saturating_add(1);
            InputAction::None
        }
        KeyCode::Down => {
            state.scroll_offset = state.scroll_offset.saturating_sub(1);
            InputAction::None
        }
        KeyCode::Enter => match state.submit_input() {
            Some(text) => {
                state.scroll_offset = 0;
                interpret_submission(state, &text)
            }
            None => InputAction::None,
        },
        KeyCode::Char(c) => {
            state.insert_char_at_cursor(c);
            InputAction::None
        }
        KeyCode::Backspace => {
            state.backspace_char();
            InputAction::None
        }
        KeyCode::Delete => {
            state.delete_char_at_cursor();
            InputAction::None
        }
        KeyCode::Left => {
            state.move_cursor_left();
            InputAction::None
        }
        KeyCode::Right => {
            state.move_cursor_right();
            InputAction::None
        }
        KeyCode::Home => {
            state.move_cursor_home();
            InputAction::None
        }
        KeyCode::End => {
            state.move_cursor_end();
            InputAction::None
        }
        KeyCode::Esc => InputAction::Quit,
        _ => InputAction::None,
    }
}

/// Turn submitted text into an action. Bad commands set a notice instead.
fn interpret_submission(state: &mut ViewState, text: &str) -> InputAction {
    if !text.starts_with('/') {
        return InputAction::Send(text.to_string());
    }
    match parse_command(text) {
        Ok(action) => action,
        Err(notice) => {
            state.set_notice(notice);
            InputAction::None
        }
    }
}

/// Parse a slash command.
pub fn parse_command(text: &str) -> Result<InputAction, String> {
    let mut parts = text.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();
    match command {
        "/roll" => {
            let die = arg.unwrap_or("d20");
            die.parse::<Die>()
                .map(InputAction::Roll)
                .map_err(|_| "Invalid die type.".to_string())
        }
        "/end" => Ok(InputAction::EndSession),
        "/reconnect" => Ok(InputAction::Reconnect),
        "/quit" | "/exit" => Ok(InputAction::Quit),
        "/help" => Err(HELP_TEXT.to_string()),
        other => Err(format!("Unknown command {other}. {HELP_TEXT}")),
    }
}
