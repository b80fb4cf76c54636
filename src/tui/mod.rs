// ABOUTME: TUI module: ratatui full-screen interface for aidm.
// ABOUTME: Chat log display, input handling, slash commands, and status bar.

pub mod input;
pub mod state;
pub mod ui;
pub mod widgets;

pub use state::*;
