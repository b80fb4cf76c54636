// ABOUTME: Status bar widget: connection state, session identifiers, last roll, notices.
// ABOUTME: Displayed at the bottom of the TUI as a single-line summary.

use std::time::{Duration, Instant};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::chat::{ConnectionState, Die};

pub struct StatusBarParams<'a> {
    pub server: &'a str,
    pub state: ConnectionState,
    pub campaign_id: i64,
    pub session_id: Option<i64>,
    pub player_id: i64,
    pub last_roll: Option<(Die, u32)>,
    pub streaming: bool,
    pub notice: Option<&'a str>,
    pub session_start: Instant,
}

/// Render the status bar line.
pub fn status_line(params: &StatusBarParams) -> Line<'static> {
    let dim = Style::default().fg(Color::DarkGray);
    let white = Style::default().fg(Color::White);

    let (label, color) = match params.state {
        ConnectionState::Connected => ("● connected", Color::Green),
        ConnectionState::Connecting => ("◌ connecting", Color::Yellow),
        ConnectionState::Disconnected => ("○ offline", Color::Red),
    };

    let session = match params.session_id {
        Some(id) => format!("session {id} "),
        None => "no session ".to_string(),
    };

    let mut spans = vec![
        Span::styled(format!(" {label} "), Style::default().fg(color)),
        Span::styled("| ", dim),
        Span::styled(format!("{} ", params.server), Style::default().fg(Color::Cyan)),
        Span::styled("| ", dim),
        Span::styled(format!("campaign {} ", params.campaign_id), white),
        Span::styled(session, white),
        Span::styled(format!("player {} ", params.player_id), white),
        Span::styled("| ", dim),
        Span::styled(
            format!("{} ", format_elapsed(params.session_start.elapsed())),
            white,
        ),
    ];

    if let Some((die, n)) = params.last_roll {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            format!("{die}: {n} "),
            Style::default().fg(Color::Yellow),
        ));
    }

    if params.streaming {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            "DM is responding... ",
            Style::default().fg(Color::Cyan),
        ));
    }

    if let Some(notice) = params.notice {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(
            format!("{notice} "),
            Style::default().fg(Color::Magenta),
        ));
    }

    Line::from(spans)
}

/// Format elapsed time as M:SS, or H:MM:SS past an hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
