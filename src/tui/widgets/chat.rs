// ABOUTME: Chat widget: renders chat log entries into styled ratatui Lines.
// ABOUTME: Each entry kind (system, narration, player, DM, roll) has its own styling.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::chat::{ChatLog, EntryKind, LogEntry};

/// Render the whole log into styled Lines for display.
pub fn render_log_lines(log: &ChatLog) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let open = log.open_entry().map(|_| log.len() - 1);

    for (idx, entry) in log.entries().iter().enumerate() {
        // Boundaries only seal a stream; they have no visible body.
        if entry.kind == EntryKind::Boundary {
            continue;
        }
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        render_entry(entry, open == Some(idx), &mut lines);
    }

    lines
}

fn render_entry(entry: &LogEntry, streaming: bool, lines: &mut Vec<Line<'static>>) {
    let body = entry.text.trim_matches('\n');
    match entry.kind {
        EntryKind::Dm => {
            let prefix = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            speaker_lines(body, prefix, Style::default(), lines);
            if streaming && let Some(last) = lines.last_mut() {
                last.spans
                    .push(Span::styled("▍", Style::default().fg(Color::Cyan)));
            }
        }
        EntryKind::Player => {
            let prefix = Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD);
            speaker_lines(body, prefix, Style::default(), lines);
        }
        EntryKind::Narration => {
            let style = Style::default().fg(Color::White);
            for text in body.split('\n') {
                lines.push(Line::from(Span::styled(text.to_string(), style)));
            }
        }
        EntryKind::Roll => {
            lines.push(Line::from(Span::styled(
                body.to_string(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        EntryKind::System => {
            let style = Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC);
            for text in body.split('\n') {
                lines.push(Line::from(Span::styled(text.to_string(), style)));
            }
        }
        EntryKind::Boundary => {}
    }
}

/// "Name: text" entries: the name gets the prefix style on the first line.
fn speaker_lines(body: &str, prefix: Style, rest: Style, lines: &mut Vec<Line<'static>>) {
    for (i, text) in body.split('\n').enumerate() {
        let split = if i == 0 { text.split_once(": ") } else { None };
        match split {
            Some((name, message)) => lines.push(Line::from(vec![
                Span::styled(format!("{name}: "), prefix),
                Span::styled(message.to_string(), rest),
            ])),
            None => lines.push(Line::from(Span::styled(text.to_string(), rest))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn dm_entry_has_cyan_prefix() {
        let mut log = ChatLog::new();
        log.start_response();
        log.append_chunk("The door creaks.");
        log.end_response();
        let lines = render_log_lines(&log);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[0].content, "DM: ");
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Cyan));
        assert_eq!(line_text(&lines[0]), "DM: The door creaks.");
    }

    #[test]
    fn open_response_shows_cursor() {
        let mut log = ChatLog::new();
        log.start_response();
        log.append_chunk("Roll for");
        let lines = render_log_lines(&log);
        assert_eq!(line_text(&lines[0]), "DM: Roll for▍");
    }

    #[test]
    fn player_entry_has_green_name() {
        let mut log = ChatLog::new();
        log.push_line(EntryKind::Player, "\nAria: I draw my sword\n");
        let lines = render_log_lines(&log);
        assert_eq!(lines[0].spans[0].content, "Aria: ");
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Green));
        assert_eq!(lines[0].spans[1].content, "I draw my sword");
    }

    #[test]
    fn entries_are_separated_by_blank_lines() {
        let mut log = ChatLog::new();
        log.push_line(EntryKind::System, "Connected to the server via SocketIO.");
        log.push_message(None, "Rain falls on the village.");
        let lines = render_log_lines(&log);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "");
        assert_eq!(line_text(&lines[2]), "Rain falls on the village.");
    }

    #[test]
    fn multiline_system_entry() {
        let mut log = ChatLog::new();
        log.push_line(EntryKind::System, "Recap:\nThe party rested.");
        let lines = render_log_lines(&log);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::DarkGray));
    }

    #[test]
    fn boundary_entries_are_not_rendered() {
        let mut log = ChatLog::new();
        log.start_response();
        log.end_response();
        assert_eq!(render_log_lines(&log).len(), 1);
    }
}
