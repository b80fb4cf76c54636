// ABOUTME: Main TUI rendering function: assembles header, chat log, input, and status bar.
// ABOUTME: Splits the terminal frame into vertical layout chunks and delegates to widgets.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::chat::{ChatLog, ConnectionState, Die, SessionContext, StreamingChatSession};
use crate::tui::state::ViewState;
use crate::tui::widgets::chat::render_log_lines;
use crate::tui::widgets::status::{StatusBarParams, status_line};

/// Read-only snapshot of what the screen shows from the session.
pub struct Screen<'a> {
    pub log: &'a ChatLog,
    pub state: ConnectionState,
    pub context: &'a SessionContext,
    pub last_roll: Option<(Die, u32)>,
}

impl<'a> Screen<'a> {
    pub fn of(session: &'a StreamingChatSession) -> Self {
        Self {
            log: session.log(),
            state: session.state(),
            context: session.context(),
            last_roll: session.last_roll(),
        }
    }
}

/// Render the full TUI screen layout to the given frame.
pub fn render(frame: &mut Frame, view: &mut ViewState, screen: &Screen) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Chat area
            Constraint::Length(3), // Input area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let header = Line::from(vec![
        Span::styled(
            " aidm",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  campaign {} · world {}", screen.context.campaign_id, screen.context.world_id),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let chat_chunk = chunks[1];
    let visible_height = chat_chunk.height;

    // line_count() matches ratatui's own wrapping, so the bottom of the log
    // is never hidden by a scroll miscalculation.
    let chat_paragraph = Paragraph::new(render_log_lines(screen.log)).wrap(Wrap { trim: false });
    let total_lines = u16::try_from(chat_paragraph.line_count(chat_chunk.width)).unwrap_or(u16::MAX);
    let max_scroll = total_lines.saturating_sub(visible_height);

    if view.scroll_offset > max_scroll {
        view.scroll_offset = max_scroll;
    }

    // scroll_offset counts lines up from the bottom (0 = at bottom)
    let scroll = max_scroll.saturating_sub(view.scroll_offset);
    frame.render_widget(chat_paragraph.scroll((scroll, 0)), chat_chunk);

    let input_chunk = chunks[2];
    let border_style = match screen.state {
        ConnectionState::Connected => Style::default(),
        _ => Style::default().fg(Color::DarkGray),
    };
    let mut input_block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(border_style);
    if view.scroll_offset > 0 {
        input_block = input_block.title(Span::styled(
            format!(" scrolled up {} ", view.scroll_offset),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let input = Paragraph::new(Span::raw(view.input.clone())).block(input_block);
    frame.render_widget(input, input_chunk);

    if input_chunk.width > 0 && input_chunk.height > 1 {
        view.clamp_cursor();
        let prefix: String = view.input.chars().take(view.cursor_pos).collect();
        let visual_col = UnicodeWidthStr::width(prefix.as_str());
        let max_visual_col = input_chunk.width.saturating_sub(1) as usize;

        let cursor_x = input_chunk
            .x
            .saturating_add(visual_col.min(max_visual_col) as u16);
        // +1 for the top border
        let cursor_y = input_chunk.y.saturating_add(1);
        frame.set_cursor_position(Position::new(cursor_x, cursor_y));
    }

    let server = screen.context.server.to_string();
    let status = status_line(&StatusBarParams {
        server: &server,
        state: screen.state,
        campaign_id: screen.context.campaign_id,
        session_id: screen.context.session_id,
        player_id: screen.context.player_id,
        last_roll: screen.last_roll,
        streaming: screen.log.open_entry().is_some(),
        notice: view.active_notice(),
        session_start: view.session_start,
    });
    frame.render_widget(Paragraph::new(status), chunks[3]);
}
