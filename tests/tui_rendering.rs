// ABOUTME: E2E tests for TUI rendering using ratatui's TestBackend.
// ABOUTME: Verifies the chat log, streaming indicator, status bar, scrolling, and cursor.

use ratatui::Terminal;
use ratatui::backend::TestBackend;

use aidm::address::ServerAddress;
use aidm::chat::{ChatLog, ConnectionState, Die, EntryKind, SessionContext};
use aidm::tui::state::ViewState;
use aidm::tui::ui::{self, Screen};

/// Extract a single row of text from the terminal buffer as a String.
fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
    let buf = terminal.backend().buffer();
    let width = buf.area.width;
    (0..width)
        .map(|x| {
            buf.cell((x, y))
                .map(|c| c.symbol().chars().next().unwrap_or(' '))
                .unwrap_or(' ')
        })
        .collect()
}

/// Extract all text from the terminal buffer as a single string (rows joined by newlines).
fn all_text(terminal: &Terminal<TestBackend>) -> String {
    let buf = terminal.backend().buffer();
    let height = buf.area.height;
    (0..height)
        .map(|y| row_text(terminal, y))
        .collect::<Vec<_>>()
        .join("\n")
}

fn context() -> SessionContext {
    SessionContext {
        server: ServerAddress::parse("http://localhost:5000").unwrap(),
        campaign_id: 2,
        session_id: Some(9),
        world_id: 4,
        player_id: 7,
    }
}

fn draw(
    terminal: &mut Terminal<TestBackend>,
    view: &mut ViewState,
    log: &ChatLog,
    state: ConnectionState,
    last_roll: Option<(Die, u32)>,
) {
    let context = context();
    let screen = Screen {
        log,
        state,
        context: &context,
        last_roll,
    };
    terminal
        .draw(|frame| ui::render(frame, view, &screen))
        .unwrap();
}

#[test]
fn renders_empty_screen_with_header() {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    let mut view = ViewState::new();

    draw(&mut terminal, &mut view, &ChatLog::new(), ConnectionState::Connecting, None);

    let header = row_text(&terminal, 0);
    assert!(header.contains("aidm"), "header should name the app, got: {header:?}");
    assert!(header.contains("campaign 2"), "got: {header:?}");
    let status = row_text(&terminal, 23);
    assert!(status.contains("connecting"), "got: {status:?}");
}

#[test]
fn renders_streamed_response_and_player_message() {
    let mut terminal = Terminal::new(TestBackend::new(120, 24)).unwrap();
    let mut view = ViewState::new();

    let mut log = ChatLog::new();
    log.push_line(EntryKind::System, "Connected to the server via SocketIO.");
    log.push_line(EntryKind::Player, "\nAria: I light a torch\n");
    log.start_response();
    log.append_chunk("Shadows ");
    log.append_chunk("retreat.");

    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);

    let text = all_text(&terminal);
    assert!(text.contains("Connected to the server via SocketIO."), "got:\n{text}");
    assert!(text.contains("Aria: I light a torch"), "got:\n{text}");
    assert!(text.contains("DM: Shadows retreat."), "got:\n{text}");
    assert!(text.contains("DM is responding..."), "got:\n{text}");

    log.end_response();
    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);
    let text = all_text(&terminal);
    assert!(!text.contains("DM is responding..."), "got:\n{text}");
}

#[test]
fn renders_status_bar_with_roll_and_notice() {
    let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
    let mut view = ViewState::new();
    view.set_notice("Invalid die type.");

    let mut log = ChatLog::new();
    log.push_line(EntryKind::Roll, "\u{1f3b2} Roll d20: 14\n");

    draw(
        &mut terminal,
        &mut view,
        &log,
        ConnectionState::Connected,
        Some((Die::D20, 14)),
    );

    let status = row_text(&terminal, 19);
    assert!(status.contains("connected"), "got: {status:?}");
    assert!(status.contains("session 9"), "got: {status:?}");
    assert!(status.contains("d20: 14"), "got: {status:?}");
    assert!(status.contains("Invalid die type."), "got: {status:?}");
    assert!(all_text(&terminal).contains("Roll d20: 14"));
}

/// Wrapped chat lines should contribute to scroll bounds so long responses
/// don't appear clipped by the input area.
#[test]
fn scroll_clamp_accounts_for_wrapped_chat_height() {
    let mut terminal = Terminal::new(TestBackend::new(24, 10)).unwrap();
    let mut view = ViewState::new();

    let mut log = ChatLog::new();
    log.start_response();
    log.append_chunk("alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi rho sigma tau upsilon phi chi psi omega");
    log.end_response();
    view.scroll_offset = 100;

    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);

    assert!(
        view.scroll_offset > 0 && view.scroll_offset < 100,
        "scroll offset should clamp to the wrapped content, got {}",
        view.scroll_offset,
    );
}

/// With scroll_offset at 0, streamed chunks keep the viewport pinned to the newest text.
#[test]
fn auto_scroll_stays_pinned_to_bottom_while_streaming() {
    let mut terminal = Terminal::new(TestBackend::new(24, 10)).unwrap();
    let mut view = ViewState::new();

    let mut log = ChatLog::new();
    log.start_response();
    log.append_chunk("line1\nline2\nline3\nline4");
    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);

    log.append_chunk("\nline5\nline6\nline7\nline8");
    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);

    let text = all_text(&terminal);
    assert!(text.contains("line8"), "viewport should include newest content, got:\n{text}");
    assert!(!text.contains("line1"), "viewport should have scrolled past oldest content, got:\n{text}");
}

/// Cursor should be clamped to the input viewport when the input text exceeds available width.
#[test]
fn cursor_is_clamped_inside_input_viewport_for_long_input() {
    let mut terminal = Terminal::new(TestBackend::new(12, 8)).unwrap();
    let mut view = ViewState::new();
    view.input = "abcdefghijklmnopqrstuvwxyz".to_string();
    view.cursor_pos = view.input.chars().count();

    draw(&mut terminal, &mut view, &ChatLog::new(), ConnectionState::Connected, None);

    let cursor = terminal.get_cursor_position().unwrap();
    assert!(cursor.x < 12, "cursor x should stay within terminal width, got {cursor:?}");
    assert_eq!(cursor.y, 5, "cursor should sit on the input line");
}

/// Sessions longer than u16::MAX wrapped lines still scroll from the bottom.
#[test]
fn very_long_logs_saturate_scroll_bounds() {
    let mut terminal = Terminal::new(TestBackend::new(24, 10)).unwrap();
    let mut view = ViewState::new();

    let mut log = ChatLog::new();
    for i in 0..34_000 {
        log.push_line(EntryKind::Narration, format!("n{i}"));
    }
    view.scroll_offset = u16::MAX;

    draw(&mut terminal, &mut view, &log, ConnectionState::Connected, None);

    assert!(
        view.scroll_offset > 60_000,
        "scroll offset should clamp near u16::MAX, got {}",
        view.scroll_offset,
    );
}
