// ABOUTME: App orchestrator: wires the REST backend, socket connector, chat session, and TUI.
// ABOUTME: Runs the single-threaded event loop that applies key presses and session events in order.

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind,
};
use crossterm::execute;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::{Backend, HttpBackend, resolve_world_id};
use crate::chat::{SessionContext, SessionEvent, SessionParams, StreamingChatSession};
use crate::config::{Config, ResolvedSession};
use crate::transport::SocketIoConnector;
use crate::tui::input::{self, InputAction};
use crate::tui::state::ViewState;
use crate::tui::ui::{self, Screen};

/// Capacity of the queue feeding the session from transport and lookup tasks.
const EVENT_QUEUE: usize = 64;
/// Redraw interval so the elapsed clock and notice expiry stay current.
const TICK: Duration = Duration::from_millis(500);
/// How long to wait for the socket to send its close on exit.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Top-level application.
pub struct App {
    config: Config,
    session: ResolvedSession,
}

impl App {
    pub fn new(config: Config, session: ResolvedSession) -> Self {
        Self { config, session }
    }

    /// Run the application: resolve the session context, open the chat, and drive the TUI.
    pub async fn run(self) -> anyhow::Result<()> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(self.session.server.clone()));

        let world_id = match self.session.world_id {
            Some(id) => id,
            None => resolve_world_id(backend.as_ref(), self.session.campaign_id).await,
        };
        let context = SessionContext {
            server: self.session.server.clone(),
            campaign_id: self.session.campaign_id,
            session_id: self.session.session_id,
            world_id,
            player_id: self.session.player_id,
        };
        info!(
            server = %context.server,
            campaign_id = context.campaign_id,
            session_id = ?context.session_id,
            world_id,
            player_id = context.player_id,
            "starting chat"
        );

        let (tx, mut rx) = mpsc::channel::<SessionEvent>(EVENT_QUEUE);
        let connector = Arc::new(SocketIoConnector::new(Duration::from_secs(
            self.config.server.connect_timeout_seconds,
        )));
        let mut session = StreamingChatSession::open(SessionParams {
            context,
            socket_path: self.config.server.socket_path.clone(),
            connector,
            backend,
            events: tx,
        });

        let mut view = ViewState::new();
        let mut terminal = ratatui::init();
        if let Err(e) = execute!(stdout(), EnableBracketedPaste) {
            warn!(error = %e, "bracketed paste unavailable");
        }

        let result = run_loop(&mut terminal, &mut view, &mut session, &mut rx).await;

        session.shutdown(CLOSE_GRACE).await;
        let _ = execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();

        print_exit_screen(&view, &session);
        result
    }
}

async fn run_loop(
    terminal: &mut DefaultTerminal,
    view: &mut ViewState,
    session: &mut StreamingChatSession,
    rx: &mut mpsc::Receiver<SessionEvent>,
) -> anyhow::Result<()> {
    let mut terminal_events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        terminal.draw(|frame| ui::render(frame, view, &Screen::of(session)))?;

        tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let action = input::handle_key(view, key);
                    if !dispatch(action, view, session) {
                        break;
                    }
                }
                Some(Ok(Event::Paste(text))) => view.insert_str_at_cursor(&text),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = rx.recv() => session.update(event),
            _ = tick.tick() => {}
        }
    }

    Ok(())
}

/// Apply an input action to the session. Returns false when the app should quit.
pub fn dispatch(
    action: InputAction,
    view: &mut ViewState,
    session: &mut StreamingChatSession,
) -> bool {
    match action {
        InputAction::None => {}
        InputAction::Send(text) => {
            session.send_message(&text);
        }
        InputAction::Roll(die) => {
            session.roll(die);
        }
        InputAction::EndSession => session.end_session(),
        InputAction::Reconnect => {
            view.set_notice("Reconnecting...");
            session.reconnect();
        }
        InputAction::Quit => return false,
    }
    true
}

/// Print a farewell screen after the TUI exits.
fn print_exit_screen(view: &ViewState, session: &StreamingChatSession) {
    let elapsed_secs = view.session_start.elapsed().as_secs();
    let elapsed = if elapsed_secs >= 3600 {
        format!("{}h {:02}m", elapsed_secs / 3600, (elapsed_secs % 3600) / 60)
    } else {
        format!("{}m {:02}s", elapsed_secs / 60, elapsed_secs % 60)
    };
    let entries = session.log().len();

    println!();
    println!("  \u{1f3b2} \x1b[1mThanks for playing!\x1b[0m");
    println!();
    println!("  \u{1f550} Session lasted {elapsed} with {entries} log entries.");
    if let Some((die, n)) = session.last_roll() {
        println!("  \u{2728} Your last roll was {n} on a {die}.");
    }
    println!();
}
