//! TUI application state and main event loop

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use tokio::time;

use super::backend::{Backend, BackendCommand, BackendResponse};
use super::compose::ComposeState;
use super::emoji::EmojiPickerState;
use super::join::JoinState;
use super::log_capture::LogBuffer;
use super::messages::MessagesState;
use super::ui;
use crate::session::Participant;
use crate::store::MessageStore;

/// Poll period for redraw and log pickup.
const TICK_MS: u64 = 100;

/// Which view owns the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Join,
    Room,
}

/// Application state
pub struct App {
    pub should_exit: bool,
    pub view: View,
    pub join: JoinState,
    pub messages: MessagesState,
    pub compose: ComposeState,
    pub emoji: EmojiPickerState,
    /// Fixed at join time; `None` while on the join view.
    pub participant: Option<Participant>,
    /// Short backend description for the status bar (e.g. "local" or a URL).
    pub backend_label: String,
    /// Newest captured tracing line, surfaced in the status bar.
    pub last_log: Option<String>,
}

impl App {
    fn new(default_name: Option<String>, backend_label: String) -> Self {
        Self {
            should_exit: false,
            view: View::Join,
            join: JoinState::with_name(default_name),
            messages: MessagesState::new(),
            compose: ComposeState::default(),
            emoji: EmojiPickerState::default(),
            participant: None,
            backend_label,
            last_log: None,
        }
    }

    /// Handle a key press.
    fn handle_key(&mut self, key: KeyEvent, backend: &Backend) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_exit = true;
            return;
        }

        match self.view {
            View::Join => self.handle_join_key(key, backend),
            View::Room => self.handle_room_key(key, backend),
        }
    }

    fn handle_join_key(&mut self, key: KeyEvent, backend: &Backend) {
        match key.code {
            KeyCode::Esc => self.should_exit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.join.focus_next();
            }
            KeyCode::Backspace => self.join.backspace(),
            KeyCode::Enter => {
                // Silent no-op while the form is incomplete.
                if let Some(participant) = self.join.form.try_join() {
                    backend.send(BackendCommand::Join { participant });
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.join.push_char(c);
            }
            _ => {}
        }
    }

    fn handle_room_key(&mut self, key: KeyEvent, backend: &Backend) {
        if self.emoji.open {
            match key.code {
                KeyCode::Esc => self.emoji.open = false,
                KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.emoji.open = false;
                }
                KeyCode::Left => self.emoji.move_left(),
                KeyCode::Right => self.emoji.move_right(),
                KeyCode::Up => self.emoji.move_up(),
                KeyCode::Down => self.emoji.move_down(),
                KeyCode::Enter => {
                    let emoji = self.emoji.pick();
                    self.compose.insert_str(emoji);
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => backend.send(BackendCommand::Leave),
            KeyCode::Enter => {
                // The input clears now; the message shows up only after the
                // notification round trip.
                if let Some(text) = self.compose.take_for_send() {
                    backend.send(BackendCommand::Send { text });
                }
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.emoji.toggle();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.compose.clear();
            }
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            KeyCode::Up => self.messages.scroll_up(1),
            KeyCode::Down => self.messages.scroll_down(1),
            KeyCode::PageUp => self.messages.scroll_up(10),
            KeyCode::PageDown => self.messages.scroll_down(10),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.compose.insert_char(c);
            }
            _ => {}
        }
    }

    /// Apply a backend response.
    fn handle_response(&mut self, resp: BackendResponse) {
        match resp {
            BackendResponse::Joined { participant } => {
                self.participant = Some(participant);
                self.view = View::Room;
            }
            BackendResponse::Messages(messages) => {
                self.messages.set_messages(messages);
            }
            BackendResponse::Left => {
                self.participant = None;
                self.view = View::Join;
                self.messages.clear();
                self.compose.clear();
                self.emoji.open = false;
            }
        }
    }
}

/// Run the TUI application with panic-safe terminal restore.
pub async fn run(
    store: Arc<dyn MessageStore>,
    default_name: Option<String>,
    backend_label: String,
    log_buffer: LogBuffer,
) -> Result<()> {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        prev_hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, store, default_name, backend_label, log_buffer).await;
    ratatui::restore();
    result
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    store: Arc<dyn MessageStore>,
    default_name: Option<String>,
    backend_label: String,
    log_buffer: LogBuffer,
) -> Result<()> {
    let mut app = App::new(default_name, backend_label);
    let mut backend = Backend::start(store);
    let mut events = EventStream::new();
    let mut tick = time::interval(Duration::from_millis(TICK_MS));

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, &backend);
                }
                Some(Ok(Event::Resize(_, _))) => {
                    // Redrawn on the next loop pass.
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            resp = backend.recv() => match resp {
                Some(resp) => app.handle_response(resp),
                None => break,
            },
            _ = tick.tick() => {
                app.last_log = log_buffer.latest();
            }
        }
    }

    Ok(())
}
