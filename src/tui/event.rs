//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::controller::{Action, FeedMessage};

use super::app::{App, Field, Mode};

/// Events that can occur in the application.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI updates.
    Tick,
}

/// Messages that update application state.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),
    /// Outcome of a fetch, export or push connection.
    Feed(FeedMessage),
    /// Request to quit the application.
    Quit,
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            // Poll for events with a 50ms timeout
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Updates application state based on a message and returns the actions
/// the dispatcher should perform.
pub fn update(app: &mut App, message: Message) -> Vec<Action> {
    match message {
        Message::Input(event) => handle_input(app, event),
        Message::Feed(feed) => {
            app.controller.handle(feed);
            Vec::new()
        }
        Message::Quit => {
            app.should_quit = true;
            Vec::new()
        }
    }
}

fn handle_input(app: &mut App, event: Event) -> Vec<Action> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Resize(_, _) => Vec::new(),
        Event::Tick => {
            app.clear_stale_errors();
            Vec::new()
        }
    }
}

/// Handles key press events.
fn handle_key(app: &mut App, key: KeyEvent) -> Vec<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Vec::new();
    }

    // A notification is modal until dismissed.
    if app.controller.notification().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.controller.dismiss_notification();
        }
        return Vec::new();
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Insert => handle_insert_mode(app, key),
    }
}

/// Handles keys in normal mode.
fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            Vec::new()
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.previous_field();
            } else {
                app.next_field();
            }
            Vec::new()
        }
        KeyCode::BackTab => {
            app.previous_field();
            Vec::new()
        }

        KeyCode::Enter | KeyCode::Char('i') => match app.focus {
            Field::StartTime | Field::EndTime => {
                app.begin_edit();
                Vec::new()
            }
            _ => app.cycle_focused(true),
        },
        KeyCode::Char(' ') | KeyCode::Right => app.cycle_focused(true),
        KeyCode::Left => app.cycle_focused(false),
        KeyCode::Backspace | KeyCode::Delete => app.clear_focused_time(),

        KeyCode::Char('l') => app.controller.toggle_live(),
        KeyCode::Char('f') => app.controller.fetch_historical(),
        KeyCode::Char('r') => app.controller.refresh_latest(),
        KeyCode::Char('e') => app.controller.export(),

        _ => Vec::new(),
    }
}

/// Handles keys in insert mode (time field editing).
fn handle_insert_mode(app: &mut App, key: KeyEvent) -> Vec<Action> {
    match key.code {
        KeyCode::Enter => return app.commit_edit(),
        KeyCode::Esc => {
            app.cancel_edit();
            return Vec::new();
        }
        _ => {}
    }

    if let Some(input) = app.focused_input_mut() {
        match key.code {
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandicapError;
    use crate::controller::FeedController;

    fn press(app: &mut App, code: KeyCode) -> Vec<Action> {
        update(
            app,
            Message::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn q_quits_only_in_normal_mode() {
        let mut app = App::new(FeedController::default());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Insert);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.start_input.as_str(), "q");

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn editing_range_then_fetching() {
        let mut app = App::new(FeedController::default());
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "2024-01-01T00:00");
        assert!(press(&mut app, KeyCode::Enter).is_empty());

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "2024-01-01T06:00");
        let actions = press(&mut app, KeyCode::Enter);
        assert!(matches!(actions[..], [Action::FetchHistorical { .. }]));

        let actions = press(&mut app, KeyCode::Char('f'));
        assert!(matches!(actions[..], [Action::FetchHistorical { .. }]));
    }

    #[test]
    fn notification_blocks_keys_until_dismissed() {
        let mut app = App::new(FeedController::default());
        let actions = press(&mut app, KeyCode::Char('r'));
        let request = match actions[..] {
            [Action::FetchLatest { request, .. }] => request,
            _ => panic!("expected a latest fetch, got {actions:?}"),
        };
        update(
            &mut app,
            Message::Feed(FeedMessage::Latest {
                request,
                result: Err(HandicapError::Server {
                    status: 500,
                    body: "boom".to_string(),
                }),
            }),
        );
        assert!(app.controller.notification().is_some());

        assert!(press(&mut app, KeyCode::Char('q')).is_empty());
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Esc);
        assert!(app.controller.notification().is_none());
    }

    #[test]
    fn export_runs_one_at_a_time() {
        let mut app = App::new(FeedController::default());
        let actions = press(&mut app, KeyCode::Char('e'));
        assert!(matches!(&actions[..], [Action::Export { file_name, .. }] if file_name == "trades.csv"));
        assert!(press(&mut app, KeyCode::Char('e')).is_empty());
        assert!(app.controller.exporting());
    }

    #[test]
    fn live_key_toggles_subscription() {
        let mut app = App::new(FeedController::default());
        let actions = press(&mut app, KeyCode::Char('l'));
        assert!(matches!(actions[..], [Action::OpenLive { .. }]));
        let actions = press(&mut app, KeyCode::Char('l'));
        assert!(matches!(actions[..], [Action::CloseLive { .. }]));
        assert!(!app.controller.is_live());
    }

    #[test]
    fn ctrl_c_quits_from_insert_mode() {
        let mut app = App::new(FeedController::default());
        press(&mut app, KeyCode::Enter);
        update(
            &mut app,
            Message::Input(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
            ))),
        );
        assert!(app.should_quit);
    }
}
