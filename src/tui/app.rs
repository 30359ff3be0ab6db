//! Application state for the TUI.

use std::time::{Duration, Instant};

use crate::controller::{Action, FeedController};
use crate::models::parse_query_time;

use super::input::TextInput;

/// How long an input error stays in the status bar.
const ERROR_DISPLAY_TIME: Duration = Duration::from_secs(5);

/// Central application state container.
pub struct App {
    /// Query, mode and buffer state.
    pub controller: FeedController,
    /// Form field that currently has focus.
    pub focus: Field,
    /// Current input mode.
    pub mode: Mode,
    pub start_input: TextInput,
    pub end_input: TextInput,
    /// Input error to display (clears after timeout).
    pub error_message: Option<ErrorDisplay>,
    /// Flag to signal application should quit.
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: FeedController) -> Self {
        let mut app = Self {
            controller,
            focus: Field::StartTime,
            mode: Mode::Normal,
            start_input: TextInput::new(),
            end_input: TextInput::new(),
            error_message: None,
            should_quit: false,
        };
        app.sync_inputs();
        app
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Returns the text input behind the focused field, if it is a time field.
    pub fn focused_input(&self) -> Option<&TextInput> {
        match self.focus {
            Field::StartTime => Some(&self.start_input),
            Field::EndTime => Some(&self.end_input),
            _ => None,
        }
    }

    pub fn focused_input_mut(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            Field::StartTime => Some(&mut self.start_input),
            Field::EndTime => Some(&mut self.end_input),
            _ => None,
        }
    }

    /// Enters insert mode if a time field has focus.
    pub fn begin_edit(&mut self) {
        if let Some(input) = self.focused_input_mut() {
            input.move_end();
            self.mode = Mode::Insert;
        }
    }

    /// Leaves insert mode and hands the edited time to the controller.
    ///
    /// An empty value clears that end of the range. A malformed value is
    /// rejected, keeping the field in insert mode.
    pub fn commit_edit(&mut self) -> Vec<Action> {
        let Some(value) = self.focused_input().map(|input| input.as_str().trim().to_string())
        else {
            self.mode = Mode::Normal;
            return Vec::new();
        };
        if !value.is_empty() && parse_query_time(&value).is_none() {
            self.show_error(format!("invalid time {value:?}, expected YYYY-MM-DDTHH:MM"));
            return Vec::new();
        }

        self.mode = Mode::Normal;
        let actions = match self.focus {
            Field::StartTime => self.controller.set_start_time(value),
            Field::EndTime => self.controller.set_end_time(value),
            _ => Vec::new(),
        };
        self.sync_inputs();
        actions
    }

    /// Leaves insert mode, discarding the edit.
    pub fn cancel_edit(&mut self) {
        self.mode = Mode::Normal;
        self.sync_inputs();
    }

    /// Empties the focused time field.
    pub fn clear_focused_time(&mut self) -> Vec<Action> {
        let actions = match self.focus {
            Field::StartTime => self.controller.set_start_time(""),
            Field::EndTime => self.controller.set_end_time(""),
            _ => return Vec::new(),
        };
        self.sync_inputs();
        actions
    }

    /// Steps the focused selector (symbol, market, data kind, live) to its
    /// next or previous value.
    pub fn cycle_focused(&mut self, forward: bool) -> Vec<Action> {
        let params = self.controller.params().clone();
        match self.focus {
            Field::Symbol => {
                let symbol = cycle(&crate::models::Symbol::ALL, params.symbol, forward);
                self.controller.set_symbol(symbol)
            }
            Field::Market => {
                let market = cycle(&crate::models::MarketKind::ALL, params.market, forward);
                self.controller.set_market(market)
            }
            Field::DataKind => {
                let kind = cycle(&crate::models::DataKind::ALL, params.data_kind, forward);
                self.controller.set_data_kind(kind)
            }
            Field::Live => self.controller.toggle_live(),
            Field::StartTime | Field::EndTime => Vec::new(),
        }
    }

    /// Sets an error message to display.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(ErrorDisplay {
            message: message.into(),
            timestamp: Instant::now(),
        });
    }

    /// Clears error messages older than [`ERROR_DISPLAY_TIME`].
    pub fn clear_stale_errors(&mut self) {
        if let Some(ref error) = self.error_message
            && error.timestamp.elapsed() > ERROR_DISPLAY_TIME
        {
            self.error_message = None;
        }
    }

    /// Copies the controller's time range into the text inputs.
    fn sync_inputs(&mut self) {
        let params = self.controller.params();
        let (start, end) = (params.start_time.clone(), params.end_time.clone());
        self.start_input.set(&start);
        self.end_input.set(&end);
    }
}

/// Returns the element after (or before) `current` in `all`, wrapping around.
fn cycle<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (pos + 1) % all.len()
    } else {
        pos.checked_sub(1).unwrap_or(all.len() - 1)
    };
    all[next]
}

/// Fields of the query form, in focus order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    StartTime,
    EndTime,
    Symbol,
    Market,
    DataKind,
    Live,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::StartTime,
        Field::EndTime,
        Field::Symbol,
        Field::Market,
        Field::DataKind,
        Field::Live,
    ];

    /// Returns the field title.
    pub fn title(&self) -> &'static str {
        match self {
            Field::StartTime => "Start",
            Field::EndTime => "End",
            Field::Symbol => "Symbol",
            Field::Market => "Market",
            Field::DataKind => "Data",
            Field::Live => "Live",
        }
    }

    fn next(self) -> Self {
        cycle(&Self::ALL, self, true)
    }

    fn previous(self) -> Self {
        cycle(&Self::ALL, self, false)
    }
}

/// Input mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Editing a time field.
    Insert,
}

/// Error message with timestamp for auto-clear.
#[derive(Clone, Debug)]
pub struct ErrorDisplay {
    pub message: String,
    /// When the error was shown.
    pub timestamp: Instant,
}
