//! Terminal User Interface for the trade feed.
//!
//! Provides a Ratatui-based TUI with a query form, buy and sell trade
//! columns and a status bar.

pub mod app;
pub mod components;
pub mod event;
pub mod input;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Event, Message};
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;
