//! Client for a market-data service's trade and order-book feeds.
//!
//! Provides typed models, an HTTP client for historical, latest and export
//! queries, a WebSocket live feed, and the [`controller::FeedController`]
//! state machine that keeps a bounded, newest-first buffer of trade records
//! for the terminal UI.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod models;
pub mod rest;
pub mod tui;
pub mod websocket;

pub use error::{HandicapError, Result};
