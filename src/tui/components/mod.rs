//! Reusable widgets drawn by [`render`](super::render).

pub mod notification;
pub mod query_form;
pub mod status_bar;
pub mod trade_table;
