//! Crate-level error types.
//!
//! [`HandicapError`] unifies every error source (configuration, HTTP,
//! WebSocket, JSON, filesystem) behind a single enum so callers can match on
//! the variant they care about while still using the `?` operator.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HandicapError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum HandicapError {
    /// An environment variable held an unusable value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The market-data service answered with a non-success status.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A payload had the wrong shape for what the client expected.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Terminal or filesystem I/O failed.
    #[error("io error: {0}")]
    Io(String),
}
