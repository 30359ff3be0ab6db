//! Async WebSocket client for the service's push feed.
//!
//! This module is organized by concern:
//! - [`frame`] - Decoding pushed text frames into trade records
//! - [`live`] - The task that owns one live subscription

mod frame;
mod live;

use futures_util::{SinkExt, StreamExt};
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};
use tungstenite::Message;

use crate::Result;
use crate::models::SubscribeRequest;

pub use frame::decode_frame;
pub use live::{LiveHandle, spawn_live_feed};

/// Write half of a push connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a push connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`HandicapError`](crate::HandicapError) if the connection or
/// TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(url, "WebSocket handshake completed");

    Ok(ws_stream.split())
}

/// Sends the subscribe message for one symbol/market/data kind.
///
/// # Errors
///
/// Returns a [`HandicapError`](crate::HandicapError) if sending the message
/// fails.
pub async fn subscribe(write: &mut WsWriter, request: &SubscribeRequest) -> Result<()> {
    let json = serde_json::to_string(request)?;
    debug!("Sending subscribe request: {}", json);
    write.send(Message::Text(json.into())).await?;
    info!(
        symbol = request.symbol.as_str(),
        market_type = request.market_type.as_str(),
        data_type = request.data_type.as_str(),
        "Subscribed to feed"
    );

    Ok(())
}

/// Sends a close frame.
///
/// # Errors
///
/// Returns a [`HandicapError`](crate::HandicapError) if the frame cannot be
/// sent.
pub async fn close(write: &mut WsWriter) -> Result<()> {
    write.send(Message::Close(None)).await?;
    debug!("Sent close frame");

    Ok(())
}
