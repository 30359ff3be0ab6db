//! Live feed tests against an in-process WebSocket server.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use handicap::controller::{FeedMessage, SubscriptionId};
use handicap::models::{DataKind, MarketKind, SubscribeRequest, Symbol};
use handicap::websocket::{connect, spawn_live_feed, subscribe};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tungstenite::Message;

use common::{bind_ws_listener, load_fixture};

const WAIT: Duration = Duration::from_secs(5);

const RECORD: &str = r#"{"timestamp":1704067200000,"symbol":"btcusdt","price":42000.5,"quantity":1.5,"order_type":"B","market_type":"spot"}"#;

fn request() -> SubscribeRequest {
    SubscribeRequest::new(Symbol::BtcUsdt, MarketKind::Spot, DataKind::Trades)
}

/// Receives the next feed message or fails the test after [`WAIT`].
async fn next_message(rx: &mut mpsc::UnboundedReceiver<FeedMessage>) -> FeedMessage {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("Timed out waiting for feed message")
        .expect("Feed channel closed")
}

/// Accepts one connection and returns the subscribe message it sends first.
async fn accept_subscriber(
    listener: &TcpListener,
) -> (
    tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    serde_json::Value,
) {
    let (stream, _) = listener.accept().await.expect("Failed to accept");
    let mut ws = accept_async(stream).await.expect("Handshake failed");
    let first = ws
        .next()
        .await
        .expect("Connection ended before subscribe")
        .expect("Failed to read subscribe");
    let text = match first {
        Message::Text(text) => text,
        other => panic!("expected a text subscribe message, got {other:?}"),
    };
    let value = serde_json::from_str(text.as_str()).expect("Subscribe was not JSON");
    (ws, value)
}

#[tokio::test]
async fn test_subscribe_then_forward_batches_until_closed() {
    let (listener, url) = bind_ws_listener().await;
    let (server_tx, mut server_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (mut ws, subscribe) = accept_subscriber(&listener).await;
        server_tx.send(subscribe).expect("test ended");

        for frame in [
            r#"0{"sid":"abc","pingInterval":25000}"#.to_string(),
            "40".to_string(),
            format!(r#"42["data",[{RECORD},{RECORD}]]"#),
            load_fixture("trades.json"),
        ] {
            ws.send(Message::Text(frame.into())).await.expect("send failed");
        }

        // Drain until the client's close frame arrives.
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                server_tx
                    .send(serde_json::Value::String("closed".to_string()))
                    .expect("test ended");
                break;
            }
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = SubscriptionId(7);
    let handle = spawn_live_feed(url, subscription, request(), tx);

    let subscribe = server_rx.recv().await.expect("server gone");
    assert_eq!(subscribe["type"], "subscribe");
    assert_eq!(subscribe["symbol"], "btcusdt");
    assert_eq!(subscribe["market_type"], "spot");
    assert_eq!(subscribe["data_type"], "trades");

    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveOpened(id) if id == subscription));
    match next_message(&mut rx).await {
        FeedMessage::LiveBatch {
            subscription: id,
            records,
        } => {
            assert_eq!(id, subscription);
            assert_eq!(records.len(), 2);
        }
        other => panic!("expected batch, got {other:?}"),
    }
    match next_message(&mut rx).await {
        FeedMessage::LiveBatch { records, .. } => assert_eq!(records.len(), 5),
        other => panic!("expected batch, got {other:?}"),
    }

    tokio::time::timeout(WAIT, handle.close())
        .await
        .expect("Live task did not stop")
        .expect("Live task panicked");

    let closed = tokio::time::timeout(WAIT, server_rx.recv())
        .await
        .expect("Server never saw close");
    assert_eq!(closed, Some(serde_json::Value::String("closed".to_string())));
    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveClosed(id) if id == subscription));
}

#[tokio::test]
async fn test_server_drop_reports_closed() {
    let (listener, url) = bind_ws_listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_subscriber(&listener).await;
        ws.send(Message::Text(format!("[{RECORD}]").into()))
            .await
            .expect("send failed");
        ws.close(None).await.expect("close failed");
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = SubscriptionId(1);
    let handle = spawn_live_feed(url, subscription, request(), tx);

    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveOpened(_)));
    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveBatch { .. }));

    // A transport error may be reported before the close.
    loop {
        match next_message(&mut rx).await {
            FeedMessage::LiveClosed(id) => {
                assert_eq!(id, subscription);
                break;
            }
            FeedMessage::LiveFailed { .. } => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }

    tokio::time::timeout(WAIT, handle.close())
        .await
        .expect("Live task did not stop")
        .expect("Live task panicked");
}

#[tokio::test]
async fn test_undecodable_frames_are_skipped() {
    let (listener, url) = bind_ws_listener().await;

    tokio::spawn(async move {
        let (mut ws, _) = accept_subscriber(&listener).await;
        for frame in [r#"{"error":"nope"}"#.to_string(), format!("[{RECORD}]")] {
            ws.send(Message::Text(frame.into())).await.expect("send failed");
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_live_feed(url, SubscriptionId(3), request(), tx);

    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveOpened(_)));
    match next_message(&mut rx).await {
        FeedMessage::LiveBatch { records, .. } => assert_eq!(records.len(), 1),
        other => panic!("expected batch, got {other:?}"),
    }
    let _ = handle.close().await;
}

#[tokio::test]
async fn test_connection_refused_reports_failure_then_closed() {
    let (listener, url) = bind_ws_listener().await;
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = SubscriptionId(9);
    let _handle = spawn_live_feed(url, subscription, request(), tx);

    assert!(matches!(
        next_message(&mut rx).await,
        FeedMessage::LiveFailed { subscription: id, .. } if id == subscription
    ));
    assert!(matches!(next_message(&mut rx).await, FeedMessage::LiveClosed(id) if id == subscription));
}

#[tokio::test]
async fn test_connect_and_subscribe_helpers() {
    let (listener, url) = bind_ws_listener().await;
    let server = tokio::spawn(async move { accept_subscriber(&listener).await.1 });

    let (mut write, _read) = connect(&url).await.expect("Failed to connect");
    subscribe(&mut write, &request())
        .await
        .expect("Failed to subscribe");

    let value = server.await.expect("server panicked");
    assert_eq!(value["type"], "subscribe");
}
