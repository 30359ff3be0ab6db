//! Shared test utilities: fixtures and in-process mock servers.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use tokio::net::TcpListener;

/// Helper to get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Reads a fixture file into a string.
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name))
        .unwrap_or_else(|e| panic!("Failed to read fixture {name}: {e}"))
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_http_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind HTTP listener");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("HTTP server failed");
    });
    format!("http://{addr}")
}

/// Binds a listener for a mock WebSocket server and returns it with its URL.
pub async fn bind_ws_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind WebSocket listener");
    let addr: SocketAddr = listener.local_addr().expect("Failed to read local address");
    (listener, format!("ws://{addr}/socket.io/?EIO=3&transport=websocket"))
}
