//! Executes controller [`Action`]s.
//!
//! Reads run as spawned tasks that report back on the feed channel. The
//! dispatcher owns at most one [`LiveHandle`]; opening a subscription closes
//! the previous one first.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::controller::{Action, FeedMessage};
use crate::models::RangeQuery;
use crate::rest::MarketDataClient;
use crate::websocket::{LiveHandle, spawn_live_feed};
use crate::{HandicapError, Result};

/// Performs the I/O behind controller actions.
pub struct Dispatcher {
    client: MarketDataClient,
    websocket_url: String,
    export_dir: PathBuf,
    tx: mpsc::UnboundedSender<FeedMessage>,
    live: Option<LiveHandle>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        client: MarketDataClient,
        websocket_url: String,
        export_dir: PathBuf,
        tx: mpsc::UnboundedSender<FeedMessage>,
    ) -> Self {
        Self {
            client,
            websocket_url,
            export_dir,
            tx,
            live: None,
        }
    }

    /// Returns `true` while a push connection task is running.
    pub fn has_live_connection(&self) -> bool {
        self.live.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Starts the work described by `action`. Must be called from within a
    /// Tokio runtime.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::FetchHistorical { request, query } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.get_data(&query).await;
                    let _ = tx.send(FeedMessage::Historical { request, result });
                });
            }
            Action::FetchLatest { request, query } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.get_latest(&query).await;
                    let _ = tx.send(FeedMessage::Latest { request, result });
                });
            }
            Action::Export {
                request,
                query,
                file_name,
            } => {
                let client = self.client.clone();
                let tx = self.tx.clone();
                let path = self.export_dir.join(file_name);
                tokio::spawn(async move {
                    let result = export_to_file(&client, &query, &path).await.map(|()| path);
                    let _ = tx.send(FeedMessage::Exported { request, result });
                });
            }
            Action::OpenLive {
                subscription,
                request,
            } => {
                if let Some(previous) = self.live.take() {
                    debug!(
                        subscription = previous.subscription().0,
                        "Closing previous live feed"
                    );
                    let _ = previous.close();
                }
                self.live = Some(spawn_live_feed(
                    self.websocket_url.clone(),
                    subscription,
                    request,
                    self.tx.clone(),
                ));
            }
            Action::CloseLive { subscription } => {
                match self.live.take() {
                    Some(handle) if handle.subscription() == subscription => {
                        let _ = handle.close();
                    }
                    other => {
                        debug!(subscription = subscription.0, "No matching live feed to close");
                        self.live = other;
                    }
                }
            }
        }
    }

    /// Closes the push connection, if any, and waits for its task to exit.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.live.take() {
            info!(subscription = handle.subscription().0, "Stopping live feed");
            let _ = handle.close().await;
        }
    }
}

/// Downloads the export for `query` and writes it to `path`.
async fn export_to_file(client: &MarketDataClient, query: &RangeQuery, path: &Path) -> Result<()> {
    let body = client.export_data(query).await?;
    tokio::fs::write(path, &body)
        .await
        .map_err(|e| HandicapError::Io(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = body.len(), "Export written");
    Ok(())
}
