//! Live subscription task.
//!
//! [`spawn_live_feed`] opens one push connection, sends the subscribe
//! message and forwards every decoded batch to the controller until the
//! connection ends or its [`LiveHandle`] is closed. There is no reconnect:
//! a dropped connection is reported once with
//! [`FeedMessage::LiveClosed`] and the task exits.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tungstenite::Message as WsMessage;

use super::{WsReader, WsWriter, close, connect, decode_frame, subscribe};
use crate::controller::{FeedMessage, SubscriptionId};
use crate::models::SubscribeRequest;

/// Why the reader loop exited.
enum StopReason {
    /// The handle asked the connection to close.
    Requested,
    /// The server closed the connection or the transport failed.
    ConnectionLost,
    /// The controller side of the channel is gone.
    Shutdown,
}

/// Owner of one running live subscription.
///
/// Dropping the handle also stops the task.
#[derive(Debug)]
pub struct LiveHandle {
    subscription: SubscriptionId,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl LiveHandle {
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Asks the task to send a close frame and exit, without waiting.
    pub fn close(self) -> JoinHandle<()> {
        let _ = self.shutdown.send(());
        self.task
    }

    /// Returns `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the task that owns the push connection for `subscription`.
///
/// Outcomes are reported on `tx`: [`FeedMessage::LiveOpened`] after the
/// subscribe message is sent, [`FeedMessage::LiveBatch`] per data frame,
/// [`FeedMessage::LiveFailed`] on transport errors and finally
/// [`FeedMessage::LiveClosed`].
pub fn spawn_live_feed(
    url: String,
    subscription: SubscriptionId,
    request: SubscribeRequest,
    tx: mpsc::UnboundedSender<FeedMessage>,
) -> LiveHandle {
    let (shutdown, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run(url, subscription, request, tx, shutdown_rx));
    LiveHandle {
        subscription,
        shutdown,
        task,
    }
}

async fn run(
    url: String,
    subscription: SubscriptionId,
    request: SubscribeRequest,
    tx: mpsc::UnboundedSender<FeedMessage>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!(subscription = subscription.0, url = %url, "Connecting live feed");

    let connected = tokio::select! {
        result = connect(&url) => result,
        _ = &mut shutdown => {
            info!(subscription = subscription.0, "Live feed cancelled before connecting");
            let _ = tx.send(FeedMessage::LiveClosed(subscription));
            return;
        }
    };

    let (mut write, read) = match connected {
        Ok(pair) => pair,
        Err(e) => {
            warn!(subscription = subscription.0, "Live feed connection failed: {e}");
            let _ = tx.send(FeedMessage::LiveFailed {
                subscription,
                error: e.to_string(),
            });
            let _ = tx.send(FeedMessage::LiveClosed(subscription));
            return;
        }
    };

    if let Err(e) = subscribe(&mut write, &request).await {
        warn!(subscription = subscription.0, "Subscribe failed: {e}");
        let _ = tx.send(FeedMessage::LiveFailed {
            subscription,
            error: e.to_string(),
        });
        let _ = tx.send(FeedMessage::LiveClosed(subscription));
        return;
    }
    let _ = tx.send(FeedMessage::LiveOpened(subscription));

    let reason = read_loop(subscription, &mut write, read, &tx, &mut shutdown).await;
    match reason {
        StopReason::Requested | StopReason::Shutdown => {
            if let Err(e) = close(&mut write).await {
                debug!(subscription = subscription.0, "Close frame not sent: {e}");
            }
            info!(subscription = subscription.0, "Live feed closed");
        }
        StopReason::ConnectionLost => {
            info!(subscription = subscription.0, "Live feed ended");
        }
    }
    let _ = tx.send(FeedMessage::LiveClosed(subscription));
}

/// Reads frames until the connection ends, the handle closes it, or the
/// controller goes away.
async fn read_loop(
    subscription: SubscriptionId,
    write: &mut WsWriter,
    mut read: WsReader,
    tx: &mpsc::UnboundedSender<FeedMessage>,
    shutdown: &mut oneshot::Receiver<()>,
) -> StopReason {
    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => match decode_frame(text.as_str()) {
                        Ok(Some(records)) => {
                            debug!(subscription = subscription.0, records = records.len(), "Received batch");
                            if tx.send(FeedMessage::LiveBatch { subscription, records }).is_err() {
                                return StopReason::Shutdown;
                            }
                        }
                        Ok(None) => debug!(subscription = subscription.0, "Skipping control frame"),
                        Err(e) => warn!(subscription = subscription.0, "Dropping undecodable frame: {e}"),
                    },
                    Some(Ok(WsMessage::Ping(payload))) => {
                        // tungstenite queues the pong; flushing sends it.
                        debug!(subscription = subscription.0, bytes = payload.len(), "Received ping");
                        if let Err(e) = write.flush().await {
                            warn!(subscription = subscription.0, "Flush failed: {e}");
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(subscription = subscription.0, ?frame, "Server closed live feed");
                        return StopReason::ConnectionLost;
                    }
                    Some(Ok(_)) => {} // Binary/Pong/Frame
                    Some(Err(e)) => {
                        warn!(subscription = subscription.0, "WebSocket error: {e}");
                        let _ = tx.send(FeedMessage::LiveFailed {
                            subscription,
                            error: e.to_string(),
                        });
                        return StopReason::ConnectionLost;
                    }
                    None => {
                        warn!(subscription = subscription.0, "WebSocket stream ended");
                        return StopReason::ConnectionLost;
                    }
                }
            }

            _ = &mut *shutdown => {
                return StopReason::Requested;
            }
        }
    }
}
