//! Trade feed controller.
//!
//! [`FeedController`] owns the query parameters, the historical/live mode
//! flag and the [`FeedBuffer`]. It performs no I/O: every operation returns
//! the [`Action`]s the caller must carry out, and the outcomes come back as
//! [`FeedMessage`]s through [`FeedController::handle`].
//!
//! Reads are tagged with a [`RequestId`] and live connections with a
//! [`SubscriptionId`]. Any parameter change or live toggle starts a new
//! epoch; read results from an older epoch, historical results superseded by
//! a newer historical request, and frames from a torn-down subscription are
//! dropped. `loading` stays true until every outstanding read has reported
//! back, whether it succeeded or not.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::Result;
use crate::feed::FeedBuffer;
use crate::models::{
    DataKind, LatestQuery, MarketKind, QueryParams, RangeQuery, SubscribeRequest, Symbol,
    TradeRecord,
};

/// Identifies one HTTP read issued by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Identifies one push connection opened by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

/// Side effects requested by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// GET the historical endpoint and report [`FeedMessage::Historical`].
    FetchHistorical { request: RequestId, query: RangeQuery },
    /// GET the latest endpoint and report [`FeedMessage::Latest`].
    FetchLatest { request: RequestId, query: LatestQuery },
    /// GET the export endpoint, save the body as `file_name` and report
    /// [`FeedMessage::Exported`].
    Export {
        request: RequestId,
        query: RangeQuery,
        file_name: String,
    },
    /// Open the push connection and send `request` once it is established.
    OpenLive {
        subscription: SubscriptionId,
        request: SubscribeRequest,
    },
    /// Close the push connection opened for `subscription`.
    CloseLive { subscription: SubscriptionId },
}

/// Outcomes reported back to the controller.
#[derive(Debug)]
pub enum FeedMessage {
    Historical {
        request: RequestId,
        result: Result<Vec<TradeRecord>>,
    },
    Latest {
        request: RequestId,
        result: Result<Vec<TradeRecord>>,
    },
    Exported {
        request: RequestId,
        result: Result<PathBuf>,
    },
    /// The connection is up and the subscribe message was sent.
    LiveOpened(SubscriptionId),
    /// A batch of records pushed by the service.
    LiveBatch {
        subscription: SubscriptionId,
        records: Vec<TradeRecord>,
    },
    /// A transport error on the push connection.
    LiveFailed {
        subscription: SubscriptionId,
        error: String,
    },
    /// The push connection is gone, for whatever reason.
    LiveClosed(SubscriptionId),
}

/// Push connection state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiveState {
    #[default]
    Idle,
    Connecting(SubscriptionId),
    Streaming(SubscriptionId),
    /// The connection dropped while live mode is still on.
    Disconnected(SubscriptionId),
}

impl LiveState {
    /// Returns the subscription this state refers to, if any.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        match self {
            LiveState::Idle => None,
            LiveState::Connecting(id) | LiveState::Streaming(id) | LiveState::Disconnected(id) => {
                Some(*id)
            }
        }
    }

    /// Returns a display string for the state.
    pub fn label(&self) -> &'static str {
        match self {
            LiveState::Idle => "Idle",
            LiveState::Connecting(_) => "Connecting...",
            LiveState::Streaming(_) => "Streaming",
            LiveState::Disconnected(_) => "Dropped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadKind {
    Historical,
    Latest,
}

#[derive(Debug, Clone, Copy)]
struct PendingRead {
    kind: ReadKind,
    epoch: u64,
}

/// Query, mode and buffer state behind the trade tables.
#[derive(Debug)]
pub struct FeedController {
    params: QueryParams,
    latest_depth: u32,
    live: bool,
    live_state: LiveState,
    buffer: FeedBuffer,
    pending: BTreeMap<RequestId, PendingRead>,
    latest_historical: Option<RequestId>,
    pending_export: Option<RequestId>,
    epoch: u64,
    next_id: u64,
    notification: Option<String>,
    last_export: Option<PathBuf>,
}

impl FeedController {
    /// Creates a controller in historical mode with default parameters.
    ///
    /// `latest_depth` is the row limit sent with latest-snapshot reads.
    pub fn new(latest_depth: u32) -> Self {
        Self {
            params: QueryParams::default(),
            latest_depth,
            live: false,
            live_state: LiveState::Idle,
            buffer: FeedBuffer::new(),
            pending: BTreeMap::new(),
            latest_historical: None,
            pending_export: None,
            epoch: 0,
            next_id: 0,
            notification: None,
            last_export: None,
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn live_state(&self) -> LiveState {
        self.live_state
    }

    /// True while at least one historical or latest read is outstanding.
    pub fn loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn exporting(&self) -> bool {
        self.pending_export.is_some()
    }

    pub fn buffer(&self) -> &FeedBuffer {
        &self.buffer
    }

    /// The notification waiting to be acknowledged by the user.
    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Path of the most recent successful export.
    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    pub fn set_start_time(&mut self, value: impl Into<String>) -> Vec<Action> {
        let value = value.into();
        if self.params.start_time == value {
            return Vec::new();
        }
        self.params.start_time = value;
        self.epoch += 1;
        self.auto_fetch()
    }

    pub fn set_end_time(&mut self, value: impl Into<String>) -> Vec<Action> {
        let value = value.into();
        if self.params.end_time == value {
            return Vec::new();
        }
        self.params.end_time = value;
        self.epoch += 1;
        self.auto_fetch()
    }

    pub fn set_symbol(&mut self, symbol: Symbol) -> Vec<Action> {
        self.update_stream_param(|params| params.symbol = symbol)
    }

    pub fn set_market(&mut self, market: MarketKind) -> Vec<Action> {
        self.update_stream_param(|params| params.market = market)
    }

    pub fn set_data_kind(&mut self, data_kind: DataKind) -> Vec<Action> {
        self.update_stream_param(|params| params.data_kind = data_kind)
    }

    /// Switches between historical and live mode.
    ///
    /// Turning live mode on opens one push connection. Turning it off closes
    /// that connection, empties the buffer and, if a time range is set,
    /// re-runs the historical query.
    pub fn set_live(&mut self, live: bool) -> Vec<Action> {
        if self.live == live {
            return Vec::new();
        }
        self.live = live;
        self.epoch += 1;

        if live {
            info!("Entering live mode");
            vec![self.open_live()]
        } else {
            info!("Leaving live mode");
            let mut actions: Vec<Action> = self.close_live().into_iter().collect();
            self.buffer.clear();
            actions.extend(self.auto_fetch());
            actions
        }
    }

    pub fn toggle_live(&mut self) -> Vec<Action> {
        self.set_live(!self.live)
    }

    /// Requests the historical range. Ignored in live mode or while either
    /// end of the range is empty.
    pub fn fetch_historical(&mut self) -> Vec<Action> {
        if self.live {
            debug!("Historical fetch ignored in live mode");
            return Vec::new();
        }
        if !self.params.has_time_range() {
            debug!("Historical fetch skipped, time range incomplete");
            return Vec::new();
        }

        let request = self.begin_read(ReadKind::Historical);
        self.latest_historical = Some(request);
        info!(
            request = request.0,
            start_time = %self.params.start_time,
            end_time = %self.params.end_time,
            symbol = self.params.symbol.as_str(),
            market_type = self.params.market.as_str(),
            data_type = self.params.data_kind.as_str(),
            "Fetching historical data"
        );
        vec![Action::FetchHistorical {
            request,
            query: self.params.range_query(),
        }]
    }

    /// Requests the latest rows; the result is merged in front of the buffer.
    pub fn refresh_latest(&mut self) -> Vec<Action> {
        let request = self.begin_read(ReadKind::Latest);
        info!(
            request = request.0,
            market_type = self.params.market.as_str(),
            data_type = self.params.data_kind.as_str(),
            "Fetching latest data"
        );
        vec![Action::FetchLatest {
            request,
            query: self.params.latest_query(self.latest_depth),
        }]
    }

    /// Requests a CSV export of the current range. Only one export runs at a
    /// time.
    pub fn export(&mut self) -> Vec<Action> {
        if self.pending_export.is_some() {
            debug!("Export already in progress");
            return Vec::new();
        }

        let request = self.next_request_id();
        self.pending_export = Some(request);
        let file_name = self.params.data_kind.export_file_name();
        info!(
            request = request.0,
            file_name = file_name.as_str(),
            "Exporting data"
        );
        vec![Action::Export {
            request,
            query: self.params.range_query(),
            file_name,
        }]
    }

    /// Closes the push connection, if any, before the application exits.
    pub fn shutdown(&mut self) -> Vec<Action> {
        self.live = false;
        self.epoch += 1;
        self.close_live().into_iter().collect()
    }

    /// Applies an outcome reported by the dispatcher.
    pub fn handle(&mut self, message: FeedMessage) {
        match message {
            FeedMessage::Historical { request, result } => {
                let Some(pending) = self.finish_read(request) else {
                    return;
                };
                match result {
                    Ok(records) => {
                        if pending.epoch != self.epoch || self.latest_historical != Some(request) {
                            debug!(request = request.0, "Discarding stale historical result");
                            return;
                        }
                        self.buffer.replace(records);
                        info!(
                            request = request.0,
                            records = self.buffer.len(),
                            "Historical data loaded"
                        );
                    }
                    Err(e) => {
                        error!(request = request.0, "Error fetching data: {e}");
                        self.notify(format!("Failed to fetch data, please try again later. ({e})"));
                    }
                }
            }
            FeedMessage::Latest { request, result } => {
                let Some(pending) = self.finish_read(request) else {
                    return;
                };
                match result {
                    Ok(records) => {
                        if pending.epoch != self.epoch {
                            debug!(request = request.0, "Discarding stale latest result");
                            return;
                        }
                        let admitted = self.buffer.prepend(records);
                        info!(request = request.0, admitted, "Latest data merged");
                    }
                    Err(e) => {
                        error!(request = request.0, "Error fetching latest data: {e}");
                        self.notify(format!(
                            "Failed to fetch latest data, please try again later. ({e})"
                        ));
                    }
                }
            }
            FeedMessage::Exported { request, result } => {
                if self.pending_export != Some(request) {
                    debug!(request = request.0, "Ignoring unknown export result");
                    return;
                }
                self.pending_export = None;
                match result {
                    Ok(path) => {
                        info!(request = request.0, path = %path.display(), "Export saved");
                        self.last_export = Some(path);
                    }
                    Err(e) => {
                        error!(request = request.0, "Error exporting data: {e}");
                        self.notify(format!("Failed to export data, please try again later. ({e})"));
                    }
                }
            }
            FeedMessage::LiveOpened(subscription) => {
                if self.live_state == LiveState::Connecting(subscription) {
                    info!(subscription = subscription.0, "Live feed subscribed");
                    self.live_state = LiveState::Streaming(subscription);
                } else {
                    debug!(subscription = subscription.0, "Ignoring open of stale subscription");
                }
            }
            FeedMessage::LiveBatch {
                subscription,
                records,
            } => {
                if !matches!(
                    self.live_state,
                    LiveState::Connecting(id) | LiveState::Streaming(id) if id == subscription
                ) {
                    debug!(subscription = subscription.0, "Ignoring batch of stale subscription");
                    return;
                }
                let received = records.len();
                let admitted = self.buffer.prepend(records);
                debug!(
                    subscription = subscription.0,
                    received, admitted, "Live batch merged"
                );
            }
            FeedMessage::LiveFailed {
                subscription,
                error,
            } => {
                warn!(subscription = subscription.0, "Live feed error: {error}");
            }
            FeedMessage::LiveClosed(subscription) => {
                if matches!(
                    self.live_state,
                    LiveState::Connecting(id) | LiveState::Streaming(id) if id == subscription
                ) {
                    warn!(subscription = subscription.0, "Live feed connection closed");
                    self.live_state = LiveState::Disconnected(subscription);
                }
            }
        }
    }

    /// Applies a change to symbol, market or data kind.
    ///
    /// The buffer is emptied; in live mode the connection is replaced, in
    /// historical mode the range is re-queried.
    fn update_stream_param(&mut self, apply: impl FnOnce(&mut QueryParams)) -> Vec<Action> {
        let before = self.params.clone();
        apply(&mut self.params);
        if self.params == before {
            return Vec::new();
        }
        self.epoch += 1;
        self.buffer.clear();

        if self.live {
            let mut actions: Vec<Action> = self.close_live().into_iter().collect();
            actions.push(self.open_live());
            actions
        } else {
            self.auto_fetch()
        }
    }

    /// Fetches the historical range when in historical mode with both times set.
    fn auto_fetch(&mut self) -> Vec<Action> {
        if !self.live && self.params.has_time_range() {
            self.fetch_historical()
        } else {
            Vec::new()
        }
    }

    fn open_live(&mut self) -> Action {
        self.next_id += 1;
        let subscription = SubscriptionId(self.next_id);
        self.live_state = LiveState::Connecting(subscription);
        info!(
            subscription = subscription.0,
            symbol = self.params.symbol.as_str(),
            market_type = self.params.market.as_str(),
            data_type = self.params.data_kind.as_str(),
            "Opening live feed"
        );
        Action::OpenLive {
            subscription,
            request: self.params.subscribe_request(),
        }
    }

    fn close_live(&mut self) -> Option<Action> {
        let subscription = self.live_state.subscription()?;
        self.live_state = LiveState::Idle;
        self.buffer.clear();
        info!(subscription = subscription.0, "Closing live feed");
        Some(Action::CloseLive { subscription })
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_id += 1;
        RequestId(self.next_id)
    }

    fn begin_read(&mut self, kind: ReadKind) -> RequestId {
        let request = self.next_request_id();
        self.pending.insert(
            request,
            PendingRead {
                kind,
                epoch: self.epoch,
            },
        );
        request
    }

    fn finish_read(&mut self, request: RequestId) -> Option<PendingRead> {
        let pending = self.pending.remove(&request);
        match pending {
            Some(read) => debug!(request = request.0, kind = ?read.kind, "Read finished"),
            None => debug!(request = request.0, "Ignoring result of unknown request"),
        }
        pending
    }

    fn notify(&mut self, message: String) {
        self.notification = Some(message);
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(100)
    }
}
