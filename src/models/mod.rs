//! Shared models for the market-data service.
//!
//! Contains the query vocabulary (symbols, market kinds, data kinds), the
//! query-string shapes sent to each HTTP endpoint, and the push
//! subscription message.

pub mod trade;

use serde::{Deserialize, Serialize};

pub use trade::{OrderSide, TradeRecord};

/// Instruments the service records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    #[default]
    #[serde(rename = "btcusdt")]
    BtcUsdt,
    #[serde(rename = "btcusdt_perp")]
    BtcUsdtPerp,
}

impl Symbol {
    pub const ALL: [Symbol; 2] = [Symbol::BtcUsdt, Symbol::BtcUsdtPerp];

    /// Returns the wire-format symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::BtcUsdt => "btcusdt",
            Symbol::BtcUsdtPerp => "btcusdt_perp",
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            Symbol::BtcUsdt => "BTCUSDT",
            Symbol::BtcUsdtPerp => "BTCUSDT_PERP",
        }
    }
}

/// Spot or derivative market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketKind {
    #[default]
    #[serde(rename = "spot")]
    Spot,
    /// Perpetual contracts (wire name: `"perp"`).
    #[serde(rename = "perp")]
    Derivative,
}

impl MarketKind {
    pub const ALL: [MarketKind; 2] = [MarketKind::Spot, MarketKind::Derivative];

    /// Returns the wire-format market type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Spot => "spot",
            MarketKind::Derivative => "perp",
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            MarketKind::Spot => "Spot",
            MarketKind::Derivative => "Perp",
        }
    }
}

/// Which table of the service a query reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    #[default]
    #[serde(rename = "trades")]
    Trades,
    #[serde(rename = "orderbook")]
    OrderBook,
}

impl DataKind {
    pub const ALL: [DataKind; 2] = [DataKind::Trades, DataKind::OrderBook];

    /// Returns the wire-format data type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Trades => "trades",
            DataKind::OrderBook => "orderbook",
        }
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Trades => "Trades",
            DataKind::OrderBook => "Order Book",
        }
    }

    /// File name used for CSV exports of this kind.
    pub fn export_file_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

/// Query parameters edited by the user.
///
/// Start and end are kept as the raw `YYYY-MM-DDTHH:MM` strings the service
/// parses; an empty string means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub start_time: String,
    pub end_time: String,
    pub symbol: Symbol,
    pub market: MarketKind,
    pub data_kind: DataKind,
}

impl QueryParams {
    /// Returns `true` when both ends of the time range are filled in.
    pub fn has_time_range(&self) -> bool {
        !self.start_time.is_empty() && !self.end_time.is_empty()
    }

    /// Builds the query string for the historical and export endpoints.
    pub fn range_query(&self) -> RangeQuery {
        RangeQuery {
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            symbol: self.symbol,
            market_type: self.market,
            data_type: self.data_kind,
        }
    }

    /// Builds the query string for the latest-snapshot endpoint.
    pub fn latest_query(&self, depth: u32) -> LatestQuery {
        LatestQuery {
            market_type: self.market,
            data_type: self.data_kind,
            symbol: self.symbol,
            depth,
        }
    }

    /// Builds the subscribe message sent when a push connection opens.
    pub fn subscribe_request(&self) -> SubscribeRequest {
        SubscribeRequest::new(self.symbol, self.market, self.data_kind)
    }
}

/// Query string of `/get-data` and `/export-data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeQuery {
    pub start_time: String,
    pub end_time: String,
    pub symbol: Symbol,
    pub market_type: MarketKind,
    pub data_type: DataKind,
}

/// Query string of `/get-latest-orderbook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestQuery {
    pub market_type: MarketKind,
    pub data_type: DataKind,
    pub symbol: Symbol,
    pub depth: u32,
}

/// The message sent on a push connection right after it opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    #[serde(rename = "type")]
    pub tpe: String,
    pub symbol: Symbol,
    pub market_type: MarketKind,
    pub data_type: DataKind,
}

impl SubscribeRequest {
    pub fn new(symbol: Symbol, market_type: MarketKind, data_type: DataKind) -> Self {
        Self {
            tpe: "subscribe".to_string(),
            symbol,
            market_type,
            data_type,
        }
    }
}

/// Parses a `YYYY-MM-DDTHH:MM` query time, the only format the service
/// accepts for `start_time` and `end_time`.
pub fn parse_query_time(value: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok()
}
