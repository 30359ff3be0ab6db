//! HTTP client for the market-data service's query endpoints.
//!
//! Three read-only endpoints are used: the historical range query, the
//! latest-rows query, and the CSV export. Non-2xx answers become
//! [`HandicapError::Server`]; bodies that are not an array of trade records
//! become [`HandicapError::Json`].

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::models::{LatestQuery, RangeQuery, TradeRecord};
use crate::{HandicapError, Result};

const HISTORICAL_PATH: &str = "/get-data";
const LATEST_PATH: &str = "/get-latest-orderbook";
const EXPORT_PATH: &str = "/export-data";

/// Requests taking longer than this are failed by the client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around a [`reqwest::Client`] bound to one service base URL.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MarketDataClient {
    /// Builds a client for the service at `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`HandicapError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches the records recorded between `query.start_time` and
    /// `query.end_time`.
    ///
    /// # Errors
    ///
    /// Returns a [`HandicapError`] on transport failure, a non-success
    /// status, or a body that is not an array of trade records.
    pub async fn get_data(&self, query: &RangeQuery) -> Result<Vec<TradeRecord>> {
        let body = self.get(HISTORICAL_PATH, query).await?;
        let records: Vec<TradeRecord> = serde_json::from_slice(&body)?;
        info!(records = records.len(), "Received historical data");
        Ok(records)
    }

    /// Fetches the most recent rows for the query's market and data kind.
    ///
    /// # Errors
    ///
    /// Same as [`MarketDataClient::get_data`].
    pub async fn get_latest(&self, query: &LatestQuery) -> Result<Vec<TradeRecord>> {
        let body = self.get(LATEST_PATH, query).await?;
        let records: Vec<TradeRecord> = serde_json::from_slice(&body)?;
        info!(records = records.len(), "Received latest data");
        Ok(records)
    }

    /// Downloads the CSV export for the query's range.
    ///
    /// # Errors
    ///
    /// Returns a [`HandicapError`] on transport failure or a non-success
    /// status.
    pub async fn export_data(&self, query: &RangeQuery) -> Result<Vec<u8>> {
        let body = self.get(EXPORT_PATH, query).await?;
        info!(bytes = body.len(), "Received export");
        Ok(body)
    }

    async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = url.as_str(), "Sending GET request");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HandicapError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
