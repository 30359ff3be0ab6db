//! Trade record model shared by every endpoint and the push feed.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::MarketKind;

/// A single trade or order-book entry as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeRecord {
    /// Epoch milliseconds.
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: i64,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    /// `None` for order-book rows recorded without a side.
    #[serde(rename = "order_type")]
    pub side: Option<OrderSide>,
    #[serde(rename = "market_type")]
    pub market: MarketKind,
}

impl TradeRecord {
    /// Returns the timestamp as a UTC date-time, if it is in range.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Buy or sell side of a record (wire names: `"B"` and `"S"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum OrderSide {
    #[serde(rename = "B")]
    Buy,
    #[serde(rename = "S")]
    Sell,
}

impl OrderSide {
    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            OrderSide::Buy => "Buy",
            OrderSide::Sell => "Sell",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireTimestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

/// Accepts epoch milliseconds (fractional values are rounded) or an ISO-8601
/// string. Strings without an offset are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match WireTimestamp::deserialize(deserializer)? {
        WireTimestamp::Millis(ms) => Ok(ms),
        WireTimestamp::Float(ms) if ms.is_finite() && ms.abs() < i64::MAX as f64 => {
            Ok(ms.round() as i64)
        }
        WireTimestamp::Float(ms) => Err(serde::de::Error::custom(format!(
            "timestamp out of range: {ms}"
        ))),
        WireTimestamp::Text(text) => parse_timestamp(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("unrecognized timestamp: {text}"))
        }),
    }
}

fn parse_timestamp(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    text.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserializes_numeric_timestamp() {
        let json = r#"{
            "timestamp": 1704067200000,
            "symbol": "btcusdt",
            "price": 42150.5,
            "quantity": 1.25,
            "order_type": "B",
            "market_type": "spot"
        }"#;

        let record: TradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, 1_704_067_200_000);
        assert_eq!(record.price, dec!(42150.5));
        assert_eq!(record.quantity, dec!(1.25));
        assert_eq!(record.side, Some(OrderSide::Buy));
        assert_eq!(record.market, MarketKind::Spot);
    }

    #[test]
    fn deserializes_naive_iso_timestamp_as_utc() {
        let json = r#"{
            "timestamp": "2024-01-01T00:00:01.500000",
            "symbol": "btcusdt_perp",
            "price": 42000,
            "quantity": 3,
            "order_type": "S",
            "market_type": "perp"
        }"#;

        let record: TradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, 1_704_067_201_500);
        assert_eq!(record.side, Some(OrderSide::Sell));
        assert_eq!(record.market, MarketKind::Derivative);
    }

    #[test]
    fn order_book_rows_may_lack_a_side() {
        let json = r#"{
            "timestamp": "2024-01-01T08:00:00+08:00",
            "symbol": "btcusdt",
            "price": 42000,
            "quantity": 3,
            "order_type": null,
            "market_type": "spot"
        }"#;

        let record: TradeRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.side, None);
        assert_eq!(record.timestamp, 1_704_067_200_000);
    }

    #[test]
    fn fractional_millis_are_rounded() {
        let json = r#"[
            {"timestamp": 1704067200123.0, "symbol": "btcusdt", "price": 1, "quantity": 1, "order_type": "B", "market_type": "spot"},
            {"timestamp": 1704067200123.6, "symbol": "btcusdt", "price": 1, "quantity": 1, "order_type": "S", "market_type": "spot"}
        ]"#;

        let records: Vec<TradeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].timestamp, 1_704_067_200_123);
        assert_eq!(records[1].timestamp, 1_704_067_200_124);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let json = r#"{
            "timestamp": "yesterday",
            "symbol": "btcusdt",
            "price": 1,
            "quantity": 1,
            "order_type": "B",
            "market_type": "spot"
        }"#;

        assert!(serde_json::from_str::<TradeRecord>(json).is_err());
    }
}
