//! Bounded, newest-first buffer of trade records.
//!
//! Every insertion path runs the same admission filter: records whose
//! quantity does not exceed [`MIN_QUANTITY`] are dropped, and at most
//! [`FEED_CAPACITY`] qualifying records are kept.

use rust_decimal::Decimal;

use crate::models::{OrderSide, TradeRecord};

/// Maximum number of records held by a [`FeedBuffer`].
pub const FEED_CAPACITY: usize = 100;

/// Records must have a quantity strictly above this to be shown.
pub const MIN_QUANTITY: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Quantity above which a record is highlighted as a large print.
pub const LARGE_QUANTITY: Decimal = Decimal::TEN;

/// Applies the admission filter and keeps the first [`FEED_CAPACITY`]
/// qualifying records, preserving their order.
pub fn admit(records: impl IntoIterator<Item = TradeRecord>) -> Vec<TradeRecord> {
    records
        .into_iter()
        .filter(|record| record.quantity > MIN_QUANTITY)
        .take(FEED_CAPACITY)
        .collect()
}

/// Returns `true` if the record should be flagged as a large print.
pub fn is_large(record: &TradeRecord) -> bool {
    record.quantity > LARGE_QUANTITY
}

/// Newest-first list of trade records, never longer than [`FEED_CAPACITY`].
#[derive(Debug, Clone, Default)]
pub struct FeedBuffer {
    records: Vec<TradeRecord>,
}

impl FeedBuffer {
    pub fn new() -> Self {
        Self {
            records: Vec::with_capacity(FEED_CAPACITY),
        }
    }

    /// Replaces the contents with the admitted subset of `records`.
    pub fn replace(&mut self, records: impl IntoIterator<Item = TradeRecord>) {
        self.records = admit(records);
    }

    /// Puts the admitted subset of `records` in front of the current
    /// contents and drops whatever falls past the capacity.
    ///
    /// Returns the number of records admitted from the batch.
    pub fn prepend(&mut self, records: impl IntoIterator<Item = TradeRecord>) -> usize {
        let mut merged = admit(records);
        let admitted = merged.len();
        merged.append(&mut self.records);
        merged.truncate(FEED_CAPACITY);
        self.records = merged;
        admitted
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    /// Buy-side records in buffer order.
    pub fn buys(&self) -> impl Iterator<Item = &TradeRecord> {
        self.side(OrderSide::Buy)
    }

    /// Sell-side records in buffer order.
    pub fn sells(&self) -> impl Iterator<Item = &TradeRecord> {
        self.side(OrderSide::Sell)
    }

    fn side(&self, side: OrderSide) -> impl Iterator<Item = &TradeRecord> {
        self.records
            .iter()
            .filter(move |record| record.side == Some(side))
    }
}
