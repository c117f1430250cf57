//! Market data port trait.

use std::collections::BTreeMap;

use crate::domain::error::MarketDataError;

/// Series name ("open", "high", "low", "close", "volume") to values, oldest first.
pub type MarketData = BTreeMap<String, Vec<f64>>;

pub trait MarketDataPort {
    /// Fetch at most `limit` of the most recent bars for `symbol` at `interval`.
    /// The result must contain a "close" series.
    fn fetch(&self, symbol: &str, interval: &str, limit: usize)
    -> Result<MarketData, MarketDataError>;
}
