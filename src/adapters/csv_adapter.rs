//! CSV file market data adapter.
//!
//! Reads `<data_dir>/<symbol>_<interval>.csv` with a header row
//! `timestamp,open,high,low,close,volume`.

use crate::domain::error::MarketDataError;
use crate::domain::ohlcv::{OhlcvBar, parse_timestamp, to_market_data};
use crate::ports::market_data_port::{MarketData, MarketDataPort};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvMarketDataAdapter {
    data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl CsvMarketDataAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.data_dir.join(format!("{}_{}.csv", symbol, interval))
    }

    fn read_bars(&self, symbol: &str, interval: &str) -> Result<Vec<OhlcvBar>, MarketDataError> {
        let path = self.csv_path(symbol, interval);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
                reason: format!("{} not found", path.display()),
            },
            _ => MarketDataError::Io(e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| MarketDataError::Malformed {
                reason: format!("{}: {}", path.display(), e),
            })?;
            let timestamp =
                parse_timestamp(&row.timestamp).ok_or_else(|| MarketDataError::Malformed {
                    reason: format!(
                        "{}: row {}: invalid timestamp '{}'",
                        path.display(),
                        line + 1,
                        row.timestamp
                    ),
                })?;
            bars.push(OhlcvBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

impl MarketDataPort for CsvMarketDataAdapter {
    fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<MarketData, MarketDataError> {
        let bars = self.read_bars(symbol, interval)?;
        if bars.is_empty() {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
                reason: "file has no rows".to_string(),
            });
        }
        let recent = &bars[bars.len().saturating_sub(limit)..];
        debug!(symbol, interval, bars = recent.len(), "read market data");
        Ok(to_market_data(recent))
    }
}
