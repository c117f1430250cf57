//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime};

use crate::ports::market_data_port::MarketData;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Split bars into the named series the context expects, oldest first.
pub fn to_market_data(bars: &[OhlcvBar]) -> MarketData {
    let column = |f: fn(&OhlcvBar) -> f64| bars.iter().map(f).collect::<Vec<f64>>();
    let mut data = MarketData::new();
    data.insert("open".to_string(), column(|b| b.open));
    data.insert("high".to_string(), column(|b| b.high));
    data.insert("low".to_string(), column(|b| b.low));
    data.insert("close".to_string(), column(|b| b.close));
    data.insert("volume".to_string(), column(|b| b.volume));
    data
}
