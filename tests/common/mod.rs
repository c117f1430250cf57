#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use stratdsl::domain::error::MarketDataError;
use stratdsl::domain::instruction::Instruction;
use stratdsl::domain::parser;
use stratdsl::domain::program::Program;
use stratdsl::ports::market_data_port::{MarketData, MarketDataPort};

pub struct MockMarketDataPort {
    pub series: MarketData,
    pub errors: HashMap<String, String>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            series: MarketData::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, name: &str, values: Vec<f64>) -> Self {
        self.series.insert(name.to_string(), values);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<MarketData, MarketDataError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MarketDataError::Unavailable {
                symbol: symbol.to_string(),
                interval: interval.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .series
            .iter()
            .map(|(name, values)| {
                let start = values.len().saturating_sub(limit);
                (name.clone(), values[start..].to_vec())
            })
            .collect())
    }
}

/// Steadily rising OHLC series of `count` bars starting at `start`.
pub fn rising_market(count: usize, start: f64) -> MockMarketDataPort {
    let close: Vec<f64> = (0..count).map(|i| start + i as f64).collect();
    let high = close.iter().map(|c| c + 1.0).collect();
    let low = close.iter().map(|c| c - 1.0).collect();
    MockMarketDataPort::new()
        .with_series("close", close)
        .with_series("high", high)
        .with_series("low", low)
}

pub fn program(value: serde_json::Value) -> Program {
    serde_json::from_value(value).unwrap()
}

pub fn compile(value: serde_json::Value) -> Instruction {
    parser::parse(&program(value)).unwrap()
}

pub fn trade(action: &str, symbol: &str, quantity: f64) -> serde_json::Value {
    serde_json::json!({"trade": {"action": action, "symbol": symbol, "quantity": quantity}})
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// CSV body with `count` hourly bars whose close rises from `start`.
pub fn csv_bars(count: usize, start: f64) -> String {
    let mut body = String::from("timestamp,open,high,low,close,volume\n");
    for i in 0..count {
        let close = start + i as f64;
        body.push_str(&format!(
            "2024-01-{:02} {:02}:00:00,{},{},{},{},{}\n",
            1 + i / 24,
            i % 24,
            close - 0.5,
            close + 1.0,
            close - 1.0,
            close,
            100 + i
        ));
    }
    body
}
