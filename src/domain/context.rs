//! Mutable variable store for one strategy run.

use crate::domain::value::{Value, Variables};
use crate::ports::market_data_port::MarketData;

/// Name of the list that trade instructions append to.
pub const TRADES_KEY: &str = "trades";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    variables: Variables,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Merge market-data series in; later keys overwrite existing ones.
    pub fn update(&mut self, data: MarketData) {
        for (name, series) in data {
            self.variables.insert(name, Value::Series(series));
        }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    /// Series stored under `name`, empty when absent.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        match self.variables.get(name) {
            None => Some(&[]),
            Some(value) => value.as_series(),
        }
    }

    /// Append a trade payload, creating the list on first use.
    pub fn record_trade(&mut self, payload: Value) {
        match self.variables.get_mut(TRADES_KEY) {
            Some(Value::List(trades)) => trades.push(payload),
            _ => {
                self.variables
                    .insert(TRADES_KEY.to_string(), Value::List(vec![payload]));
            }
        }
    }

    pub fn trades(&self) -> &[Value] {
        match self.variables.get(TRADES_KEY) {
            Some(Value::List(trades)) => trades,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut ctx = Context::new();
        assert!(!ctx.contains("x"));
        ctx.set("x", Value::Number(1.0));
        assert_eq!(ctx.get("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn update_overwrites_series() {
        let mut ctx = Context::new();
        ctx.set("close", Value::Number(0.0));
        ctx.set("x", Value::Bool(true));
        let mut data = MarketData::new();
        data.insert("close".into(), vec![1.0, 2.0]);
        ctx.update(data);
        assert_eq!(ctx.get("close"), Some(&Value::Series(vec![1.0, 2.0])));
        assert_eq!(ctx.get("x"), Some(&Value::Bool(true)));
    }

    #[test]
    fn trades_accumulate_in_order() {
        let mut ctx = Context::new();
        assert!(ctx.trades().is_empty());
        ctx.record_trade(Value::Text("first".into()));
        ctx.record_trade(Value::Text("second".into()));
        assert_eq!(
            ctx.trades(),
            &[Value::Text("first".into()), Value::Text("second".into())]
        );
    }

    #[test]
    fn non_list_trades_is_replaced() {
        let mut ctx = Context::new();
        ctx.set(TRADES_KEY, Value::Number(3.0));
        ctx.record_trade(Value::Bool(true));
        assert_eq!(ctx.trades(), &[Value::Bool(true)]);
    }

    #[test]
    fn absent_series_reads_empty() {
        let mut ctx = Context::new();
        assert_eq!(ctx.series("close"), Some(&[][..]));
        ctx.set("close", Value::Text("x".into()));
        assert_eq!(ctx.series("close"), None);
    }
}
