//! Property tests over indicators, the validator/parser pair and trade
//! recording.

mod common;

use common::*;
use proptest::prelude::*;
use serde_json::json;
use std::time::{Duration, Instant};
use stratdsl::domain::context::Context;
use stratdsl::domain::error::IndicatorError;
use stratdsl::domain::indicator::{
    calculate_atr, calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi,
    calculate_sma,
};
use stratdsl::domain::parser;
use stratdsl::domain::program::InstructionRecord;
use stratdsl::domain::validator;
use stratdsl::domain::value::Value;
use stratdsl::domain::wait::Wait;

fn insufficient<T>(result: Result<T, IndicatorError>) -> bool {
    matches!(result, Err(IndicatorError::InsufficientData { .. }))
}

fn any_record() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(json!({"if": "x > 0"})),
        Just(json!({"if": "x >"})),
        Just(json!({"if": 7})),
        Just(json!({"end": true})),
        Just(json!({"operation": "x += 1"})),
        Just(json!({"operation": "x = "})),
        Just(json!({"indicator": {"name": "SMA", "source": "close", "period": 3, "var": "s"}})),
        Just(json!({"indicator": {"name": "VWAP"}})),
        Just(json!({"trade": {"action": "buy", "symbol": "A", "quantity": 1}})),
        Just(json!({"trade": {"action": "hold"}})),
        Just(json!({"wait": "3s"})),
        Just(json!({"wait": "3d"})),
        Just(json!({"note": "ignored"})),
    ]
}

proptest! {
    #[test]
    fn short_series_never_yield_partial_results(
        prices in prop::collection::vec(1.0f64..1000.0, 0..20),
        extra in 1usize..10,
    ) {
        let period = prices.len() + extra;
        prop_assert!(insufficient(calculate_sma(&prices, period)));
        prop_assert!(insufficient(calculate_ema(&prices, period)));
        prop_assert!(insufficient(calculate_rsi(&prices, period)));
        prop_assert!(insufficient(calculate_bollinger(&prices, period.max(2), 2.0)));
        prop_assert!(insufficient(calculate_atr(&prices, &prices, &prices, period)));
        prop_assert!(insufficient(calculate_macd(&prices, 2, period, 2)));
    }

    #[test]
    fn sma_is_within_window_bounds(
        prices in prop::collection::vec(1.0f64..1000.0, 1..60),
        period in 1usize..20,
    ) {
        prop_assume!(period <= prices.len());
        let window = &prices[prices.len() - period..];
        let sma = calculate_sma(&prices, period).unwrap();
        let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(sma >= min - 1e-9 && sma <= max + 1e-9);
    }

    #[test]
    fn clean_validation_implies_clean_parse(
        records in prop::collection::vec(any_record(), 0..12),
    ) {
        let program: Vec<InstructionRecord> =
            records.into_iter().map(InstructionRecord::from).collect();
        if validator::validate(&program).is_valid() {
            prop_assert!(parser::parse(&program).is_ok());
        }
    }

    #[test]
    fn trades_preserve_execution_order(
        quantities in prop::collection::vec(1u32..1000, 0..15),
    ) {
        let records: Vec<serde_json::Value> = quantities
            .iter()
            .map(|q| trade("buy", "BTCUSDT", f64::from(*q)))
            .collect();
        let root = compile(serde_json::Value::Array(records.clone()));
        let mut ctx = Context::new();
        root.execute(&mut ctx).unwrap();

        let expected: Vec<Value> = records
            .into_iter()
            .map(|r| Value::from(r["trade"].clone()))
            .collect();
        prop_assert_eq!(ctx.trades(), expected.as_slice());
    }

    #[test]
    fn waits_never_below_floor(seconds in -100.0f64..100.0) {
        let wait = Wait::from_seconds(seconds);
        prop_assert!(wait.seconds >= 2.0);
        prop_assert_eq!(wait.clamped, seconds < 2.0);
    }
}

#[test]
fn three_second_wait_blocks() {
    let root = compile(json!([{"wait": "3s"}]));
    let mut ctx = Context::new();
    let started = Instant::now();
    root.execute(&mut ctx).unwrap();
    assert!(started.elapsed() >= Duration::from_secs(3));
}
