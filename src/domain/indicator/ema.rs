//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = P[i]*k + EMA[i-1]*(1-k).

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{check_len, check_period};

/// Latest EMA value. Equals the seed when `prices.len() == period`.
pub fn calculate_ema(prices: &[f64], period: usize) -> Result<f64, IndicatorError> {
    check_period("EMA", period)?;
    check_len("EMA", period, prices.len())?;
    let seed = prices[..period].iter().sum::<f64>() / period as f64;
    let k = smoothing(period);
    Ok(prices[period..]
        .iter()
        .fold(seed, |ema, price| price * k + ema * (1.0 - k)))
}

/// Every EMA value after the seed, oldest first.
pub fn calculate_ema_series(prices: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    check_period("EMA", period)?;
    check_len("EMA", period, prices.len())?;
    let k = smoothing(period);
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    let mut values = Vec::with_capacity(prices.len() - period);
    for price in &prices[period..] {
        ema = price * k + ema * (1.0 - k);
        values.push(ema);
    }
    Ok(values)
}

fn smoothing(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}
