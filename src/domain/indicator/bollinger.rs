//! Bollinger Bands.
//!
//! - Middle: SMA over the last n values
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1), so the period
//! must be at least 2.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{check_len, sma::calculate_sma};

pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

pub fn calculate_bollinger(
    prices: &[f64],
    period: usize,
    multiplier: f64,
) -> Result<BollingerBands, IndicatorError> {
    if period < 2 {
        return Err(IndicatorError::InvalidPeriod {
            indicator: "BollingerBands",
            period,
        });
    }
    check_len("BollingerBands", period, prices.len())?;

    let middle = calculate_sma(prices, period)?;
    let window = &prices[prices.len() - period..];
    let variance = window
        .iter()
        .map(|p| {
            let diff = p - middle;
            diff * diff
        })
        .sum::<f64>()
        / (period - 1) as f64;
    let stddev = variance.sqrt();

    Ok(BollingerBands {
        lower: middle - multiplier * stddev,
        middle,
        upper: middle + multiplier * stddev,
    })
}
