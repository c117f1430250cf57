//! Simple Moving Average: mean of the last `period` values.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{check_len, check_period};

pub fn calculate_sma(prices: &[f64], period: usize) -> Result<f64, IndicatorError> {
    check_period("SMA", period)?;
    check_len("SMA", period, prices.len())?;
    let window = &prices[prices.len() - period..];
    Ok(window.iter().sum::<f64>() / period as f64)
}
