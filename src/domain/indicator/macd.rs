//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA-series(fast) - EMA-series(slow), aligned on the most recent values
//! Signal Line = EMA(signal) of the MACD Line
//! Histogram = last MACD - Signal
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    calculate_ema, calculate_ema_series, check_period, window_len,
};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn calculate_macd(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Result<MacdResult, IndicatorError> {
    check_period("MACD", fast)?;
    check_period("MACD", slow)?;
    check_period("MACD", signal)?;

    let longest = fast.max(slow);
    let required = window_len("MACD", signal, longest)?;
    if prices.len() < longest || prices.len() - longest < signal {
        return Err(IndicatorError::InsufficientData {
            indicator: "MACD",
            required,
            available: prices.len(),
        });
    }

    let fast_series = calculate_ema_series(prices, fast)?;
    let slow_series = calculate_ema_series(prices, slow)?;
    let len = fast_series.len().min(slow_series.len());
    let macd_series: Vec<f64> = fast_series[fast_series.len() - len..]
        .iter()
        .zip(&slow_series[slow_series.len() - len..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_value = calculate_ema(&macd_series, signal)?;
    let macd = macd_series[macd_series.len() - 1];
    Ok(MacdResult {
        macd,
        signal: signal_value,
        histogram: macd - signal_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear(n: usize) -> Vec<f64> {
        (1..=n).map(|v| v as f64).collect()
    }

    #[test]
    fn window_sum_overflow_is_invalid() {
        assert!(matches!(
            calculate_macd(&linear(10), 3, usize::MAX, 2),
            Err(IndicatorError::InvalidPeriod { indicator: "MACD", .. })
        ));
        assert!(matches!(
            calculate_macd(&linear(10), usize::MAX - 1, 3, 1),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn linear_prices_give_constant_macd() {
        // EMA(3) lags price by 1, EMA(5) by 2, so the line is flat at 1.
        let result = calculate_macd(&linear(9), 3, 5, 3).unwrap();
        assert_relative_eq!(result.macd, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.signal, 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.histogram, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_prices_give_zero() {
        let result = calculate_macd(&[50.0; 40], DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL).unwrap();
        assert_relative_eq!(result.macd, 0.0);
        assert_relative_eq!(result.signal, 0.0);
        assert_relative_eq!(result.histogram, 0.0);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let result = calculate_macd(&prices, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL).unwrap();
        assert_relative_eq!(result.histogram, result.macd - result.signal, epsilon = 1e-12);
    }

    #[test]
    fn minimum_length_seeds_signal_exactly() {
        // 5 + 3 prices leave a 3-value MACD line
        assert!(calculate_macd(&linear(8), 3, 5, 3).is_ok());
        let err = calculate_macd(&linear(7), 3, 5, 3).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                indicator: "MACD",
                required: 8,
                available: 7
            }
        );
    }

    #[test]
    fn fast_slower_than_slow_still_aligns() {
        let result = calculate_macd(&linear(9), 5, 3, 3).unwrap();
        assert_relative_eq!(result.macd, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn shorter_than_slow_fails() {
        assert!(matches!(
            calculate_macd(&linear(4), 3, 5, 1),
            Err(IndicatorError::InsufficientData { .. })
        ));
    }

    #[test]
    fn zero_period_rejected() {
        assert!(matches!(
            calculate_macd(&linear(40), 0, 26, 9),
            Err(IndicatorError::InvalidPeriod { .. })
        ));
    }
}
