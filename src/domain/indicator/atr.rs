//! Average True Range: mean of the last `period` true ranges.
//!
//! TR[i] = max(H[i]-L[i], |H[i]-C[i-1]|, |L[i]-C[i-1]|) for i >= 1, so
//! `period + 1` bars are needed.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{check_len, check_period, window_len};

/// max(high - low, |high - prev_close|, |low - prev_close|)
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

pub fn calculate_atr(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<f64, IndicatorError> {
    check_period("ATR", period)?;
    if highs.len() != lows.len() || lows.len() != closes.len() {
        return Err(IndicatorError::MismatchedSeries {
            indicator: "ATR",
            highs: highs.len(),
            lows: lows.len(),
            closes: closes.len(),
        });
    }
    check_len("ATR", window_len("ATR", period, 1)?, closes.len())?;

    let ranges: Vec<f64> = (1..closes.len())
        .map(|i| true_range(highs[i], lows[i], closes[i - 1]))
        .collect();
    check_len("ATR", period, ranges.len())?;

    let window = &ranges[ranges.len() - period..];
    Ok(window.iter().sum::<f64>() / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn huge_period_is_invalid() {
        let series = [1.0, 2.0, 3.0];
        assert!(matches!(
            calculate_atr(&series, &series, &series, usize::MAX),
            Err(IndicatorError::InvalidPeriod { indicator: "ATR", .. })
        ));
    }

    #[test]
    fn true_range_hl_dominates() {
        // high-low=20, |110-100|=10, |90-100|=10
        assert_relative_eq!(true_range(110.0, 90.0, 100.0), 20.0);
    }

    #[test]
    fn true_range_gap_up() {
        // |110-70|=40
        assert_relative_eq!(true_range(110.0, 90.0, 70.0), 40.0);
    }

    #[test]
    fn true_range_gap_down() {
        // |90-130|=40
        assert_relative_eq!(true_range(110.0, 90.0, 130.0), 40.0);
    }

    #[test]
    fn atr_of_steady_range() {
        let highs = [10.0, 11.0, 12.0, 13.0];
        let lows = [8.0, 9.0, 10.0, 11.0];
        let closes = [9.0, 10.0, 11.0, 12.0];
        let atr = calculate_atr(&highs, &lows, &closes, 3).unwrap();
        assert_relative_eq!(atr, 2.0);
    }

    #[test]
    fn atr_uses_last_window_only() {
        let highs = [10.0, 30.0, 12.0, 13.0];
        let lows = [8.0, 9.0, 10.0, 11.0];
        let closes = [9.0, 10.0, 11.0, 12.0];
        // TRs: 21, 2, 2 -> last two average 2
        let atr = calculate_atr(&highs, &lows, &closes, 2).unwrap();
        assert_relative_eq!(atr, 2.0);
    }

    #[test]
    fn atr_needs_period_plus_one_bars() {
        let err = calculate_atr(&[1.0; 3], &[1.0; 3], &[1.0; 3], 3).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                indicator: "ATR",
                required: 4,
                available: 3
            }
        );
    }

    #[test]
    fn atr_rejects_mismatched_lengths() {
        let err = calculate_atr(&[1.0; 5], &[1.0; 4], &[1.0; 5], 2).unwrap_err();
        assert!(matches!(err, IndicatorError::MismatchedSeries { lows: 4, .. }));
    }
}
