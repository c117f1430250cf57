//! Technical indicator algorithms over plain price slices.
//!
//! Every function is pure and returns the latest indicator value, failing with
//! [`IndicatorError`] rather than producing a partial result when the input
//! window is too short.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::calculate_atr;
pub use bollinger::{BollingerBands, calculate_bollinger};
pub use ema::{calculate_ema, calculate_ema_series};
pub use macd::{MacdResult, calculate_macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::domain::error::IndicatorError;
use std::fmt;
use std::str::FromStr;

/// The indicators an `indicator` instruction may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Ema,
    Atr,
    BollingerBands,
    Macd,
    Rsi,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 6] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Atr,
        IndicatorKind::BollingerBands,
        IndicatorKind::Macd,
        IndicatorKind::Rsi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::BollingerBands => "BollingerBands",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Rsi => "RSI",
        }
    }

    /// Payload keys a well-formed instruction for this indicator must carry.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            IndicatorKind::Macd => &["fast", "slow", "signal", "source", "var"],
            _ => &["period", "source", "var"],
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

pub(crate) fn check_period(indicator: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod { indicator, period });
    }
    Ok(())
}

/// `period + extra`, or `InvalidPeriod` when that does not fit in a `usize`.
pub(crate) fn window_len(
    indicator: &'static str,
    period: usize,
    extra: usize,
) -> Result<usize, IndicatorError> {
    period
        .checked_add(extra)
        .ok_or(IndicatorError::InvalidPeriod { indicator, period })
}

pub(crate) fn check_len(
    indicator: &'static str,
    required: usize,
    available: usize,
) -> Result<(), IndicatorError> {
    if available < required {
        return Err(IndicatorError::InsufficientData {
            indicator,
            required,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_name() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.name().parse::<IndicatorKind>(), Ok(kind));
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("sma".parse::<IndicatorKind>().is_err());
        assert!("Bollinger".parse::<IndicatorKind>().is_err());
    }

    #[test]
    fn macd_requires_its_own_keys() {
        assert!(IndicatorKind::Macd.required_keys().contains(&"signal"));
        assert!(!IndicatorKind::Macd.required_keys().contains(&"period"));
        assert_eq!(IndicatorKind::Rsi.required_keys(), &["period", "source", "var"]);
    }
}
