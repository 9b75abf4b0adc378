//! Regime readings and the model seam the engine estimates them through.

use chrono::NaiveDate;

use crate::domain::error::MomentraderError;

/// Hurst exponent of an uncorrelated random walk.
pub const RANDOM_WALK_HURST: f64 = 0.5;
/// Two-sided significance level for rejecting H = 0.5.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeEstimate {
    pub hurst: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

impl RegimeEstimate {
    /// Reading carried before the first evaluation: H = 0.5, p = 0.
    pub fn neutral() -> Self {
        RegimeEstimate {
            hurst: RANDOM_WALK_HURST,
            t_stat: 0.0,
            p_value: 0.0,
        }
    }

    /// Momentum regime: persistent and significantly so.
    pub fn is_trending(&self) -> bool {
        self.hurst > RANDOM_WALK_HURST && self.p_value < SIGNIFICANCE_LEVEL
    }
}

impl Default for RegimeEstimate {
    fn default() -> Self {
        RegimeEstimate::neutral()
    }
}

/// Per-bar regime reading, forward-filled between evaluations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimePoint {
    pub date: NaiveDate,
    pub hurst: f64,
    pub p_value: f64,
}

/// Estimates the market regime from a trailing window of closes.
///
/// Implementations receive exactly `required_history()` closes, which may
/// include `-1` sentinels where the feed had no data.
pub trait RegimeModel {
    fn required_history(&self) -> usize;

    fn estimate(&self, closes: &[f64]) -> Result<RegimeEstimate, MomentraderError>;
}

impl<M: RegimeModel + ?Sized> RegimeModel for Box<M> {
    fn required_history(&self) -> usize {
        (**self).required_history()
    }

    fn estimate(&self, closes: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
        (**self).estimate(closes)
    }
}
