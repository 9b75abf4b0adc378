//! Price bar representation.

use chrono::NaiveDate;

/// Sentinel written by the data feed for "no market data on this date".
pub const MISSING_SENTINEL: f64 = -1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// A placeholder bar for a date on which the instrument did not trade.
    pub fn missing(code: &str, date: NaiveDate) -> Self {
        PriceBar {
            code: code.to_string(),
            date,
            open: MISSING_SENTINEL,
            high: MISSING_SENTINEL,
            low: MISSING_SENTINEL,
            close: MISSING_SENTINEL,
            volume: MISSING_SENTINEL,
        }
    }

    /// Non-positive close or volume marks the bar as not tradeable.
    pub fn is_tradeable(&self) -> bool {
        self.close > 0.0 && self.volume > 0.0
    }

    /// close * volume
    pub fn dollar_volume(&self) -> f64 {
        self.close * self.volume
    }
}
