//! Technical indicators computed over a slice of closing prices.
//!
//! Each calculator returns one entry per input close; warmup entries are
//! `None`. Sentinel closes must be filtered out by the caller.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdPoint};
pub use rsi::calculate_rsi;

/// The most recent valid value of an indicator series.
pub fn last_valid<T: Copy>(values: &[Option<T>]) -> Option<T> {
    values.last().copied().flatten()
}
