//! Per-instrument bounded bar history, indexed by the strategy clock.

use std::collections::VecDeque;

use super::ohlcv::PriceBar;

/// Ring buffer of the most recent bars for one instrument.
///
/// One bar is pushed per clock tick (a sentinel bar when the feed had
/// nothing for that date), so position `len() - 1` always lines up with
/// the current bar.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    code: String,
    bars: VecDeque<PriceBar>,
    capacity: usize,
}

impl InstrumentSeries {
    pub fn new(code: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        InstrumentSeries {
            code: code.into(),
            bars: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn push(&mut self, bar: PriceBar) {
        if self.bars.len() == self.capacity {
            self.bars.pop_front();
        }
        self.bars.push_back(bar);
    }

    /// Bars currently retained (bounded by capacity).
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.back()
    }

    /// The last `n` bars in chronological order, or `None` if fewer are held.
    pub fn trailing(&self, n: usize) -> Option<impl Iterator<Item = &PriceBar>> {
        if n > self.bars.len() {
            return None;
        }
        Some(self.bars.range(self.bars.len() - n..))
    }

    /// Closes of the last `n` bars, sentinels included.
    pub fn trailing_closes(&self, n: usize) -> Option<Vec<f64>> {
        self.trailing(n).map(|bars| bars.map(|b| b.close).collect())
    }
}
