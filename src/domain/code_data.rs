//! Loaded instrument histories and the unified, date-aligned bar feed.

use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub bars: Vec<PriceBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl CodeData {
    pub fn new(code: String, bars: Vec<PriceBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            bars,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }
}

/// Every instrument's bar for one date. Instruments absent from the feed on
/// that date carry a sentinel bar.
#[derive(Debug, Clone)]
pub struct MarketSlice {
    pub date: NaiveDate,
    pub bars: HashMap<String, PriceBar>,
}

impl MarketSlice {
    pub fn new(date: NaiveDate) -> Self {
        MarketSlice {
            date,
            bars: HashMap::new(),
        }
    }

    pub fn with_bar(mut self, bar: PriceBar) -> Self {
        self.bars.insert(bar.code.clone(), bar);
        self
    }

    pub fn get(&self, code: &str) -> Option<&PriceBar> {
        self.bars.get(code)
    }

    /// Closing prices of the tradeable bars in this slice.
    pub fn price_map(&self) -> HashMap<String, f64> {
        self.bars
            .iter()
            .filter(|(_, bar)| bar.is_tradeable())
            .map(|(code, bar)| (code.clone(), bar.close))
            .collect()
    }
}

pub fn build_unified_timeline(codes: &[CodeData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = codes
        .iter()
        .flat_map(|cd| cd.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

/// Reindex every instrument onto the unified timeline, filling gaps with
/// the `-1` sentinel bar.
pub fn align_series(codes: &[CodeData]) -> Vec<MarketSlice> {
    build_unified_timeline(codes)
        .into_iter()
        .map(|date| {
            let bars = codes
                .iter()
                .map(|cd| {
                    let bar = cd
                        .get_bar(date)
                        .cloned()
                        .unwrap_or_else(|| PriceBar::missing(&cd.code, date));
                    (cd.code.clone(), bar)
                })
                .collect();
            MarketSlice { date, bars }
        })
        .collect()
}
