//! Universe handling: code-list parsing, feed loading, and the per-rebalance
//! dollar-volume selector.

use crate::domain::code_data::CodeData;
use crate::domain::error::MomentraderError;
use crate::domain::series::InstrumentSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if seen.contains(&code) {
            return Err(UniverseError::DuplicateCode(code));
        }
        seen.insert(code.clone());
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone)]
pub struct LoadedUniverse {
    /// Instruments with data, in configured order.
    pub data: Vec<CodeData>,
    pub skipped: Vec<String>,
}

impl LoadedUniverse {
    pub fn codes(&self) -> Vec<String> {
        self.data.iter().map(|cd| cd.code.clone()).collect()
    }
}

/// Fetch every configured code, skipping those the feed has nothing for.
pub fn load_universe(
    data_port: &dyn DataPort,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<LoadedUniverse, MomentraderError> {
    let mut data = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        match data_port.fetch_bars(code, start_date, end_date) {
            Ok(bars) if bars.is_empty() => {
                warn!(code = %code, "skipping instrument: no bars in date range");
                skipped.push(code.clone());
            }
            Ok(bars) => {
                info!(code = %code, bars = bars.len(), "loaded instrument");
                data.push(CodeData::new(code.clone(), bars));
            }
            Err(MomentraderError::NoData { .. }) => {
                warn!(code = %code, "skipping instrument: no data");
                skipped.push(code.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if data.is_empty() {
        return Err(MomentraderError::NoData {
            code: "all".to_string(),
        });
    }

    Ok(LoadedUniverse { data, skipped })
}

/// Top `n` instruments by trailing `window`-bar dollar volume.
///
/// Any non-tradeable bar in the window (sentinel, zero volume, non-positive
/// close) disqualifies the instrument, as does holding fewer than `window`
/// bars. Ties keep input order.
pub fn select_universe(series: &[InstrumentSeries], window: usize, n: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, f64)> = series
        .iter()
        .filter_map(|s| {
            let mut dollar_volume = 0.0;
            for bar in s.trailing(window)? {
                if !bar.is_tradeable() {
                    return None;
                }
                dollar_volume += bar.dollar_volume();
            }
            Some((s.code(), dollar_volume))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(n)
        .map(|(code, _)| code.to_string())
        .collect()
}
