#![allow(dead_code)]

use chrono::NaiveDate;
use momentrader::domain::backtest::BacktestConfig;
use momentrader::domain::code_data::MarketSlice;
use momentrader::domain::error::MomentraderError;
pub use momentrader::domain::ohlcv::PriceBar;
use momentrader::domain::regime::{RegimeEstimate, RegimeModel};
use momentrader::domain::strategy::StrategyParams;
use momentrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MomentraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(MomentraderError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()),
            None => Err(MomentraderError::NoData {
                code: code.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, MomentraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Trading day `i` of the synthetic calendar.
pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64)
}

pub fn make_bar(code: &str, i: usize, close: f64, volume: f64) -> PriceBar {
    PriceBar {
        code: code.to_string(),
        date: day(i),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

/// `n` bars whose close at day `i` is `close(i)`, volume 1000.
pub fn bars_from(code: &str, n: usize, close: impl Fn(usize) -> f64) -> Vec<PriceBar> {
    (0..n).map(|i| make_bar(code, i, close(i), 1000.0)).collect()
}

pub fn make_slice(i: usize, closes: &[(&str, f64)]) -> MarketSlice {
    closes.iter().fold(MarketSlice::new(day(i)), |s, (code, close)| {
        s.with_bar(make_bar(code, i, *close, 1000.0))
    })
}

/// Short windows so scenarios fit in a few dozen bars.
pub fn small_params() -> StrategyParams {
    StrategyParams {
        momentum_window: 5,
        total_window: 20,
        long_percentile: 0.5,
        num_stocks: 4,
        rsi_window: 14,
        ..StrategyParams::default()
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: day(0),
        end_date: day(365),
        initial_capital: 100_000.0,
        commission_per_trade: 0.0,
        commission_pct: 0.0,
        slippage_pct: 0.0,
        risk_free_rate: 0.0,
        benchmark: None,
    }
}

pub fn trending() -> RegimeEstimate {
    RegimeEstimate {
        hurst: 0.7,
        t_stat: 4.0,
        p_value: 0.001,
    }
}

pub struct FixedRegime {
    pub history: usize,
    pub estimate: RegimeEstimate,
}

impl RegimeModel for FixedRegime {
    fn required_history(&self) -> usize {
        self.history
    }

    fn estimate(&self, _closes: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
        Ok(self.estimate)
    }
}

/// Trending while the regime instrument's last close is above `threshold`,
/// mean-reverting (H = 0.3) otherwise.
pub struct ThresholdRegime {
    pub history: usize,
    pub threshold: f64,
}

impl RegimeModel for ThresholdRegime {
    fn required_history(&self) -> usize {
        self.history
    }

    fn estimate(&self, closes: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
        let last = closes.last().copied().unwrap_or(0.0);
        if last > self.threshold {
            Ok(trending())
        } else {
            Ok(RegimeEstimate {
                hurst: 0.3,
                t_stat: -4.0,
                p_value: 0.001,
            })
        }
    }
}
