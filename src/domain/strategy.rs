//! Strategy parameters for the momentum rotation.

use crate::domain::allocation::{PositivityFilter, RankingParams, Weighting};
use crate::domain::hurst::DEFAULT_HURST_POWER;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::signal::{SignalKind, SignalParams};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    /// Rebalance cadence in bars.
    pub momentum_window: usize,
    /// Minimum history, signal lookback and dollar-volume lookback.
    pub total_window: usize,
    pub long_percentile: f64,
    /// Universe size N.
    pub num_stocks: usize,
    pub hurst_power: u32,
    pub rsi_window: usize,
    pub signal: SignalKind,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub positivity_filter: PositivityFilter,
    pub weighting: Weighting,
    pub regime_filter: bool,
    /// Instrument the regime is estimated on; `None` means the first code.
    pub regime_code: Option<String>,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            momentum_window: 14,
            total_window: 252,
            long_percentile: 0.38,
            num_stocks: 16,
            hurst_power: DEFAULT_HURST_POWER,
            rsi_window: 14,
            signal: SignalKind::Rsi,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            positivity_filter: PositivityFilter::AfterCut,
            weighting: Weighting::Proportional,
            regime_filter: true,
            regime_code: None,
        }
    }
}

impl StrategyParams {
    pub fn signal_params(&self) -> SignalParams {
        SignalParams {
            kind: self.signal,
            rsi_window: self.rsi_window,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            momentum_window: self.momentum_window,
            total_window: self.total_window,
        }
    }

    pub fn ranking_params(&self) -> RankingParams {
        RankingParams {
            long_percentile: self.long_percentile,
            positivity_filter: self.positivity_filter,
            weighting: self.weighting,
        }
    }

    /// True when `counter` is a rebalance boundary.
    pub fn is_boundary(&self, counter: usize) -> bool {
        self.momentum_window > 0
            && counter % self.momentum_window == 0
            && counter >= self.total_window
    }
}
