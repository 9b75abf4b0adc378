//! Momentum signal library.
//!
//! Every signal is scored over the trailing `total_window` closes of one
//! instrument. Short or non-finite inputs score `0.0`, which the ranking
//! stage treats as "not eligible".

use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::{calculate_macd, calculate_rsi, last_valid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// `100 - RSI(rsi_window)`: oversold instruments score high.
    Rsi,
    /// MACD histogram at the most recent close.
    Macd,
    /// Volatility-normalised return spread (legacy momentum factor).
    ReturnVolatility,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Rsi => write!(f, "rsi"),
            SignalKind::Macd => write!(f, "macd"),
            SignalKind::ReturnVolatility => write!(f, "return_volatility"),
        }
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rsi" => Ok(SignalKind::Rsi),
            "macd" => Ok(SignalKind::Macd),
            "return_volatility" => Ok(SignalKind::ReturnVolatility),
            other => Err(format!("unknown signal '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub kind: SignalKind,
    pub rsi_window: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub momentum_window: usize,
    pub total_window: usize,
}

impl SignalParams {
    /// Score one instrument. Sentinel closes (<= 0) are dropped first.
    pub fn score(&self, closes: &[f64]) -> f64 {
        let start = closes.len().saturating_sub(self.total_window);
        let valid: Vec<f64> = closes[start..]
            .iter()
            .copied()
            .filter(|&c| c > 0.0)
            .collect();

        let value = match self.kind {
            SignalKind::Rsi => inverted_rsi(&valid, self.rsi_window),
            SignalKind::Macd => {
                macd_histogram(&valid, self.macd_fast, self.macd_slow, self.macd_signal)
            }
            SignalKind::ReturnVolatility => {
                return_volatility_momentum(&valid, self.momentum_window, self.total_window)
            }
        };

        if value.is_finite() { value } else { 0.0 }
    }
}

pub fn inverted_rsi(closes: &[f64], window: usize) -> f64 {
    if window == 0 || closes.len() < window + 1 {
        return 0.0;
    }
    match last_valid(&calculate_rsi(closes, window)) {
        Some(rsi) => 100.0 - rsi,
        None => 0.0,
    }
}

pub fn macd_histogram(closes: &[f64], fast: usize, slow: usize, signal: usize) -> f64 {
    last_valid(&calculate_macd(closes, fast, slow, signal))
        .map(|p| p.histogram)
        .unwrap_or(0.0)
}

/// `(Δ% before the momentum window - Δ% inside it) / stdev(daily returns)`
/// over the last `total_window` closes.
pub fn return_volatility_momentum(
    closes: &[f64],
    momentum_window: usize,
    total_window: usize,
) -> f64 {
    if total_window < 2 || closes.len() < total_window || momentum_window == 0 {
        return 0.0;
    }

    let window = &closes[closes.len() - total_window..];
    let split = total_window.saturating_sub(momentum_window);

    let past = &window[..split];
    let recent = &window[split..];

    let pct_change = |s: &[f64]| match (s.first(), s.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first,
        _ => 0.0,
    };

    let returns: Vec<f64> = window.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let std_dev = sample_std(&returns);

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    (pct_change(past) - pct_change(recent)) / std_dev
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}
