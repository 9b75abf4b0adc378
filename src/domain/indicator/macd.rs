//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 closes

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Option<MacdPoint>> {
    if closes.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return Vec::new();
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f.unwrap_or(0.0) - s.unwrap_or(0.0))
        .collect();

    let macd_warmup = slow - 1;
    let signal_warmup = macd_warmup + signal_period - 1;
    let k = 2.0 / (signal_period as f64 + 1.0);

    let mut values = vec![None; closes.len()];
    if closes.len() <= signal_warmup {
        return values;
    }

    let seed: f64 = macd_line[macd_warmup..=signal_warmup].iter().sum();
    let mut signal_ema = seed / signal_period as f64;

    for i in signal_warmup..closes.len() {
        if i > signal_warmup {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
        }
        values[i] = Some(MacdPoint {
            line: macd_line[i],
            signal: signal_ema,
            histogram: macd_line[i] - signal_ema,
        });
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd(&rising(40), DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        for (i, point) in series.iter().enumerate().take(warmup) {
            assert!(point.is_none(), "index {} should be warmup", i);
        }
        assert!(series[warmup].is_some());
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd(&rising(40), DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
        for p in series.into_iter().flatten() {
            assert!((p.histogram - (p.line - p.signal)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        let series = calculate_macd(&closes, 3, 5, 2);
        let ema_fast = calculate_ema(&closes, 3);
        let ema_slow = calculate_ema(&closes, 5);

        for (i, point) in series.iter().enumerate() {
            if let Some(p) = point {
                let expected = ema_fast[i].unwrap() - ema_slow[i].unwrap();
                assert!((p.line - expected).abs() < f64::EPSILON, "index {}", i);
            }
        }
    }

    #[test]
    fn macd_short_input_is_all_warmup() {
        let series = calculate_macd(&rising(10), 5, 10, 3);
        assert_eq!(series.len(), 10);
        assert!(series.iter().all(Option::is_none));
    }

    #[test]
    fn macd_empty_or_zero_period() {
        assert!(calculate_macd(&[], 12, 26, 9).is_empty());
        assert!(calculate_macd(&rising(3), 0, 26, 9).is_empty());
        assert!(calculate_macd(&rising(3), 12, 0, 9).is_empty());
        assert!(calculate_macd(&rising(3), 12, 26, 0).is_empty());
    }

    #[test]
    fn macd_custom_parameters_warmup() {
        let series = calculate_macd(&rising(20), 5, 10, 3);
        let warmup = 10 - 1 + 3 - 1;
        assert!(series[warmup - 1].is_none());
        assert!(series[warmup].is_some());
    }
}
