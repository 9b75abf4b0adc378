//! Hurst exponent estimation by rescaled-range (R/S) analysis.
//!
//! Over a window of `2^power + 1` closes:
//!   1. Simple returns r[t] = p[t]/p[t-1] - 1 (2^power values).
//!   2. For each level p in 2..power, split the returns into 2^(power-p)
//!      contiguous subsamples of length m = 2^p.
//!   3. Per subsample: range of the cumulative mean-deviation series divided
//!      by the population standard deviation.
//!   4. Average R/S across the level's subsamples, take log2.
//!   5. OLS of log2(avg R/S) on p. The slope is H; a t-test of H = 0.5 with
//!      (levels - 2) residual degrees of freedom gives the p-value.
//!
//! R/S is biased upward on short windows: i.i.d. returns over the default
//! 256-return window read around H = 0.59, not 0.5. The t-test is against
//! 0.5 regardless, so a random walk often clears the gate.

use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::trace;

use crate::domain::error::MomentraderError;
use crate::domain::regime::{RegimeEstimate, RegimeModel, RANDOM_WALK_HURST};

pub const DEFAULT_HURST_POWER: u32 = 8;
/// Below this there are fewer than three regression points.
pub const MIN_HURST_POWER: u32 = 5;
pub const MAX_HURST_POWER: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HurstEstimator {
    power: u32,
}

impl Default for HurstEstimator {
    fn default() -> Self {
        HurstEstimator::new(DEFAULT_HURST_POWER)
    }
}

impl HurstEstimator {
    pub fn new(power: u32) -> Self {
        HurstEstimator { power }
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    /// Number of closes consumed per estimate.
    pub fn window_len(&self) -> usize {
        (1usize << self.power) + 1
    }

    /// Estimate over the trailing `window_len()` closes of `prices`.
    pub fn estimate(&self, prices: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
        let n = self.window_len();
        if prices.len() < n {
            return Err(MomentraderError::InsufficientHistory {
                available: prices.len(),
                required: n,
            });
        }

        let window = &prices[prices.len() - n..];
        if let Some(gap) = window.iter().rposition(|&p| !(p > 0.0 && p.is_finite())) {
            return Err(MomentraderError::InsufficientHistory {
                available: n - gap - 1,
                required: n,
            });
        }

        let returns: Vec<f64> = window.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        let mut levels = Vec::new();
        let mut log_rs = Vec::new();
        for level in 2..self.power {
            let avg = average_rescaled_range(&returns, level)?;
            levels.push(level as f64);
            log_rs.push(avg.log2());
        }

        let estimate = regress_against_random_walk(&levels, &log_rs)?;
        trace!(
            hurst = estimate.hurst,
            t_stat = estimate.t_stat,
            p_value = estimate.p_value,
            "hurst estimate"
        );
        Ok(estimate)
    }

    /// One estimate per window, sliding forward one close at a time.
    pub fn rolling<'a>(&self, prices: &'a [f64]) -> RollingHurst<'a> {
        RollingHurst {
            estimator: *self,
            prices,
            next_end: self.window_len(),
        }
    }
}

impl RegimeModel for HurstEstimator {
    fn required_history(&self) -> usize {
        self.window_len()
    }

    fn estimate(&self, closes: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
        HurstEstimator::estimate(self, closes)
    }
}

/// Lazy sliding-window estimator. Finite; yields nothing when the input is
/// shorter than one window. Call [`HurstEstimator::rolling`] again to restart.
#[derive(Debug, Clone)]
pub struct RollingHurst<'a> {
    estimator: HurstEstimator,
    prices: &'a [f64],
    next_end: usize,
}

impl Iterator for RollingHurst<'_> {
    type Item = Result<RegimeEstimate, MomentraderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_end > self.prices.len() {
            return None;
        }
        let item = self.estimator.estimate(&self.prices[..self.next_end]);
        self.next_end += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.prices.len() + 1).saturating_sub(self.next_end);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingHurst<'_> {}

/// Mean R/S over the `2^level`-long subsamples. The standard deviation is
/// the population form (divides by m).
fn average_rescaled_range(returns: &[f64], level: u32) -> Result<f64, MomentraderError> {
    let m = 1usize << level;
    let mut total = 0.0;
    let mut count = 0usize;

    for (index, sub) in returns.chunks_exact(m).enumerate() {
        let mean = sub.iter().sum::<f64>() / m as f64;

        let mut running = 0.0_f64;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for &r in sub {
            running += r - mean;
            max = max.max(running);
            min = min.min(running);
        }

        let variance = sub.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / m as f64;
        let std_dev = variance.sqrt();
        if std_dev <= f64::EPSILON * (1.0 + mean.abs()) {
            return Err(MomentraderError::DegenerateSubsample { level, index });
        }

        total += (max - min) / std_dev;
        count += 1;
    }

    Ok(total / count as f64)
}

fn regress_against_random_walk(x: &[f64], y: &[f64]) -> Result<RegimeEstimate, MomentraderError> {
    let k = x.len();
    if k < 3 {
        return Err(MomentraderError::DegenerateRegression {
            reason: format!("{} points leave no residual degrees of freedom", k),
        });
    }

    let n = k as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - x_mean).powi(2);
        sxy += (xi - x_mean) * (yi - y_mean);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();

    let dof = n - 2.0;
    let std_err = (sse / dof / sxx).sqrt();
    let diff = slope - RANDOM_WALK_HURST;

    let (t_stat, p_value) = if std_err > 0.0 {
        let t = diff / std_err;
        let dist = StudentsT::new(0.0, 1.0, dof).map_err(|e| {
            MomentraderError::DegenerateRegression {
                reason: e.to_string(),
            }
        })?;
        (t, (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
    } else if diff == 0.0 {
        (0.0, 1.0)
    } else {
        (diff.signum() * f64::INFINITY, 0.0)
    };

    if !slope.is_finite() {
        return Err(MomentraderError::DegenerateRegression {
            reason: "non-finite slope".into(),
        });
    }

    Ok(RegimeEstimate {
        hurst: slope,
        t_stat,
        p_value,
    })
}
