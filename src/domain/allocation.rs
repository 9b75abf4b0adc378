//! Ranking and target-weight allocation.
//!
//! top_count = ceil(universe_size * long_percentile)
//! weight_i  = signal_i / Σ signal * CASH_BUFFER      (proportional)
//! weight_i  = CASH_BUFFER / k                         (equal)

use std::fmt;
use std::str::FromStr;

use crate::domain::error::MomentraderError;

/// Fraction of equity ever invested; the rest stays in cash.
pub const CASH_BUFFER: f64 = 0.9;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Instrument -> fraction of total equity. Sums to at most 1.0 with every
/// weight non-negative; the constructor rejects anything else.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetAllocation {
    weights: Vec<(String, f64)>,
}

impl TargetAllocation {
    pub fn new(weights: Vec<(String, f64)>) -> Result<Self, MomentraderError> {
        let mut total = 0.0;
        for (code, w) in &weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(MomentraderError::AllocationInvariant {
                    reason: format!("weight {} for {}", w, code),
                });
            }
            total += w;
        }
        if total > 1.0 + WEIGHT_TOLERANCE {
            return Err(MomentraderError::AllocationInvariant {
                reason: format!("weights sum to {}", total),
            });
        }
        for (i, (code, _)) in weights.iter().enumerate() {
            if weights[..i].iter().any(|(c, _)| c == code) {
                return Err(MomentraderError::AllocationInvariant {
                    reason: format!("{} allocated twice", code),
                });
            }
        }
        Ok(TargetAllocation { weights })
    }

    /// All cash.
    pub fn empty() -> Self {
        TargetAllocation::default()
    }

    pub fn weights(&self) -> &[(String, f64)] {
        &self.weights
    }

    pub fn weight(&self, code: &str) -> Option<f64> {
        self.weights.iter().find(|(c, _)| c == code).map(|(_, w)| *w)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.weight(code).is_some()
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}

/// Where non-positive scores are dropped relative to the percentile cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositivityFilter {
    #[default]
    AfterCut,
    /// Legacy ordering: filter first, then cut.
    BeforeCut,
}

impl fmt::Display for PositivityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositivityFilter::AfterCut => write!(f, "after_cut"),
            PositivityFilter::BeforeCut => write!(f, "before_cut"),
        }
    }
}

impl FromStr for PositivityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "after_cut" => Ok(PositivityFilter::AfterCut),
            "before_cut" => Ok(PositivityFilter::BeforeCut),
            other => Err(format!("unknown positivity filter '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weighting {
    #[default]
    Proportional,
    Equal,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Proportional => write!(f, "proportional"),
            Weighting::Equal => write!(f, "equal"),
        }
    }
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proportional" => Ok(Weighting::Proportional),
            "equal" => Ok(Weighting::Equal),
            other => Err(format!("unknown weighting '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingParams {
    pub long_percentile: f64,
    pub positivity_filter: PositivityFilter,
    pub weighting: Weighting,
}

/// Number of instruments kept by the percentile cut.
pub fn top_count(universe_size: usize, long_percentile: f64) -> usize {
    let raw = (universe_size as f64 * long_percentile).ceil();
    (raw.max(0.0) as usize).min(universe_size)
}

/// Rank `scored` (code, signal) descending and size the long book.
///
/// Ties keep input order. An empty selection, or a non-positive signal sum,
/// yields an all-cash allocation.
pub fn rank_and_allocate(
    scored: &[(String, f64)],
    universe_size: usize,
    params: &RankingParams,
) -> Result<TargetAllocation, MomentraderError> {
    let mut ranked: Vec<&(String, f64)> = scored.iter().collect();
    if params.positivity_filter == PositivityFilter::BeforeCut {
        ranked.retain(|(_, s)| *s > 0.0);
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_count(universe_size, params.long_percentile));
    ranked.retain(|(_, s)| *s > 0.0);

    if ranked.is_empty() {
        return Ok(TargetAllocation::empty());
    }

    let weights = match params.weighting {
        Weighting::Proportional => {
            let total: f64 = ranked.iter().map(|(_, s)| s).sum();
            if total <= 0.0 || !total.is_finite() {
                return Ok(TargetAllocation::empty());
            }
            ranked
                .iter()
                .map(|(code, s)| (code.clone(), s / total * CASH_BUFFER))
                .collect()
        }
        Weighting::Equal => {
            let each = CASH_BUFFER / ranked.len() as f64;
            ranked.iter().map(|(code, _)| (code.clone(), each)).collect()
        }
    };

    TargetAllocation::new(weights)
}
