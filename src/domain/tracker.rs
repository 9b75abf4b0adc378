//! Portfolio state tracker: holdings as reported by fills, and the diff
//! from those holdings to a new target allocation.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::domain::allocation::TargetAllocation;
use crate::domain::code_data::MarketSlice;
use crate::domain::error::MomentraderError;
use crate::domain::position::{ClosedTrade, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    /// Held but no longer allocated: target zero.
    Sell,
    /// Held and still allocated.
    Rebalance,
    /// Newly allocated.
    Open,
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionKind::Sell => write!(f, "SELL"),
            InstructionKind::Rebalance => write!(f, "REBALANCE"),
            InstructionKind::Open => write!(f, "OPEN"),
        }
    }
}

/// Set `code` to `target_fraction` of total equity.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub code: String,
    pub target_fraction: f64,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    Filled,
    Rejected,
    Margin,
    Canceled,
}

impl fmt::Display for FillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillStatus::Filled => write!(f, "filled"),
            FillStatus::Rejected => write!(f, "rejected"),
            FillStatus::Margin => write!(f, "margin"),
            FillStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// Execution outcome reported back by the order-execution collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct FillReport {
    pub code: String,
    pub date: NaiveDate,
    /// Signed change in shares: positive bought, negative sold.
    pub shares: i64,
    pub price: f64,
    pub commission: f64,
    pub status: FillStatus,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioTracker {
    positions: HashMap<String, Position>,
    closed_trades: Vec<ClosedTrade>,
}

impl PortfolioTracker {
    pub fn new() -> Self {
        PortfolioTracker::default()
    }

    pub fn position(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    pub fn is_held(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Held codes, alphabetical.
    pub fn held_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.positions.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    /// Instructions that move current holdings to `target`.
    ///
    /// Order: sells of held codes absent from `target`, then held codes
    /// still in `target` (largest position value first), then new codes in
    /// allocation order. Allocated codes without a tradeable bar in `slice`
    /// are skipped.
    pub fn diff(&self, target: &TargetAllocation, slice: &MarketSlice) -> Vec<Instruction> {
        let mut instructions = Vec::new();

        for code in self.held_codes() {
            if !target.contains(&code) {
                instructions.push(Instruction {
                    code,
                    target_fraction: 0.0,
                    kind: InstructionKind::Sell,
                });
            }
        }

        let tradeable = |code: &str| slice.get(code).is_some_and(|bar| bar.is_tradeable());

        let mut existing: Vec<(&str, f64, f64)> = target
            .weights()
            .iter()
            .filter(|(code, _)| tradeable(code))
            .filter_map(|(code, w)| {
                let pos = self.positions.get(code)?;
                let price = slice.get(code).map_or(pos.entry_price, |bar| bar.close);
                Some((code.as_str(), *w, pos.market_value(price)))
            })
            .collect();
        existing.sort_by(|a, b| b.2.total_cmp(&a.2));

        instructions.extend(existing.into_iter().map(|(code, w, _)| Instruction {
            code: code.to_string(),
            target_fraction: w,
            kind: InstructionKind::Rebalance,
        }));

        instructions.extend(
            target
                .weights()
                .iter()
                .filter(|(code, _)| tradeable(code) && !self.is_held(code))
                .map(|(code, w)| Instruction {
                    code: code.clone(),
                    target_fraction: *w,
                    kind: InstructionKind::Open,
                }),
        );

        instructions
    }

    /// Apply one execution report. Only `Filled` reports change holdings.
    /// Returns the closed trade when the fill takes a position flat.
    pub fn apply_fill(
        &mut self,
        fill: &FillReport,
    ) -> Result<Option<ClosedTrade>, MomentraderError> {
        if fill.status != FillStatus::Filled || fill.shares == 0 {
            return Ok(None);
        }

        if fill.shares > 0 {
            self.positions
                .entry(fill.code.clone())
                .and_modify(|pos| pos.add(fill.shares, fill.price, fill.commission))
                .or_insert_with(|| Position {
                    code: fill.code.clone(),
                    shares: fill.shares,
                    entry_price: fill.price,
                    entry_date: fill.date,
                    realized_pnl: 0.0,
                    commission: fill.commission,
                });
            return Ok(None);
        }

        let sold = -fill.shares;
        let Some(pos) = self.positions.get_mut(&fill.code) else {
            return Err(MomentraderError::Data {
                reason: format!("sell fill for {} with no position", fill.code),
            });
        };
        if sold > pos.shares {
            return Err(MomentraderError::Data {
                reason: format!(
                    "sell fill of {} {} exceeds {} held",
                    sold, fill.code, pos.shares
                ),
            });
        }

        let entry_price = pos.entry_price;
        pos.reduce(sold, fill.price, fill.commission);
        if pos.shares > 0 {
            return Ok(None);
        }

        let Some(pos) = self.positions.remove(&fill.code) else {
            return Ok(None);
        };
        let trade = ClosedTrade {
            code: pos.code,
            shares: sold,
            entry_price,
            exit_price: fill.price,
            entry_date: pos.entry_date,
            exit_date: fill.date,
            pnl: pos.realized_pnl,
            commission: pos.commission,
        };
        self.closed_trades.push(trade.clone());
        Ok(Some(trade))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn make_bar(code: &str, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            code: code.into(),
            date: date(1),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn fill(code: &str, shares: i64, price: f64) -> FillReport {
        FillReport {
            code: code.into(),
            date: date(1),
            shares,
            price,
            commission: 0.0,
            status: FillStatus::Filled,
        }
    }

    fn alloc(pairs: &[(&str, f64)]) -> TargetAllocation {
        TargetAllocation::new(pairs.iter().map(|(c, w)| (c.to_string(), *w)).collect()).unwrap()
    }

    #[test]
    fn diff_orders_sells_then_rebalances_then_opens() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("OLD", 10, 100.0)).unwrap();
        tracker.apply_fill(&fill("SMALL", 1, 100.0)).unwrap();
        tracker.apply_fill(&fill("BIG", 50, 100.0)).unwrap();

        let slice = MarketSlice::new(date(2))
            .with_bar(make_bar("OLD", 100.0, 1000.0))
            .with_bar(make_bar("SMALL", 100.0, 1000.0))
            .with_bar(make_bar("BIG", 100.0, 1000.0))
            .with_bar(make_bar("NEW", 100.0, 1000.0));
        let target = alloc(&[("NEW", 0.4), ("SMALL", 0.3), ("BIG", 0.2)]);

        let out = tracker.diff(&target, &slice);
        let summary: Vec<(&str, InstructionKind)> =
            out.iter().map(|i| (i.code.as_str(), i.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("OLD", InstructionKind::Sell),
                ("BIG", InstructionKind::Rebalance),
                ("SMALL", InstructionKind::Rebalance),
                ("NEW", InstructionKind::Open),
            ]
        );
        assert_eq!(out[0].target_fraction, 0.0);
        assert!((out[3].target_fraction - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn diff_skips_allocated_codes_without_tradeable_bar() {
        let tracker = PortfolioTracker::new();
        let slice = MarketSlice::new(date(2))
            .with_bar(make_bar("A", 100.0, 0.0))
            .with_bar(PriceBar::missing("B", date(2)));
        let out = tracker.diff(&alloc(&[("A", 0.45), ("B", 0.45)]), &slice);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_target_flattens_everything() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("A", 10, 10.0)).unwrap();
        tracker.apply_fill(&fill("B", 10, 10.0)).unwrap();
        let slice = MarketSlice::new(date(2));
        let out = tracker.diff(&TargetAllocation::empty(), &slice);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| i.kind == InstructionKind::Sell));
    }

    #[test]
    fn diff_never_duplicates_a_code() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("A", 10, 10.0)).unwrap();
        let slice = MarketSlice::new(date(2))
            .with_bar(make_bar("A", 10.0, 100.0))
            .with_bar(make_bar("B", 10.0, 100.0));
        let out = tracker.diff(&alloc(&[("A", 0.45), ("B", 0.45)]), &slice);
        assert_eq!(out.len(), 2);
        assert_ne!(out[0].code, out[1].code);
    }

    #[test]
    fn sell_to_flat_records_closed_trade() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("A", 10, 10.0)).unwrap();
        let mut sell = fill("A", -10, 12.0);
        sell.date = date(5);
        let trade = tracker.apply_fill(&sell).unwrap().unwrap();

        assert!(!tracker.is_held("A"));
        assert!((trade.pnl - 20.0).abs() < f64::EPSILON);
        assert_eq!(trade.exit_date, date(5));
        assert_eq!(tracker.closed_trades().len(), 1);
    }

    #[test]
    fn partial_sell_keeps_position() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("A", 10, 10.0)).unwrap();
        assert!(tracker.apply_fill(&fill("A", -4, 11.0)).unwrap().is_none());
        assert_eq!(tracker.position("A").unwrap().shares, 6);
    }

    #[test]
    fn unfilled_reports_do_not_touch_holdings() {
        let mut tracker = PortfolioTracker::new();
        for status in [FillStatus::Rejected, FillStatus::Margin, FillStatus::Canceled] {
            let report = FillReport {
                status,
                ..fill("A", 10, 10.0)
            };
            assert!(tracker.apply_fill(&report).unwrap().is_none());
        }
        assert_eq!(tracker.position_count(), 0);
    }

    #[test]
    fn oversell_is_a_data_error() {
        let mut tracker = PortfolioTracker::new();
        tracker.apply_fill(&fill("A", 10, 10.0)).unwrap();
        assert!(tracker.apply_fill(&fill("A", -11, 10.0)).is_err());
        assert!(tracker.apply_fill(&fill("Z", -1, 10.0)).is_err());
    }
}
