//! Engine observer port: the engine reports decisions here instead of
//! writing to a process-wide logger.

use chrono::NaiveDate;

use crate::domain::allocation::TargetAllocation;
use crate::domain::engine::Phase;
use crate::domain::error::MomentraderError;
use crate::domain::position::ClosedTrade;
use crate::domain::regime::RegimeEstimate;
use crate::domain::tracker::{FillReport, Instruction};

pub trait EngineObserver {
    fn phase_changed(&mut self, _date: NaiveDate, _from: Phase, _to: Phase) {}

    fn regime_updated(&mut self, _date: NaiveDate, _estimate: &RegimeEstimate) {}

    /// The estimate for this boundary failed recoverably; the previous
    /// reading is carried forward.
    fn regime_missing(&mut self, _date: NaiveDate, _error: &MomentraderError) {}

    fn gate_changed(&mut self, _date: NaiveDate, _open: bool) {}

    fn rebalanced(&mut self, _date: NaiveDate, _universe: &[String], _target: &TargetAllocation) {}

    fn instruction_emitted(&mut self, _date: NaiveDate, _instruction: &Instruction) {}

    fn fill_received(&mut self, _fill: &FillReport) {}

    fn trade_closed(&mut self, _trade: &ClosedTrade) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl EngineObserver for NullObserver {}
