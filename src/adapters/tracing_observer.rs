//! Engine observer that emits structured `tracing` events.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::allocation::TargetAllocation;
use crate::domain::engine::Phase;
use crate::domain::error::MomentraderError;
use crate::domain::position::ClosedTrade;
use crate::domain::regime::RegimeEstimate;
use crate::domain::tracker::{FillReport, FillStatus, Instruction};
use crate::ports::observer_port::EngineObserver;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn phase_changed(&mut self, date: NaiveDate, from: Phase, to: Phase) {
        debug!(%date, %from, %to, "phase changed");
    }

    fn regime_updated(&mut self, date: NaiveDate, estimate: &RegimeEstimate) {
        debug!(
            %date,
            hurst = estimate.hurst,
            t_stat = estimate.t_stat,
            p_value = estimate.p_value,
            trending = estimate.is_trending(),
            "regime estimated"
        );
    }

    fn regime_missing(&mut self, date: NaiveDate, error: &MomentraderError) {
        debug!(%date, %error, "regime estimate unavailable, keeping previous reading");
    }

    fn gate_changed(&mut self, date: NaiveDate, open: bool) {
        if open {
            info!(%date, "regime gate opened");
        } else {
            warn!(%date, "regime gate closed, moving to cash");
        }
    }

    fn rebalanced(&mut self, date: NaiveDate, universe: &[String], target: &TargetAllocation) {
        info!(
            %date,
            universe = universe.len(),
            selected = target.len(),
            invested = target.total(),
            "rebalance"
        );
    }

    fn instruction_emitted(&mut self, date: NaiveDate, instruction: &Instruction) {
        info!(
            %date,
            code = %instruction.code,
            kind = %instruction.kind,
            target = instruction.target_fraction,
            "instruction"
        );
    }

    fn fill_received(&mut self, fill: &FillReport) {
        if fill.status == FillStatus::Filled {
            let side = if fill.shares >= 0 { "BUY" } else { "SELL" };
            info!(
                date = %fill.date,
                code = %fill.code,
                side,
                shares = fill.shares.abs(),
                price = fill.price,
                commission = fill.commission,
                "order executed"
            );
        } else {
            warn!(
                date = %fill.date,
                code = %fill.code,
                shares = fill.shares,
                status = %fill.status,
                "order failed"
            );
        }
    }

    fn trade_closed(&mut self, trade: &ClosedTrade) {
        info!(
            code = %trade.code,
            entry = %trade.entry_date,
            exit = %trade.exit_date,
            gross = trade.pnl,
            net = trade.net_pnl(),
            "trade closed"
        );
    }
}
