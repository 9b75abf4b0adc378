//! Grid search over rebalance cadence and long percentile.
//!
//! Every grid point runs on its own engine and broker; nothing carries over
//! between runs.

use tracing::info;

use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::code_data::MarketSlice;
use crate::domain::engine::Engine;
use crate::domain::error::MomentraderError;
use crate::domain::metrics::compute_drawdown;
use crate::domain::regime::RegimeModel;
use crate::domain::strategy::StrategyParams;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::observer_port::NullObserver;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub momentum_window_min: usize,
    pub momentum_window_max: usize,
    /// long_percentile takes the values i / steps for i in 1..=steps.
    pub percentile_steps: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            momentum_window_min: 1,
            momentum_window_max: 20,
            percentile_steps: 16,
        }
    }
}

impl SweepConfig {
    pub fn grid(&self) -> Vec<(usize, f64)> {
        let steps = self.percentile_steps.max(1);
        (self.momentum_window_min.max(1)..=self.momentum_window_max)
            .flat_map(|mw| (1..=steps).map(move |i| (mw, i as f64 / steps as f64)))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SweepRun {
    pub momentum_window: usize,
    pub long_percentile: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub result: BacktestResult,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub runs: Vec<SweepRun>,
    /// Index into `runs` of the smallest maximum drawdown; ties go to the
    /// earlier grid point.
    pub best: Option<usize>,
}

impl SweepReport {
    pub fn best_run(&self) -> Option<&SweepRun> {
        self.best.map(|i| &self.runs[i])
    }
}

/// Run every grid point. `regime_model` and `broker` are called once per
/// run to build that run's collaborators.
pub fn run_sweep<M, B, E>(
    base: &StrategyParams,
    codes: &[String],
    slices: &[MarketSlice],
    backtest: &BacktestConfig,
    sweep: &SweepConfig,
    regime_model: M,
    broker: B,
) -> Result<SweepReport, MomentraderError>
where
    M: Fn(&StrategyParams) -> Box<dyn RegimeModel>,
    B: Fn() -> E,
    E: ExecutionPort,
{
    let mut runs: Vec<SweepRun> = Vec::new();
    let mut best: Option<usize> = None;

    for (momentum_window, long_percentile) in sweep.grid() {
        let params = StrategyParams {
            momentum_window,
            long_percentile,
            ..base.clone()
        };
        let model = regime_model(&params);
        let mut engine = Engine::new(params, codes.to_vec(), model, Box::new(NullObserver))?;
        let mut broker = broker();

        let result = run_backtest(&mut engine, &mut broker, slices)?;
        let (max_drawdown, _) = compute_drawdown(&result.equity_curve);
        let total_return = result
            .final_equity()
            .map_or(0.0, |e| e / backtest.initial_capital - 1.0);

        info!(
            momentum_window,
            long_percentile, max_drawdown, total_return, "sweep run complete"
        );

        if best.is_none_or(|b| max_drawdown < runs[b].max_drawdown) {
            best = Some(runs.len());
        }
        runs.push(SweepRun {
            momentum_window,
            long_percentile,
            max_drawdown,
            total_return,
            result,
        });
    }

    Ok(SweepReport { runs, best })
}
