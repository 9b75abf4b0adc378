//! Backtest driver and event loop.
//!
//! BacktestConfig defines the run-level parameters; the strategy itself is
//! configured through `StrategyParams`.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::code_data::{CodeData, MarketSlice};
use crate::domain::engine::Engine;
use crate::domain::error::MomentraderError;
use crate::domain::regime::RegimePoint;
use crate::domain::tracker::{FillReport, FillStatus};
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub commission_per_trade: f64,
    pub commission_pct: f64,
    pub slippage_pct: f64,
    pub risk_free_rate: f64,
    pub benchmark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub regime: Vec<RegimePoint>,
    pub fills: Vec<FillReport>,
    pub rebalances: usize,
}

impl BacktestResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.equity)
    }

    pub fn rejected_fills(&self) -> usize {
        self.fills
            .iter()
            .filter(|f| f.status != FillStatus::Filled)
            .count()
    }
}

/// Feed `slices` through `engine` in order, routing its instructions to
/// `broker` and the resulting fills back into the engine.
///
/// Equity is recorded after each bar's executions, marked at that bar's
/// tradeable closes.
pub fn run_backtest(
    engine: &mut Engine,
    broker: &mut dyn ExecutionPort,
    slices: &[MarketSlice],
) -> Result<BacktestResult, MomentraderError> {
    let mut equity_curve = Vec::with_capacity(slices.len());
    let mut fills = Vec::new();
    let mut rebalances = 0;

    for slice in slices {
        let instructions = engine.advance(slice)?;
        let prices = slice.price_map();

        if !instructions.is_empty() {
            rebalances += 1;
            debug!(date = %slice.date, count = instructions.len(), "executing instructions");
            for fill in broker.execute(slice.date, &instructions, &prices) {
                engine.on_fill(&fill)?;
                fills.push(fill);
            }
        }

        equity_curve.push(EquityPoint {
            date: slice.date,
            equity: broker.equity(&prices),
        });
    }

    if let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) {
        info!(
            bars = equity_curve.len(),
            start = %first.date,
            end = %last.date,
            final_equity = last.equity,
            rebalances,
            "backtest complete"
        );
    }

    Ok(BacktestResult {
        equity_curve,
        regime: engine.regime_history().to_vec(),
        fills,
        rebalances,
    })
}

/// Buy `code` with all cash on its first tradeable bar and hold.
pub fn run_buy_and_hold(
    data: &CodeData,
    initial_capital: f64,
) -> Result<Vec<EquityPoint>, MomentraderError> {
    let Some(first) = data.bars.iter().find(|b| b.is_tradeable()) else {
        return Err(MomentraderError::NoData {
            code: data.code.clone(),
        });
    };

    let shares = (initial_capital / first.close).floor();
    let cash = initial_capital - shares * first.close;
    let mut last_close = first.close;

    Ok(data
        .bars
        .iter()
        .filter(|b| b.date >= first.date)
        .map(|bar| {
            if bar.close > 0.0 {
                last_close = bar.close;
            }
            EquityPoint {
                date: bar.date,
                equity: cash + shares * last_close,
            }
        })
        .collect())
}
