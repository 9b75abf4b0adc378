//! Rebalance scheduler and regime gate.
//!
//! The engine is stepped one bar at a time with [`Engine::advance`] and told
//! about executions with [`Engine::on_fill`]. Per bar:
//!   1. Push every instrument's bar (sentinel if absent) into its series.
//!   2. On a cadence bar (`counter % momentum_window == 0`) with enough
//!      history, re-estimate the regime; otherwise carry the last reading.
//!   3. On a rebalance boundary past warmup, rank into a target allocation
//!      when the gate is open, or flatten when it is closed, and diff
//!      against holdings.
//!   4. Tick the clock.

use std::fmt;

use chrono::NaiveDate;
use crate::domain::allocation::{rank_and_allocate, TargetAllocation};
use crate::domain::code_data::MarketSlice;
use crate::domain::error::MomentraderError;
use crate::domain::hurst::HurstEstimator;
use crate::domain::ohlcv::PriceBar;
use crate::domain::regime::{RegimeEstimate, RegimeModel, RegimePoint};
use crate::domain::series::InstrumentSeries;
use crate::domain::strategy::StrategyParams;
use crate::domain::tracker::{FillReport, Instruction, PortfolioTracker};
use crate::domain::universe::select_universe;
use crate::ports::observer_port::{EngineObserver, NullObserver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not enough history for the signal lookback or the regime window.
    Warmup,
    /// Waiting for the next rebalance boundary.
    Hold,
    /// On a rebalance boundary.
    Evaluating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => write!(f, "warmup"),
            Phase::Hold => write!(f, "hold"),
            Phase::Evaluating => write!(f, "evaluating"),
        }
    }
}

/// Bar counter. Reads as the index of the bar being processed; only ever
/// incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategyClock {
    counter: usize,
}

impl StrategyClock {
    pub fn new() -> Self {
        StrategyClock::default()
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn tick(&mut self) {
        self.counter += 1;
    }
}

pub struct Engine {
    params: StrategyParams,
    series: Vec<InstrumentSeries>,
    regime_index: usize,
    regime_model: Box<dyn RegimeModel>,
    observer: Box<dyn EngineObserver>,
    clock: StrategyClock,
    phase: Phase,
    regime: RegimeEstimate,
    regime_history: Vec<RegimePoint>,
    gate_open: Option<bool>,
    tracker: PortfolioTracker,
    last_date: Option<NaiveDate>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("params", &self.params)
            .field("clock", &self.clock)
            .field("phase", &self.phase)
            .field("regime", &self.regime)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        params: StrategyParams,
        codes: Vec<String>,
        regime_model: Box<dyn RegimeModel>,
        observer: Box<dyn EngineObserver>,
    ) -> Result<Self, MomentraderError> {
        if codes.is_empty() {
            return Err(MomentraderError::ConfigMissing {
                section: "backtest".into(),
                key: "codes".into(),
            });
        }

        let regime_index = match &params.regime_code {
            Some(code) => codes.iter().position(|c| c == code).ok_or_else(|| {
                MomentraderError::ConfigInvalid {
                    section: "strategy".into(),
                    key: "regime_code".into(),
                    reason: format!("{} is not in the code list", code),
                }
            })?,
            None => 0,
        };

        let capacity = params.total_window.max(regime_model.required_history()) + 1;
        let series = codes
            .into_iter()
            .map(|code| InstrumentSeries::new(code, capacity))
            .collect();

        Ok(Engine {
            params,
            series,
            regime_index,
            regime_model,
            observer,
            clock: StrategyClock::new(),
            phase: Phase::Warmup,
            regime: RegimeEstimate::neutral(),
            regime_history: Vec::new(),
            gate_open: None,
            tracker: PortfolioTracker::new(),
            last_date: None,
        })
    }

    /// Engine with the production Hurst regime model and no observer.
    pub fn with_hurst(params: StrategyParams, codes: Vec<String>) -> Result<Self, MomentraderError> {
        let model = HurstEstimator::new(params.hurst_power);
        Engine::new(params, codes, Box::new(model), Box::new(NullObserver))
    }

    pub fn set_observer(&mut self, observer: Box<dyn EngineObserver>) {
        self.observer = observer;
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> StrategyClock {
        self.clock
    }

    /// Current (possibly forward-filled) regime reading.
    pub fn regime(&self) -> RegimeEstimate {
        self.regime
    }

    /// One reading per bar processed.
    pub fn regime_history(&self) -> &[RegimePoint] {
        &self.regime_history
    }

    pub fn tracker(&self) -> &PortfolioTracker {
        &self.tracker
    }

    pub fn series(&self, code: &str) -> Option<&InstrumentSeries> {
        self.series.iter().find(|s| s.code() == code)
    }

    /// Process one bar and return the instructions to execute on it.
    pub fn advance(&mut self, slice: &MarketSlice) -> Result<Vec<Instruction>, MomentraderError> {
        if let Some(last) = self.last_date {
            if slice.date <= last {
                return Err(MomentraderError::Data {
                    reason: format!("bar for {} arrived after {}", slice.date, last),
                });
            }
        }
        self.last_date = Some(slice.date);

        for series in &mut self.series {
            let bar = slice
                .get(series.code())
                .cloned()
                .unwrap_or_else(|| PriceBar::missing(series.code(), slice.date));
            series.push(bar);
        }

        let counter = self.clock.counter();
        let cadence = self.params.momentum_window > 0 && counter % self.params.momentum_window == 0;

        if cadence && self.regime_history_available() {
            self.refresh_regime(slice.date)?;
        }
        self.regime_history.push(RegimePoint {
            date: slice.date,
            hurst: self.regime.hurst,
            p_value: self.regime.p_value,
        });

        let phase = if self.in_warmup() {
            Phase::Warmup
        } else if self.params.is_boundary(counter) {
            Phase::Evaluating
        } else {
            Phase::Hold
        };
        if phase != self.phase {
            self.observer.phase_changed(slice.date, self.phase, phase);
            self.phase = phase;
        }

        let instructions = if phase == Phase::Evaluating {
            self.evaluate(slice)?
        } else {
            Vec::new()
        };

        self.clock.tick();
        Ok(instructions)
    }

    /// Feed an execution report back into the holdings.
    pub fn on_fill(&mut self, fill: &FillReport) -> Result<(), MomentraderError> {
        self.observer.fill_received(fill);
        if let Some(trade) = self.tracker.apply_fill(fill)? {
            self.observer.trade_closed(&trade);
        }
        Ok(())
    }

    fn regime_history_available(&self) -> bool {
        self.series[self.regime_index].len() >= self.regime_model.required_history()
    }

    fn in_warmup(&self) -> bool {
        let seen = self.clock.counter();
        seen < self.params.total_window
            || (self.params.regime_filter && !self.regime_history_available())
    }

    fn refresh_regime(&mut self, date: NaiveDate) -> Result<(), MomentraderError> {
        let required = self.regime_model.required_history();
        let Some(closes) = self.series[self.regime_index].trailing_closes(required) else {
            return Ok(());
        };

        match self.regime_model.estimate(&closes) {
            Ok(estimate) => {
                self.regime = estimate;
                self.observer.regime_updated(date, &estimate);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                self.observer.regime_missing(date, &e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn evaluate(&mut self, slice: &MarketSlice) -> Result<Vec<Instruction>, MomentraderError> {
        let gate_open = !self.params.regime_filter || self.regime.is_trending();
        if self.gate_open != Some(gate_open) {
            self.observer.gate_changed(slice.date, gate_open);
            self.gate_open = Some(gate_open);
        }

        let universe = select_universe(
            &self.series,
            self.params.total_window,
            self.params.num_stocks,
        );

        let target = if gate_open {
            let signal = self.params.signal_params();
            let scored: Vec<(String, f64)> = universe
                .iter()
                .filter_map(|code| {
                    let closes = self.series(code)?.trailing_closes(self.params.total_window)?;
                    Some((code.clone(), signal.score(&closes)))
                })
                .collect();
            rank_and_allocate(&scored, self.params.num_stocks, &self.params.ranking_params())?
        } else {
            TargetAllocation::empty()
        };

        self.observer.rebalanced(slice.date, &universe, &target);

        let instructions = self.tracker.diff(&target, slice);
        for instruction in &instructions {
            self.observer.instruction_emitted(slice.date, instruction);
        }
        Ok(instructions)
    }
}
