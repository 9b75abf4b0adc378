//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::adapters::tracing_observer::TracingObserver;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult, EquityPoint};
use crate::domain::code_data::{align_series, MarketSlice};
use crate::domain::config_validation::{
    parse_date, validate_backtest_config, validate_strategy_config, validate_sweep_config,
};
use crate::domain::engine::Engine;
use crate::domain::error::MomentraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::hurst::HurstEstimator;
use crate::domain::metrics::{drawdown_series, Metrics};
use crate::domain::regime::RegimeModel;
use crate::domain::strategy::StrategyParams;
use crate::domain::sweep::{self, SweepConfig};
use crate::domain::universe::{load_universe, parse_codes, LoadedUniverse};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

const DEFAULT_DATA_DIR: &str = "data/stock_data";

#[derive(Parser, Debug)]
#[command(
    name = "momentrader",
    about = "Cross-sectional momentum backtester with a Hurst regime filter"
)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Validate and print the resolved run without loading data
        #[arg(long)]
        dry_run: bool,
        /// Write the per-bar equity, drawdown and regime series as CSV
        #[arg(long)]
        series_out: Option<PathBuf>,
    },
    /// Grid-search momentum_window and long_percentile
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List instruments available in a data directory
    ListSymbols {
        #[arg(long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            dry_run,
            series_out,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, series_out.as_deref())
            }
        }
        Command::Sweep { config } => run_sweep(&config),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data_dir } => run_list_symbols(&data_dir),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MomentraderError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn validate_all(adapter: &dyn ConfigPort) -> Result<(), MomentraderError> {
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    validate_sweep_config(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, MomentraderError> {
    let start_date: NaiveDate = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date: NaiveDate = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 1_000_000.0),
        commission_per_trade: adapter.get_double("backtest", "commission_per_trade", 0.0),
        commission_pct: adapter.get_double("backtest", "commission_pct", 0.0),
        slippage_pct: adapter.get_double("backtest", "slippage_pct", 0.0),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
        benchmark: adapter
            .get_string("backtest", "benchmark")
            .map(|b| b.to_uppercase()),
    })
}

fn parse_choice<T: FromStr<Err = String>>(
    adapter: &dyn ConfigPort,
    key: &str,
    default: T,
) -> Result<T, MomentraderError> {
    match adapter.get_string("strategy", key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|reason| MomentraderError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason,
        }),
    }
}

fn get_usize(adapter: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    adapter
        .get_int(section, key, default as i64)
        .try_into()
        .unwrap_or(default)
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> Result<StrategyParams, MomentraderError> {
    let d = StrategyParams::default();
    Ok(StrategyParams {
        momentum_window: get_usize(adapter, "strategy", "momentum_window", d.momentum_window),
        total_window: get_usize(adapter, "strategy", "total_window", d.total_window),
        long_percentile: adapter.get_double("strategy", "long_percentile", d.long_percentile),
        num_stocks: get_usize(adapter, "strategy", "num_stocks", d.num_stocks),
        hurst_power: adapter
            .get_int("strategy", "hurst_power", d.hurst_power as i64)
            .try_into()
            .unwrap_or(d.hurst_power),
        rsi_window: get_usize(adapter, "strategy", "rsi_window", d.rsi_window),
        signal: parse_choice(adapter, "signal", d.signal)?,
        macd_fast: get_usize(adapter, "strategy", "macd_fast", d.macd_fast),
        macd_slow: get_usize(adapter, "strategy", "macd_slow", d.macd_slow),
        macd_signal: get_usize(adapter, "strategy", "macd_signal", d.macd_signal),
        positivity_filter: parse_choice(adapter, "positivity_filter", d.positivity_filter)?,
        weighting: parse_choice(adapter, "weighting", d.weighting)?,
        regime_filter: adapter.get_bool("strategy", "regime_filter", d.regime_filter),
        regime_code: adapter
            .get_string("strategy", "regime_code")
            .map(|c| c.to_uppercase()),
    })
}

pub fn build_sweep_config(adapter: &dyn ConfigPort) -> SweepConfig {
    let d = SweepConfig::default();
    SweepConfig {
        momentum_window_min: get_usize(adapter, "sweep", "momentum_window_min", d.momentum_window_min),
        momentum_window_max: get_usize(adapter, "sweep", "momentum_window_max", d.momentum_window_max),
        percentile_steps: get_usize(adapter, "sweep", "percentile_steps", d.percentile_steps),
    }
}

pub fn build_execution_config(bt_config: &BacktestConfig) -> ExecutionConfig {
    ExecutionConfig {
        commission_per_trade: bt_config.commission_per_trade,
        commission_pct: bt_config.commission_pct,
        slippage_pct: bt_config.slippage_pct,
    }
}

pub fn resolve_codes(config: &dyn ConfigPort) -> Result<Vec<String>, MomentraderError> {
    let raw = config
        .get_string("backtest", "codes")
        .ok_or_else(|| MomentraderError::ConfigMissing {
            section: "backtest".into(),
            key: "codes".into(),
        })?;
    parse_codes(&raw).map_err(|e| MomentraderError::ConfigInvalid {
        section: "backtest".into(),
        key: "codes".into(),
        reason: e.to_string(),
    })
}

fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("backtest", "data_dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Load every configured instrument and align them onto one timeline.
pub fn load_market(
    data_port: &dyn DataPort,
    codes: &[String],
    bt_config: &BacktestConfig,
) -> Result<(LoadedUniverse, Vec<MarketSlice>), MomentraderError> {
    let universe = load_universe(data_port, codes, bt_config.start_date, bt_config.end_date)?;
    for code in &universe.skipped {
        eprintln!("warning: skipping {} (no data)", code);
    }
    let slices = align_series(&universe.data);
    Ok((universe, slices))
}

fn run_backtest(config_path: &Path, series_out: Option<&Path>) -> Result<(), MomentraderError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let bt_config = build_backtest_config(&adapter)?;
    let params = build_strategy_params(&adapter)?;
    let codes = resolve_codes(&adapter)?;

    // Stage 2: Load the feed
    let data_port = CsvAdapter::new(data_dir(&adapter));
    eprintln!("Loading {} codes...", codes.len());
    let (universe, slices) = load_market(&data_port, &codes, &bt_config)?;

    // Stage 3: Run
    eprintln!(
        "Running backtest: {} codes, {} to {}",
        universe.data.len(),
        bt_config.start_date,
        bt_config.end_date,
    );
    eprintln!("  Processing: {} dates", slices.len());

    let mut engine = Engine::with_hurst(params, universe.codes())?;
    engine.set_observer(Box::new(TracingObserver));
    let mut broker = PaperBroker::new(bt_config.initial_capital, build_execution_config(&bt_config));
    let result = backtest_engine::run_backtest(&mut engine, &mut broker, &slices)?;

    // Stage 4: Metrics and benchmark
    let metrics = Metrics::compute(
        &result.equity_curve,
        engine.tracker().closed_trades(),
        bt_config.initial_capital,
        bt_config.risk_free_rate,
    );

    let benchmark = match &bt_config.benchmark {
        Some(code) => match universe.data.iter().find(|cd| &cd.code == code) {
            Some(data) => Some(backtest_engine::run_buy_and_hold(data, bt_config.initial_capital)?),
            None => {
                eprintln!("warning: benchmark {} has no data", code);
                None
            }
        },
        None => None,
    };

    print_summary(&metrics, &result);
    if let (Some(code), Some(curve)) = (&bt_config.benchmark, &benchmark) {
        let bench = Metrics::compute(curve, &[], bt_config.initial_capital, bt_config.risk_free_rate);
        eprintln!("\n=== Benchmark ({}) ===", code);
        eprintln!("Total Return:     {:.2}%", bench.total_return * 100.0);
        eprintln!("Sharpe Ratio:     {:.2}", bench.sharpe_ratio);
        eprintln!("Max Drawdown:     -{:.1}%", bench.max_drawdown * 100.0);
    }

    // Stage 5: Series output
    if let Some(path) = series_out {
        write_series(path, &result, benchmark.as_deref())?;
        eprintln!("\nSeries written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(metrics: &Metrics, result: &BacktestResult) {
    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("DD Duration:      {} bars", metrics.max_drawdown_duration);
    eprintln!("Rebalances:       {}", result.rebalances);
    eprintln!("Failed Orders:    {}", result.rejected_fills());
    eprintln!("Closed Trades:    {}", metrics.trades.total);
    eprintln!("Win Rate:         {:.1}%", metrics.trades.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.trades.profit_factor);
    eprintln!("Commission:       {:.2}", metrics.trades.total_commission);
}

/// One row per bar: date, equity, drawdown, hurst, p_value and, when a
/// benchmark ran, its equity on that date.
pub fn write_series(
    path: &Path,
    result: &BacktestResult,
    benchmark: Option<&[EquityPoint]>,
) -> Result<(), MomentraderError> {
    let mut wtr = csv::Writer::from_path(path).map_err(io::Error::from)?;
    let bench: HashMap<NaiveDate, f64> = benchmark
        .unwrap_or_default()
        .iter()
        .map(|p| (p.date, p.equity))
        .collect();
    let regime: HashMap<NaiveDate, (f64, f64)> = result
        .regime
        .iter()
        .map(|r| (r.date, (r.hurst, r.p_value)))
        .collect();

    wtr.write_record(["date", "equity", "drawdown", "hurst", "p_value", "benchmark"])
        .map_err(io::Error::from)?;

    for (point, (_, dd)) in result
        .equity_curve
        .iter()
        .zip(drawdown_series(&result.equity_curve))
    {
        let (hurst, p_value) = regime
            .get(&point.date)
            .map(|(h, p)| (h.to_string(), p.to_string()))
            .unwrap_or_default();
        let bench_equity = bench
            .get(&point.date)
            .map(|e| e.to_string())
            .unwrap_or_default();
        wtr.write_record([
            point.date.to_string(),
            point.equity.to_string(),
            dd.to_string(),
            hurst,
            p_value,
            bench_equity,
        ])
        .map_err(io::Error::from)?;
    }

    wtr.flush()?;
    Ok(())
}

fn run_dry_run(config_path: &Path) -> Result<(), MomentraderError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    eprintln!("Config validated successfully");

    let bt_config = build_backtest_config(&adapter)?;
    let params = build_strategy_params(&adapter)?;
    let codes = resolve_codes(&adapter)?;

    eprintln!("\nBacktest:");
    eprintln!("  data_dir: {}", data_dir(&adapter).display());
    eprintln!("  range: {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  initial_capital: {:.2}", bt_config.initial_capital);

    eprintln!("\nStrategy:");
    eprintln!("  signal: {}", params.signal);
    eprintln!(
        "  rebalance every {} bars, lookback {} bars",
        params.momentum_window, params.total_window
    );
    eprintln!(
        "  universe {} by dollar volume, long top {:.0}%",
        params.num_stocks,
        params.long_percentile * 100.0
    );
    eprintln!(
        "  weighting: {}, positivity filter: {}",
        params.weighting, params.positivity_filter
    );
    if params.regime_filter {
        let regime_code = params
            .regime_code
            .as_deref()
            .or(codes.first().map(String::as_str))
            .unwrap_or_default();
        eprintln!(
            "  regime filter: Hurst on {} over {} prices",
            regime_code,
            HurstEstimator::new(params.hurst_power).required_history()
        );
    } else {
        eprintln!("  regime filter: off");
    }

    eprintln!("\nUniverse:");
    eprintln!("  codes: {}", codes.join(", "));

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_sweep(config_path: &Path) -> Result<(), MomentraderError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let bt_config = build_backtest_config(&adapter)?;
    let base = build_strategy_params(&adapter)?;
    let sweep_config = build_sweep_config(&adapter);
    let codes = resolve_codes(&adapter)?;

    let data_port = CsvAdapter::new(data_dir(&adapter));
    let (universe, slices) = load_market(&data_port, &codes, &bt_config)?;
    let exec_config = build_execution_config(&bt_config);

    eprintln!(
        "Sweeping {} parameter sets over {} dates",
        sweep_config.grid().len(),
        slices.len()
    );

    let report = sweep::run_sweep(
        &base,
        &universe.codes(),
        &slices,
        &bt_config,
        &sweep_config,
        |params| Box::new(HurstEstimator::new(params.hurst_power)) as Box<dyn RegimeModel>,
        || PaperBroker::new(bt_config.initial_capital, exec_config.clone()),
    )?;

    println!("momentum_window,long_percentile,max_drawdown,total_return");
    for run in &report.runs {
        println!(
            "{},{:.4},{:.6},{:.6}",
            run.momentum_window, run.long_percentile, run.max_drawdown, run.total_return
        );
    }

    if let Some(best) = report.best_run() {
        eprintln!(
            "\nBest: momentum_window={} long_percentile={:.4} max_drawdown=-{:.1}% return={:.2}%",
            best.momentum_window,
            best.long_percentile,
            best.max_drawdown * 100.0,
            best.total_return * 100.0
        );
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), MomentraderError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let params = build_strategy_params(&adapter)?;
    let codes = resolve_codes(&adapter)?;
    let sweep_config = build_sweep_config(&adapter);

    eprintln!("  codes: {} ({})", codes.len(), codes.join(", "));
    eprintln!("  signal: {}", params.signal);
    eprintln!("  sweep grid: {} runs", sweep_config.grid().len());
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(data_dir: &Path) -> Result<(), MomentraderError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let symbols = adapter.list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
