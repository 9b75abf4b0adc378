//! Configuration validation.
//!
//! Validates all config fields before a run. Typed getters on `ConfigPort`
//! fall back to defaults on malformed input, so values are re-read as text
//! here and parse failures are reported.

use std::str::FromStr;

use crate::domain::allocation::{PositivityFilter, Weighting};
use crate::domain::error::MomentraderError;
use crate::domain::hurst::{MAX_HURST_POWER, MIN_HURST_POWER};
use crate::domain::signal::SignalKind;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    validate_initial_capital(config)?;
    validate_costs(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_codes(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    validate_min_int(config, "momentum_window", 1)?;
    validate_min_int(config, "total_window", 2)?;
    validate_min_int(config, "num_stocks", 1)?;
    validate_min_int(config, "rsi_window", 1)?;
    validate_min_int(config, "macd_fast", 1)?;
    validate_min_int(config, "macd_slow", 1)?;
    validate_min_int(config, "macd_signal", 1)?;
    validate_long_percentile(config)?;
    validate_hurst_power(config)?;
    validate_enum::<SignalKind>(config, "signal")?;
    validate_enum::<PositivityFilter>(config, "positivity_filter")?;
    validate_enum::<Weighting>(config, "weighting")?;
    validate_regime_code(config)?;
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let min = parse_value::<i64>(config, "sweep", "momentum_window_min")?.unwrap_or(1);
    let max = parse_value::<i64>(config, "sweep", "momentum_window_max")?.unwrap_or(20);
    let steps = parse_value::<i64>(config, "sweep", "percentile_steps")?.unwrap_or(16);

    if min < 1 {
        return Err(invalid("sweep", "momentum_window_min", "must be at least 1"));
    }
    if max < min {
        return Err(invalid(
            "sweep",
            "momentum_window_max",
            "must not be below momentum_window_min",
        ));
    }
    if steps < 1 {
        return Err(invalid("sweep", "percentile_steps", "must be at least 1"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> MomentraderError {
    MomentraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// `Ok(None)` when absent, `Err` when present but unparseable.
fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, MomentraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("cannot parse '{}'", raw))),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let value = parse_value::<f64>(config, "backtest", "initial_capital")?.unwrap_or(1_000_000.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    for key in ["commission_per_trade", "commission_pct", "slippage_pct"] {
        let value = parse_value::<f64>(config, "backtest", key)?.unwrap_or(0.0);
        if value < 0.0 {
            return Err(invalid(
                "backtest",
                key,
                &format!("{} must be non-negative", key),
            ));
        }
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let value = parse_value::<f64>(config, "backtest", "risk_free_rate")?.unwrap_or(0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MomentraderError> {
    match value {
        None => Err(MomentraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn validate_codes(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let Some(raw) = config.get_string("backtest", "codes") else {
        return Err(MomentraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "codes".to_string(),
        });
    };
    let codes = parse_codes(&raw).map_err(|e| invalid("backtest", "codes", &e.to_string()))?;

    if let Some(benchmark) = config.get_string("backtest", "benchmark") {
        if !codes.contains(&benchmark.to_uppercase()) {
            return Err(invalid(
                "backtest",
                "benchmark",
                "benchmark must be one of codes",
            ));
        }
    }
    Ok(())
}

fn validate_min_int(config: &dyn ConfigPort, key: &str, min: i64) -> Result<(), MomentraderError> {
    if let Some(value) = parse_value::<i64>(config, "strategy", key)? {
        if value < min {
            return Err(invalid(
                "strategy",
                key,
                &format!("{} must be at least {}", key, min),
            ));
        }
    }
    Ok(())
}

fn validate_long_percentile(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    if let Some(value) = parse_value::<f64>(config, "strategy", "long_percentile")? {
        if value <= 0.0 || value > 1.0 {
            return Err(invalid(
                "strategy",
                "long_percentile",
                "long_percentile must be in (0, 1]",
            ));
        }
    }
    Ok(())
}

fn validate_hurst_power(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    if let Some(value) = parse_value::<i64>(config, "strategy", "hurst_power")? {
        if value < MIN_HURST_POWER as i64 || value > MAX_HURST_POWER as i64 {
            return Err(invalid(
                "strategy",
                "hurst_power",
                &format!(
                    "hurst_power must be between {} and {}",
                    MIN_HURST_POWER, MAX_HURST_POWER
                ),
            ));
        }
    }
    Ok(())
}

fn validate_enum<T>(config: &dyn ConfigPort, key: &str) -> Result<(), MomentraderError>
where
    T: FromStr<Err = String>,
{
    if let Some(raw) = config.get_string("strategy", key) {
        raw.parse::<T>()
            .map_err(|reason| invalid("strategy", key, &reason))?;
    }
    Ok(())
}

fn validate_regime_code(config: &dyn ConfigPort) -> Result<(), MomentraderError> {
    let Some(code) = config.get_string("strategy", "regime_code") else {
        return Ok(());
    };
    let codes = config
        .get_string("backtest", "codes")
        .and_then(|raw| parse_codes(&raw).ok())
        .unwrap_or_default();
    if !codes.contains(&code.to_uppercase()) {
        return Err(invalid(
            "strategy",
            "regime_code",
            "regime_code must be one of codes",
        ));
    }
    Ok(())
}
