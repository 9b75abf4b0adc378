//! Performance metrics over an equity curve and its closed trades.
//!
//! total_return      = final / initial - 1
//! annualized_return = (1 + total_return)^(252 / bars) - 1
//! sharpe            = mean(excess daily return) / stdev * sqrt(252)
//! sortino           = mean(excess daily return) / downside deviation * sqrt(252)
//! drawdown[t]       = (equity[t] - peak[t]) / peak[t]

use super::backtest::EquityPoint;
use super::position::ClosedTrade;
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeStats {
    pub total: usize,
    pub won: usize,
    pub lost: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_days: f64,
    pub total_commission: f64,
}

impl TradeStats {
    /// Wins and losses are judged on PnL net of commission.
    pub fn from_trades(trades: &[ClosedTrade]) -> Self {
        let mut stats = TradeStats::default();
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut total_days = 0i64;

        for trade in trades {
            let pnl = trade.net_pnl();
            if pnl > 0.0 {
                stats.won += 1;
                total_wins += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
            } else if pnl < 0.0 {
                stats.lost += 1;
                total_losses += pnl.abs();
                stats.largest_loss = stats.largest_loss.max(pnl.abs());
            } else {
                stats.breakeven += 1;
            }
            total_days += trade.holding_days();
            stats.total_commission += trade.commission;
        }

        stats.total = trades.len();
        if stats.total > 0 {
            stats.win_rate = stats.won as f64 / stats.total as f64;
            stats.avg_holding_days = total_days as f64 / stats.total as f64;
        }
        stats.profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        if stats.won > 0 {
            stats.avg_win = total_wins / stats.won as f64;
        }
        if stats.lost > 0 {
            stats.avg_loss = total_losses / stats.lost as f64;
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub trades: TradeStats,
}

impl Metrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
        initial_capital: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            final_equity / initial_capital - 1.0
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(equity_curve, daily_rf);

        Metrics {
            initial_capital,
            final_equity,
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            trades: TradeStats::from_trades(trades),
        }
    }
}

/// Per-bar drawdown from the running peak; zero or negative.
pub fn drawdown_series(equity_curve: &[EquityPoint]) -> Vec<(NaiveDate, f64)> {
    let mut peak = f64::NEG_INFINITY;
    equity_curve
        .iter()
        .map(|point| {
            peak = peak.max(point.equity);
            let dd = if peak > 0.0 {
                (point.equity - peak) / peak
            } else {
                0.0
            };
            (point.date, dd)
        })
        .collect()
}

/// Largest peak-to-trough loss as a positive fraction, and the longest
/// stretch of bars below a peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut duration = 0usize;

    for (_, dd) in drawdown_series(equity_curve) {
        if dd < 0.0 {
            duration += 1;
            max_duration = max_duration.max(duration);
            max_dd = max_dd.max(-dd);
        } else {
            duration = 0;
        }
    }

    (max_dd, max_duration)
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                w[1].equity / w[0].equity - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let stddev = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt();
    let excess_return = mean - daily_rf;
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if stddev > 0.0 {
        excess_return / stddev * annualizer
    } else {
        0.0
    };

    let downside = (returns
        .iter()
        .map(|r| (r - daily_rf).min(0.0).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let sortino = if downside > 0.0 {
        excess_return / downside * annualizer
    } else {
        0.0
    };

    (sharpe, sortino)
}
