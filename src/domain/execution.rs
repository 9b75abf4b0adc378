//! Target-fraction order execution against a cash book.
//!
//! Implements sizing, slippage and commission for the paper execution
//! collaborator. Whole shares only; long only.

use chrono::NaiveDate;

use super::cash_book::CashBook;
use super::tracker::{FillReport, FillStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionConfig {
    pub commission_per_trade: f64,
    /// Percent of traded value.
    pub commission_pct: f64,
    pub slippage_pct: f64,
}

/// Calculate commission: flat_fee + (trade_value * pct / 100).
pub fn calculate_commission(trade_value: f64, config: &ExecutionConfig) -> f64 {
    config.commission_per_trade + (trade_value * config.commission_pct / 100.0)
}

/// Buy: execution_price = market_price * (1 + slippage_pct / 100)
pub fn apply_slippage_buy(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 + slippage_pct / 100.0)
}

/// Sell: execution_price = market_price * (1 - slippage_pct / 100)
pub fn apply_slippage_sell(market_price: f64, slippage_pct: f64) -> f64 {
    market_price * (1.0 - slippage_pct / 100.0)
}

/// Whole shares of `code` that make up `target_fraction` of `equity`.
pub fn target_shares(target_fraction: f64, equity: f64, market_price: f64) -> i64 {
    if target_fraction <= 0.0 || market_price <= 0.0 || equity <= 0.0 {
        return 0;
    }
    (equity * target_fraction / market_price).floor() as i64
}

/// Move the holding in `code` to `target_fraction` of `equity`.
///
/// Steps:
/// 1. Size the target in whole shares at the market price
/// 2. Sell the excess, or buy the shortfall, at the slipped price
/// 3. Buys that cost more than available cash are refused with `Margin`
///
/// Returns `None` when the holding is already at target.
pub fn order_target_fraction(
    book: &mut CashBook,
    code: &str,
    target_fraction: f64,
    equity: f64,
    market_price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> Option<FillReport> {
    let delta = target_shares(target_fraction, equity, market_price) - book.shares(code);
    if delta == 0 {
        return None;
    }

    let report = |price: f64, commission: f64, status: FillStatus| FillReport {
        code: code.to_string(),
        date,
        shares: delta,
        price,
        commission,
        status,
    };

    if delta < 0 {
        let execution_price = apply_slippage_sell(market_price, config.slippage_pct);
        let commission = calculate_commission(-delta as f64 * execution_price, config);
        book.sell(code, -delta, execution_price, commission);
        return Some(report(execution_price, commission, FillStatus::Filled));
    }

    let execution_price = apply_slippage_buy(market_price, config.slippage_pct);
    let commission = calculate_commission(delta as f64 * execution_price, config);
    if !book.can_afford(delta, execution_price, commission) {
        return Some(report(execution_price, 0.0, FillStatus::Margin));
    }

    book.buy(code, delta, execution_price, commission);
    Some(report(execution_price, commission, FillStatus::Filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn no_costs() -> ExecutionConfig {
        ExecutionConfig::default()
    }

    #[test]
    fn commission_flat_plus_pct() {
        let config = ExecutionConfig {
            commission_per_trade: 10.0,
            commission_pct: 0.1,
            slippage_pct: 0.0,
        };
        assert!((calculate_commission(10_000.0, &config) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slippage_moves_price_against_trader() {
        assert!((apply_slippage_buy(100.0, 1.0) - 101.0).abs() < 1e-12);
        assert!((apply_slippage_sell(100.0, 1.0) - 99.0).abs() < 1e-12);
    }

    #[test]
    fn target_shares_floor() {
        assert_eq!(target_shares(0.9, 100_000.0, 33.0), 2727);
        assert_eq!(target_shares(0.0, 100_000.0, 33.0), 0);
        assert_eq!(target_shares(0.5, 100_000.0, -1.0), 0);
    }

    #[test]
    fn buy_opens_position_and_debits_cash() {
        let mut book = CashBook::new(100_000.0);
        let fill =
            order_target_fraction(&mut book, "XLK", 0.5, 100_000.0, 100.0, date(), &no_costs())
                .unwrap();
        assert_eq!(fill.status, FillStatus::Filled);
        assert_eq!(fill.shares, 500);
        assert!((book.cash - 50_000.0).abs() < f64::EPSILON);
        assert_eq!(book.shares("XLK"), 500);
    }

    #[test]
    fn at_target_is_no_order() {
        let mut book = CashBook::new(100_000.0);
        order_target_fraction(&mut book, "XLK", 0.5, 100_000.0, 100.0, date(), &no_costs());
        assert!(
            order_target_fraction(&mut book, "XLK", 0.5, 100_000.0, 100.0, date(), &no_costs())
                .is_none()
        );
    }

    #[test]
    fn sell_to_zero_clears_holding() {
        let mut book = CashBook::new(10_000.0);
        order_target_fraction(&mut book, "XLK", 0.5, 10_000.0, 100.0, date(), &no_costs());
        let fill =
            order_target_fraction(&mut book, "XLK", 0.0, 10_000.0, 110.0, date(), &no_costs())
                .unwrap();
        assert_eq!(fill.shares, -50);
        assert!(book.is_flat());
        assert!((book.cash - 10_500.0).abs() < 1e-9);
    }

    #[test]
    fn partial_sell_reduces_holding() {
        let mut book = CashBook::new(10_000.0);
        order_target_fraction(&mut book, "XLK", 0.8, 10_000.0, 100.0, date(), &no_costs());
        let fill =
            order_target_fraction(&mut book, "XLK", 0.3, 10_000.0, 100.0, date(), &no_costs())
                .unwrap();
        assert_eq!(fill.shares, -50);
        assert_eq!(book.shares("XLK"), 30);
    }

    #[test]
    fn buy_beyond_cash_is_margin() {
        let mut book = CashBook::new(1_000.0);
        let fill =
            order_target_fraction(&mut book, "XLK", 0.9, 10_000.0, 100.0, date(), &no_costs())
                .unwrap();
        assert_eq!(fill.status, FillStatus::Margin);
        assert!((book.cash - 1_000.0).abs() < f64::EPSILON);
        assert!(book.is_flat());
    }

    #[test]
    fn commission_is_charged_both_ways() {
        let config = ExecutionConfig {
            commission_per_trade: 0.0,
            commission_pct: 1.0,
            slippage_pct: 0.0,
        };
        let mut book = CashBook::new(10_000.0);
        order_target_fraction(&mut book, "XLK", 0.5, 10_000.0, 100.0, date(), &config);
        assert!((book.cash - 4_950.0).abs() < 1e-9);
        order_target_fraction(&mut book, "XLK", 0.0, 10_000.0, 100.0, date(), &config);
        assert!((book.cash - 9_900.0).abs() < 1e-9);
    }
}
