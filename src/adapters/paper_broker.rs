//! Paper execution collaborator: fills target fractions at the bar's close.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::execution::{order_target_fraction, ExecutionConfig};
use crate::domain::cash_book::CashBook;
use crate::domain::tracker::{FillReport, FillStatus, Instruction};
use crate::ports::execution_port::ExecutionPort;

/// Cheat-on-close broker. Every instruction in a batch is sized against
/// the equity at the start of the batch and executed in order, so sells
/// free cash for the buys behind them.
#[derive(Debug, Clone)]
pub struct PaperBroker {
    book: CashBook,
    config: ExecutionConfig,
    last_prices: HashMap<String, f64>,
}

impl PaperBroker {
    pub fn new(initial_capital: f64, config: ExecutionConfig) -> Self {
        PaperBroker {
            book: CashBook::new(initial_capital),
            config,
            last_prices: HashMap::new(),
        }
    }

    pub fn book(&self) -> &CashBook {
        &self.book
    }

    fn mark(&mut self, prices: &HashMap<String, f64>) {
        for (code, price) in prices {
            if *price > 0.0 {
                self.last_prices.insert(code.clone(), *price);
            }
        }
    }
}

impl ExecutionPort for PaperBroker {
    fn execute(
        &mut self,
        date: NaiveDate,
        instructions: &[Instruction],
        prices: &HashMap<String, f64>,
    ) -> Vec<FillReport> {
        self.mark(prices);
        let equity = self.book.total_equity(&self.last_prices);

        let mut fills = Vec::new();
        for instruction in instructions {
            let Some(&price) = prices.get(&instruction.code) else {
                debug!(code = %instruction.code, %date, "no price, order canceled");
                fills.push(FillReport {
                    code: instruction.code.clone(),
                    date,
                    shares: 0,
                    price: 0.0,
                    commission: 0.0,
                    status: FillStatus::Canceled,
                });
                continue;
            };

            if let Some(fill) = order_target_fraction(
                &mut self.book,
                &instruction.code,
                instruction.target_fraction,
                equity,
                price,
                date,
                &self.config,
            ) {
                fills.push(fill);
            }
        }
        fills
    }

    fn equity(&mut self, prices: &HashMap<String, f64>) -> f64 {
        self.mark(prices);
        self.book.total_equity(&self.last_prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tracker::InstructionKind;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn instruction(code: &str, target_fraction: f64, kind: InstructionKind) -> Instruction {
        Instruction {
            code: code.into(),
            target_fraction,
            kind,
        }
    }

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(c, p)| (c.to_string(), *p)).collect()
    }

    #[test]
    fn sells_fund_later_buys_in_the_same_batch() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        broker.execute(
            date(),
            &[instruction("A", 0.9, InstructionKind::Open)],
            &prices(&[("A", 100.0)]),
        );
        assert!((broker.book().cash - 1_000.0).abs() < 1e-9);

        let fills = broker.execute(
            date(),
            &[
                instruction("A", 0.0, InstructionKind::Sell),
                instruction("B", 0.9, InstructionKind::Open),
            ],
            &prices(&[("A", 100.0), ("B", 50.0)]),
        );
        assert_eq!(fills.len(), 2);
        assert!(fills.iter().all(|f| f.status == FillStatus::Filled));
        assert_eq!(fills[1].shares, 180);
    }

    #[test]
    fn unpriced_instruction_is_canceled() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        let fills = broker.execute(
            date(),
            &[instruction("A", 0.5, InstructionKind::Open)],
            &HashMap::new(),
        );
        assert_eq!(fills[0].status, FillStatus::Canceled);
        assert!(broker.book().is_flat());
    }

    #[test]
    fn equity_marks_at_last_known_price() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        broker.execute(
            date(),
            &[instruction("A", 0.5, InstructionKind::Open)],
            &prices(&[("A", 100.0)]),
        );
        assert!((broker.equity(&prices(&[("A", 120.0)])) - 11_000.0).abs() < 1e-9);
        // A missing from today's prices keeps yesterday's mark
        assert!((broker.equity(&HashMap::new()) - 11_000.0).abs() < 1e-9);
    }

    #[test]
    fn batch_is_sized_against_opening_equity() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        let fills = broker.execute(
            date(),
            &[
                instruction("A", 0.45, InstructionKind::Open),
                instruction("B", 0.45, InstructionKind::Open),
            ],
            &prices(&[("A", 30.0), ("B", 70.0)]),
        );
        // 4_500 / 30 and 4_500 / 70, both against the 10_000 opening equity
        assert_eq!(fills[0].shares, 150);
        assert_eq!(fills[1].shares, 64);
        assert!((broker.book().cash - (10_000.0 - 4_500.0 - 4_480.0)).abs() < 1e-9);
    }

    #[test]
    fn buy_beyond_remaining_cash_is_margin_and_leaves_book_alone() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        let fills = broker.execute(
            date(),
            &[
                instruction("A", 0.9, InstructionKind::Open),
                instruction("B", 0.9, InstructionKind::Open),
            ],
            &prices(&[("A", 100.0), ("B", 100.0)]),
        );
        assert_eq!(fills[0].status, FillStatus::Filled);
        assert_eq!(fills[1].status, FillStatus::Margin);
        assert_eq!(fills[1].commission, 0.0);
        assert_eq!(broker.book().shares("B"), 0);
        assert!((broker.book().cash - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn holding_at_target_produces_no_fill() {
        let mut broker = PaperBroker::new(10_000.0, ExecutionConfig::default());
        let open = [instruction("A", 0.5, InstructionKind::Open)];
        broker.execute(date(), &open, &prices(&[("A", 100.0)]));
        let fills = broker.execute(
            date(),
            &[instruction("A", 0.5, InstructionKind::Rebalance)],
            &prices(&[("A", 100.0)]),
        );
        assert!(fills.is_empty());
    }

    #[test]
    fn commission_reduces_cash_on_both_legs() {
        let config = ExecutionConfig {
            commission_pct: 0.5,
            ..ExecutionConfig::default()
        };
        let mut broker = PaperBroker::new(10_000.0, config);
        broker.execute(
            date(),
            &[instruction("A", 0.5, InstructionKind::Open)],
            &prices(&[("A", 100.0)]),
        );
        let fills = broker.execute(
            date(),
            &[instruction("A", 0.0, InstructionKind::Sell)],
            &prices(&[("A", 100.0)]),
        );
        assert_eq!(fills[0].shares, -50);
        assert!((fills[0].commission - 25.0).abs() < 1e-9);
        assert!((broker.book().cash - 9_950.0).abs() < 1e-9);
        assert!(broker.book().is_flat());
    }
}
