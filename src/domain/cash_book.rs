//! Cash and share balances held by the paper execution collaborator.
//!
//! The book only settles money and shares. Entry prices, realised PnL and
//! closed trades belong to the engine's `PortfolioTracker`.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holding {
    pub shares: i64,
    /// Price of the most recent fill, used to mark the holding when no
    /// quote is available.
    pub last_fill: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashBook {
    pub cash: f64,
    holdings: BTreeMap<String, Holding>,
}

impl CashBook {
    pub fn new(cash: f64) -> Self {
        CashBook {
            cash,
            holdings: BTreeMap::new(),
        }
    }

    pub fn shares(&self, code: &str) -> i64 {
        self.holdings.get(code).map_or(0, |h| h.shares)
    }

    pub fn holdings(&self) -> impl Iterator<Item = (&str, &Holding)> {
        self.holdings.iter().map(|(code, h)| (code.as_str(), h))
    }

    pub fn is_flat(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Whether `shares` at `price` plus `commission` fits in cash.
    pub fn can_afford(&self, shares: i64, price: f64, commission: f64) -> bool {
        shares as f64 * price + commission <= self.cash
    }

    pub fn buy(&mut self, code: &str, shares: i64, price: f64, commission: f64) {
        self.cash -= shares as f64 * price + commission;
        let holding = self.holdings.entry(code.to_string()).or_insert(Holding {
            shares: 0,
            last_fill: price,
        });
        holding.shares += shares;
        holding.last_fill = price;
    }

    /// Sell up to the shares held; returns the number actually sold.
    pub fn sell(&mut self, code: &str, shares: i64, price: f64, commission: f64) -> i64 {
        let Some(holding) = self.holdings.get_mut(code) else {
            return 0;
        };
        let sold = shares.min(holding.shares);
        self.cash += sold as f64 * price - commission;
        holding.shares -= sold;
        holding.last_fill = price;
        if holding.shares == 0 {
            self.holdings.remove(code);
        }
        sold
    }

    /// Cash plus holdings marked at `marks`, falling back to the last fill.
    pub fn total_equity(&self, marks: &HashMap<String, f64>) -> f64 {
        self.cash
            + self
                .holdings
                .iter()
                .map(|(code, h)| {
                    let mark = marks.get(code).copied().unwrap_or(h.last_fill);
                    h.shares as f64 * mark
                })
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_settles_cash() {
        let mut book = CashBook::new(10_000.0);
        book.buy("XLE", 40, 100.0, 4.0);
        assert_eq!(book.cash, 5_996.0);
        assert_eq!(book.shares("XLE"), 40);

        assert_eq!(book.sell("XLE", 40, 110.0, 4.4), 40);
        assert!((book.cash - 10_391.6).abs() < 1e-9);
        assert!(book.is_flat());
    }

    #[test]
    fn oversell_is_capped_at_holding() {
        let mut book = CashBook::new(1_000.0);
        book.buy("XLF", 5, 30.0, 0.0);
        assert_eq!(book.sell("XLF", 9, 30.0, 0.0), 5);
        assert_eq!(book.sell("XLK", 1, 30.0, 0.0), 0);
        assert_eq!(book.cash, 1_000.0);
    }

    #[test]
    fn unmarked_holdings_use_last_fill() {
        let mut book = CashBook::new(10_000.0);
        book.buy("XLE", 10, 100.0, 0.0);
        book.buy("XLU", 10, 50.0, 0.0);
        let marks: HashMap<String, f64> = [("XLE".to_string(), 120.0)].into_iter().collect();
        assert_eq!(book.total_equity(&marks), 8_500.0 + 1_200.0 + 500.0);
        assert_eq!(book.holdings().map(|(c, _)| c).collect::<Vec<_>>(), vec!["XLE", "XLU"]);
    }
}
