//! Long-only position and closed-trade records.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub code: String,
    pub shares: i64,
    /// Volume-weighted average fill price of the shares held.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    /// Gross PnL already realised by partial sells.
    pub realized_pnl: f64,
    pub commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares as f64 * (price - self.entry_price)
    }

    /// Add shares at `price`, re-averaging the entry price.
    pub fn add(&mut self, shares: i64, price: f64, commission: f64) {
        let total = self.shares + shares;
        if total > 0 {
            self.entry_price = (self.shares as f64 * self.entry_price + shares as f64 * price)
                / total as f64;
        }
        self.shares = total;
        self.commission += commission;
    }

    /// Remove up to `shares` at `price`, realising the PnL on them.
    pub fn reduce(&mut self, shares: i64, price: f64, commission: f64) {
        let sold = shares.min(self.shares);
        self.realized_pnl += sold as f64 * (price - self.entry_price);
        self.shares -= sold;
        self.commission += commission;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub code: String,
    /// Shares sold by the closing fill.
    pub shares: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    pub commission: f64,
}

impl ClosedTrade {
    pub fn net_pnl(&self) -> f64 {
        self.pnl - self.commission
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
