//! Order-execution collaborator port.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::tracker::{FillReport, Instruction};

/// Turns target fractions into share orders and reports what happened.
pub trait ExecutionPort {
    /// Execute `instructions` in order at `prices` (tradeable closes only).
    /// One report per instruction that resulted in an order.
    fn execute(
        &mut self,
        date: NaiveDate,
        instructions: &[Instruction],
        prices: &HashMap<String, f64>,
    ) -> Vec<FillReport>;

    /// Cash plus marked-to-market holdings. Holdings without a price in
    /// `prices` are marked at their last known price.
    fn equity(&mut self, prices: &HashMap<String, f64>) -> f64;
}
