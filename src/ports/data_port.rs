//! Price feed port trait.

use crate::domain::error::MomentraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` within `[start_date, end_date]`, oldest first.
    /// Dates with no data may carry `-1` sentinel fields.
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MomentraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, MomentraderError>;
}
