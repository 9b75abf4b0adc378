//! Per-instrument CSV price feed.
//!
//! One `<CODE>.csv` per instrument with a header row. Columns are found by
//! name so exports with extra fields (`Adj Close`, `Dividends`) load as-is.

use crate::domain::error::MomentraderError;
use crate::domain::ohlcv::{MISSING_SENTINEL, PriceBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    data_dir: PathBuf,
}

/// Positions of the required columns within a header row.
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, code: &str) -> Result<Self, MomentraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| MomentraderError::Data {
                    reason: format!("{}.csv: missing '{}' column", code, name),
                })
        };
        Ok(Columns {
            date: find("date")?,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

impl CsvAdapter {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", code))
    }
}

fn parse_date(raw: &str, code: &str) -> Result<NaiveDate, MomentraderError> {
    let raw = raw.trim();
    // Intraday-stamped exports ("2024-01-15 00:00:00-05:00") keep the date prefix.
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| MomentraderError::Data {
        reason: format!("{}.csv: invalid date '{}': {}", code, raw, e),
    })
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    code: &str,
) -> Result<f64, MomentraderError> {
    let raw = record.get(index).unwrap_or("").trim();
    if raw.is_empty() {
        return Ok(MISSING_SENTINEL);
    }
    raw.parse::<f64>().map_err(|e| MomentraderError::Data {
        reason: format!("{}.csv: invalid {} value '{}': {}", code, name, raw, e),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, MomentraderError> {
        let path = self.csv_path(code);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MomentraderError::NoData {
                    code: code.to_string(),
                });
            }
            Err(e) => return Err(MomentraderError::Io(e)),
        };

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = rdr.headers().map_err(|e| MomentraderError::Data {
            reason: format!("{}.csv: CSV parse error: {}", code, e),
        })?;
        let cols = Columns::from_headers(headers, code)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| MomentraderError::Data {
                reason: format!("{}.csv: CSV parse error: {}", code, e),
            })?;

            let date = parse_date(record.get(cols.date).unwrap_or(""), code)?;
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(PriceBar {
                code: code.to_string(),
                date,
                open: parse_field(&record, cols.open, "open", code)?,
                high: parse_field(&record, cols.high, "high", code)?,
                low: parse_field(&record, cols.low, "low", code)?,
                close: parse_field(&record, cols.close, "close", code)?,
                volume: parse_field(&record, cols.volume, "volume", code)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MomentraderError> {
        let entries = fs::read_dir(&self.data_dir)?;
        let mut symbols = Vec::new();

        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
