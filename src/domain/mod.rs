//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod code_data;
pub mod indicator;
pub mod signal;
pub mod hurst;
pub mod regime;
pub mod universe;
pub mod allocation;
pub mod position;
pub mod cash_book;
pub mod tracker;
pub mod execution;
pub mod strategy;
pub mod engine;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
