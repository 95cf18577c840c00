//! Day-by-day backtest replay and end-of-run persistence.

pub mod calendar;
pub mod runner;

pub use calendar::business_days;
pub use runner::{open_or_create_chain, BacktestRunner, ReplayStats, RunError, RunSummary};
