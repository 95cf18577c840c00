//! Domain types for the spread backtester.
//!
//! This module provides:
//! - Exact decimal arithmetic via the Decimal wrapper
//! - Commodity identifiers
//! - Spread quotes and the date-indexed quote table
//! - Typed ledger records

pub mod decimal;
pub mod ledger_entry;
pub mod primitives;
pub mod quote;

pub use decimal::Decimal;
pub use ledger_entry::{LedgerEntry, TradeAction};
pub use primitives::Commodity;
pub use quote::{QuoteTable, SpreadQuote};
