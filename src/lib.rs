pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod export;
pub mod orchestration;

pub use config::{Config, SpreadSource};
pub use datasource::{CsvSpreadFeed, FeedError, HttpSpreadFeed, MockSpreadFeed, SpreadFeed};
pub use db::{init_db, ChainStore};
pub use domain::{Commodity, Decimal, LedgerEntry, QuoteTable, SpreadQuote, TradeAction};
pub use engine::{Ledger, RebalanceOutcome, SpreadBroker, SpreadPosition, TradeRejection};
pub use error::AppError;
pub use orchestration::{BacktestRunner, RunSummary};
