//! Historical spread feeds.

use crate::domain::{Commodity, QuoteTable};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

pub mod csv_file;
pub mod http;
pub mod mock;

pub use csv_file::CsvSpreadFeed;
pub use http::HttpSpreadFeed;
pub use mock::MockSpreadFeed;

/// Source of daily near/long-term spread quotes.
#[async_trait]
pub trait SpreadFeed: Send + Sync + fmt::Debug {
    /// Fetch quotes for `commodities` between `start` and `end` (inclusive).
    ///
    /// Dates or commodities without data are simply absent from the table.
    async fn fetch_spreads(
        &self,
        commodities: &[Commodity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteTable, FeedError>;
}

/// Error type for spread feed operations.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Connection timeout, DNS failure and the like
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success HTTP status (429 and 5xx are retried first)
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    /// Malformed CSV/JSON payload
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate limited")]
    RateLimited,
    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(String),
    /// The feed returned no quotes at all for the requested range
    #[error("No spread data between {start} and {end}")]
    Empty { start: NaiveDate, end: NaiveDate },
}
