//! In-memory spread feed for tests.

use super::{FeedError, SpreadFeed};
use crate::domain::{Commodity, QuoteTable, SpreadQuote};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Feed that serves a fixed quote table, or a fixed error.
#[derive(Debug, Clone, Default)]
pub struct MockSpreadFeed {
    table: QuoteTable,
    error: Option<FeedError>,
}

impl MockSpreadFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, date: NaiveDate, commodity: Commodity, quote: SpreadQuote) -> Self {
        self.table.insert(date, commodity, quote);
        self
    }

    pub fn with_table(mut self, table: QuoteTable) -> Self {
        self.table = table;
        self
    }

    /// Make every fetch fail with `error`.
    pub fn failing(mut self, error: FeedError) -> Self {
        self.error = Some(error);
        self
    }
}

#[async_trait]
impl SpreadFeed for MockSpreadFeed {
    async fn fetch_spreads(
        &self,
        commodities: &[Commodity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteTable, FeedError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(self.table.filtered(commodities, start, end))
    }
}
