//! Spread quotes from a local CSV file.
//!
//! Expected header: `date,commodity,near_term,long_term`. A blank price cell
//! marks the quote as unavailable for that day.

use super::{FeedError, SpreadFeed};
use crate::domain::{Commodity, Decimal, QuoteTable, SpreadQuote};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CsvSpreadFeed {
    path: PathBuf,
}

impl CsvSpreadFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse_csv(csv_bytes: &[u8]) -> Result<QuoteTable, FeedError> {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            date: String,
            commodity: String,
            near_term: Option<String>,
            long_term: Option<String>,
        }

        fn parse_price(cell: Option<&str>, column: &str) -> Result<Option<Decimal>, FeedError> {
            match cell.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => Decimal::from_str_canonical(s)
                    .map(Some)
                    .map_err(|e| FeedError::Parse(format!("invalid {}: {}", column, e))),
            }
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_bytes);

        let mut table = QuoteTable::new();
        for record in reader.deserialize::<Row>() {
            let row = record.map_err(|e| FeedError::Parse(e.to_string()))?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map_err(|e| FeedError::Parse(format!("invalid date {}: {}", row.date, e)))?;
            let near = parse_price(row.near_term.as_deref(), "near_term")?;
            let long = parse_price(row.long_term.as_deref(), "long_term")?;

            match (near, long) {
                (Some(near), Some(long)) => {
                    table.insert(date, Commodity::new(row.commodity), SpreadQuote::new(near, long))
                }
                _ => debug!("{} {}: incomplete quote row, treated as unavailable", date, row.commodity),
            }
        }

        Ok(table)
    }
}

#[async_trait]
impl SpreadFeed for CsvSpreadFeed {
    async fn fetch_spreads(
        &self,
        commodities: &[Commodity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteTable, FeedError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| FeedError::Io(format!("{}: {}", self.path.display(), e)))?;
        Ok(Self::parse_csv(&bytes)?.filtered(commodities, start, end))
    }
}
