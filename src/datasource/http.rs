//! HTTP spread feed client.

use super::{FeedError, SpreadFeed};
use crate::domain::{Commodity, Decimal, QuoteTable, SpreadQuote};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// One row of the `/spreads` response. Null prices mean no quote.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadRow {
    pub date: NaiveDate,
    pub commodity: String,
    pub near_term: Option<Decimal>,
    pub long_term: Option<Decimal>,
}

/// Feed backed by `GET {base_url}/spreads?commodities=..&start=..&end=..`.
#[derive(Debug, Clone)]
pub struct HttpSpreadFeed {
    client: Client,
    base_url: String,
}

impl HttpSpreadFeed {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_rows(
        &self,
        commodities: &[Commodity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SpreadRow>, FeedError> {
        let url = format!("{}/spreads", self.base_url);
        let query = [
            (
                "commodities",
                commodities
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            ("start", start.to_string()),
            ("end", end.to_string()),
        ];
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .query(&query)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(FeedError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                warn!("spread feed rate limited, backing off");
                return Err(backoff::Error::transient(FeedError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(FeedError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(FeedError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Vec<SpreadRow>>()
                .await
                .map_err(|e| backoff::Error::permanent(FeedError::Parse(e.to_string())))
        })
        .await
    }

    /// Build a quote table, dropping rows with a missing leg.
    pub fn rows_to_table(rows: Vec<SpreadRow>) -> QuoteTable {
        let mut table = QuoteTable::new();
        for row in rows {
            match (row.near_term, row.long_term) {
                (Some(near), Some(long)) => {
                    table.insert(row.date, Commodity::new(row.commodity), SpreadQuote::new(near, long))
                }
                _ => debug!("{} {}: quote unavailable", row.date, row.commodity),
            }
        }
        table
    }
}

#[async_trait]
impl SpreadFeed for HttpSpreadFeed {
    async fn fetch_spreads(
        &self,
        commodities: &[Commodity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<QuoteTable, FeedError> {
        let rows = self.get_rows(commodities, start, end).await?;
        debug!("spread feed returned {} rows", rows.len());
        Ok(Self::rows_to_table(rows).filtered(commodities, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_to_table_skips_null_legs() {
        let rows: Vec<SpreadRow> = serde_json::from_str(
            r#"[
                {"date": "2025-01-02", "commodity": "CORN", "near_term": 1.5, "long_term": 2.0},
                {"date": "2025-01-03", "commodity": "CORN", "near_term": null, "long_term": 2.1}
            ]"#,
        )
        .unwrap();

        let table = HttpSpreadFeed::rows_to_table(rows);
        let corn = Commodity::from("CORN");
        assert_eq!(table.len(), 1);
        assert!(table
            .quote(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(), &corn)
            .is_some());
        assert!(table
            .quote(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(), &corn)
            .is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let feed = HttpSpreadFeed::new("http://localhost:9000/".to_string());
        assert_eq!(feed.base_url, "http://localhost:9000");
    }
}
