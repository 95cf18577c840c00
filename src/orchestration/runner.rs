use crate::config::Config;
use crate::datasource::{FeedError, SpreadFeed};
use crate::db::{ChainError, ChainStore};
use crate::domain::{Commodity, Decimal, LedgerEntry, QuoteTable, SpreadQuote};
use crate::engine::{RebalanceOutcome, SpreadBroker};
use crate::export::{self, ExportError};
use sqlx::sqlite::SqlitePool;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::business_days;

/// Replays one rebalance per commodity per business day, then persists the ledger.
#[derive(Clone)]
pub struct BacktestRunner {
    feed: Arc<dyn SpreadFeed>,
    pool: SqlitePool,
    config: Config,
}

/// Counters from a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub days_processed: usize,
    pub rebalances_executed: usize,
    pub rebalances_unchanged: usize,
    pub rebalances_rejected: usize,
    pub quotes_unavailable: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub stats: ReplayStats,
    pub final_cash: Decimal,
    pub portfolio_value: Decimal,
    pub ledger_entries: Vec<LedgerEntry>,
    pub ledger_path: PathBuf,
    pub block_height: i64,
    pub block_hash: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("ledger serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl BacktestRunner {
    pub fn new(feed: Arc<dyn SpreadFeed>, pool: SqlitePool, config: Config) -> Self {
        Self { feed, pool, config }
    }

    /// Run the full date range.
    ///
    /// # Errors
    /// Fails only when the feed has no usable data, or when the ledger
    /// cannot be exported or sealed. Rejected trades and missing quotes are
    /// logged and skipped.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        let run_id = Uuid::new_v4().to_string();
        let (start, end) = (self.config.start_date, self.config.end_date);
        info!(
            "Run {}: {} commodities from {} to {}",
            run_id,
            self.config.commodities.len(),
            start,
            end
        );

        let table = self
            .feed
            .fetch_spreads(&self.config.commodities, start, end)
            .await?;
        if table.is_empty() {
            return Err(FeedError::Empty { start, end }.into());
        }

        let mut broker = SpreadBroker::new(self.config.initial_cash);
        let (stats, last_quotes) = self.replay(&mut broker, &table);

        let final_cash = broker.cash_balance();
        let portfolio_value = broker.portfolio_value(&last_quotes);
        let ledger = broker.ledger();

        info!(
            "Run {} replayed: {} days, {} trades ({} rejected, {} quotes unavailable), final cash {}, portfolio value {}",
            run_id,
            stats.days_processed,
            stats.rebalances_executed,
            stats.rebalances_rejected,
            stats.quotes_unavailable,
            final_cash,
            portfolio_value
        );

        let ledger_path =
            export::write_ledger_csv(&self.config.ledger_output_dir, &run_id, ledger.all())?;

        let mut chain = open_or_create_chain(self.pool.clone(), &self.config.chain_name).await?;
        let block = chain.add_block(&ledger.to_json_bytes()?).await?;

        info!(
            "Run {} complete: {} ledger entries written to {}, sealed at height {} ({})",
            run_id,
            ledger.len(),
            ledger_path.display(),
            block.height,
            block.hash
        );

        Ok(RunSummary {
            run_id,
            stats,
            final_cash,
            portfolio_value,
            ledger_entries: ledger.all().to_vec(),
            ledger_path,
            block_height: block.height,
            block_hash: block.hash,
        })
    }

    /// Drive `broker` across every business day of the configured range.
    ///
    /// Returns the counters and the last quote seen for each commodity.
    pub fn replay(
        &self,
        broker: &mut SpreadBroker,
        table: &QuoteTable,
    ) -> (ReplayStats, BTreeMap<Commodity, SpreadQuote>) {
        let mut stats = ReplayStats::default();
        let mut last_quotes = BTreeMap::new();

        for date in business_days(self.config.start_date, self.config.end_date) {
            stats.days_processed += 1;

            for commodity in &self.config.commodities {
                let Some(quote) = table.quote(date, commodity) else {
                    warn!("{} {}: quote unavailable, skipping rebalance", commodity, date);
                    stats.quotes_unavailable += 1;
                    continue;
                };
                last_quotes.insert(commodity.clone(), quote);

                match broker.rebalance(
                    commodity,
                    self.config.order_near_qty,
                    self.config.order_long_qty,
                    quote.near_term,
                    quote.long_term,
                    date,
                ) {
                    Ok(RebalanceOutcome::Traded(_)) => stats.rebalances_executed += 1,
                    Ok(RebalanceOutcome::NoChange) => stats.rebalances_unchanged += 1,
                    Err(_) => stats.rebalances_rejected += 1,
                }
            }
        }

        (stats, last_quotes)
    }
}

/// Create the named chain, or open it if it already exists.
pub async fn open_or_create_chain(pool: SqlitePool, name: &str) -> Result<ChainStore, ChainError> {
    match ChainStore::create(pool.clone(), name).await {
        Err(ChainError::AlreadyExists(_)) => {
            warn!("Chain {} already exists, appending to it", name);
            ChainStore::open(pool, name).await
        }
        other => other,
    }
}
