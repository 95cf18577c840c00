use spreadchain::{
    config::Config, db::init_db, AppError, BacktestRunner, CsvSpreadFeed, HttpSpreadFeed,
    SpreadFeed, SpreadSource,
};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let pool = init_db(&config.chain_database_path).await?;

    let feed: Arc<dyn SpreadFeed> = match &config.spread_source {
        SpreadSource::Csv(path) => Arc::new(CsvSpreadFeed::new(path.clone())),
        SpreadSource::Http(url) => Arc::new(HttpSpreadFeed::new(url.clone())),
    };

    let summary = BacktestRunner::new(feed, pool, config).run().await?;

    println!(
        "run {}: final cash {}, portfolio value {}, {} ledger entries -> {} (block {} {})",
        summary.run_id,
        summary.final_cash,
        summary.portfolio_value,
        summary.ledger_entries.len(),
        summary.ledger_path.display(),
        summary.block_height,
        summary.block_hash
    );
    Ok(())
}
