//! CSV export of a finished ledger.

use crate::domain::LedgerEntry;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    date: String,
    action: &'static str,
    commodity: &'a str,
    near_term_qty: String,
    long_term_qty: String,
    spread: String,
    cash: String,
}

impl<'a> From<&'a LedgerEntry> for LedgerRow<'a> {
    fn from(entry: &'a LedgerEntry) -> Self {
        Self {
            date: entry.date.format("%Y-%m-%d").to_string(),
            action: entry.action.as_str(),
            commodity: entry.commodity.as_str(),
            near_term_qty: entry.near_term_qty.to_canonical_string(),
            long_term_qty: entry.long_term_qty.to_canonical_string(),
            spread: entry.spread.to_canonical_string(),
            cash: entry.cash.to_canonical_string(),
        }
    }
}

pub fn ledger_file_name(run_id: &str) -> String {
    format!("ledger_{}.csv", run_id)
}

/// Write `entries` to `<dir>/ledger_<run_id>.csv` and return the path.
///
/// The header row is written even for an empty ledger.
pub fn write_ledger_csv(
    dir: &Path,
    run_id: &str,
    entries: &[LedgerEntry],
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(ledger_file_name(run_id));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)?;
    writer.write_record([
        "Date",
        "Action",
        "Commodity",
        "NearTermQty",
        "LongTermQty",
        "Spread",
        "Cash",
    ])?;
    for entry in entries {
        writer.serialize(LedgerRow::from(entry))?;
    }
    writer.flush()?;

    info!("Wrote {} ledger rows to {}", entries.len(), path.display());
    Ok(path)
}
