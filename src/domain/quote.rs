//! Near/long-term spread quotes and the per-day quote table.

use crate::domain::{Commodity, Decimal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One day's near-term and long-term spread quotes for a commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadQuote {
    pub near_term: Decimal,
    pub long_term: Decimal,
}

impl SpreadQuote {
    pub fn new(near_term: Decimal, long_term: Decimal) -> Self {
        Self {
            near_term,
            long_term,
        }
    }

    /// Calendar spread: long-term minus near-term.
    pub fn spread(&self) -> Decimal {
        self.long_term - self.near_term
    }
}

/// Quotes keyed by date, then commodity.
///
/// A missing entry means "no data for this date/commodity", which is distinct
/// from a quote whose value is zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteTable {
    rows: BTreeMap<NaiveDate, BTreeMap<Commodity, SpreadQuote>>,
}

impl QuoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, commodity: Commodity, quote: SpreadQuote) {
        self.rows.entry(date).or_default().insert(commodity, quote);
    }

    pub fn with_quote(mut self, date: NaiveDate, commodity: Commodity, quote: SpreadQuote) -> Self {
        self.insert(date, commodity, quote);
        self
    }

    pub fn quote(&self, date: NaiveDate, commodity: &Commodity) -> Option<SpreadQuote> {
        self.rows.get(&date).and_then(|day| day.get(commodity)).copied()
    }

    /// Dates with at least one quote, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Number of (date, commodity) quotes held.
    pub fn len(&self) -> usize {
        self.rows.values().map(|day| day.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restrict to quotes inside `[start, end]` for the given commodities.
    pub fn filtered(&self, commodities: &[Commodity], start: NaiveDate, end: NaiveDate) -> Self {
        let mut out = QuoteTable::new();
        for (date, day) in self.rows.range(start..=end) {
            for (commodity, quote) in day {
                if commodities.contains(commodity) {
                    out.insert(*date, commodity.clone(), *quote);
                }
            }
        }
        out
    }
}
