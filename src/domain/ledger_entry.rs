//! Ledger record types.

use crate::domain::{Commodity, Decimal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of trade recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    /// Outright spread purchase.
    BuySpread,
    /// Outright spread sale.
    SellSpread,
    /// Rebalance that buys the near leg and sells the long leg.
    LongNearShortLong,
    /// Rebalance that buys the long leg and sells the near leg.
    LongLongShortNear,
    /// First position seeded by a rebalance.
    Initialize,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::BuySpread => "buy_spread",
            TradeAction::SellSpread => "sell_spread",
            TradeAction::LongNearShortLong => "long_near_short_long",
            TradeAction::LongLongShortNear => "long_long_short_near",
            TradeAction::Initialize => "initialize",
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed trade.
///
/// `near_term_qty` and `long_term_qty` hold the position's legs after the
/// trade (both zero when the trade closed it). `cash` is the balance after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub commodity: Commodity,
    pub near_term_qty: Decimal,
    pub long_term_qty: Decimal,
    pub spread: Decimal,
    pub cash: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_labels() {
        assert_eq!(TradeAction::BuySpread.to_string(), "buy_spread");
        assert_eq!(TradeAction::LongLongShortNear.to_string(), "long_long_short_near");
        assert_eq!(
            serde_json::to_string(&TradeAction::LongNearShortLong).unwrap(),
            "\"long_near_short_long\""
        );
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LedgerEntry {
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            action: TradeAction::Initialize,
            commodity: Commodity::from("CORN"),
            near_term_qty: Decimal::from(10),
            long_term_qty: Decimal::from(5),
            spread: Decimal::from_str_canonical("0.5").unwrap(),
            cash: Decimal::from(999_997),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2025-01-02");
        assert_eq!(json["action"], "initialize");
        assert_eq!(json["commodity"], "CORN");
        assert_eq!(json["spread"].as_f64(), Some(0.5));
    }
}
