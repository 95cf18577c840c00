use crate::domain::{Commodity, Decimal, LedgerEntry, SpreadQuote, TradeAction};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use super::{Ledger, SpreadPosition};

/// Reason a trade was refused. Refusals never change broker state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeRejection {
    #[error("insufficient cash for {commodity} on {date}: cost {cost}, available {available}")]
    InsufficientCash {
        commodity: Commodity,
        date: NaiveDate,
        cost: Decimal,
        available: Decimal,
    },
    #[error(
        "insufficient inventory for {commodity} on {date}: requested {requested_near}/{requested_long}, held {held_near}/{held_long}"
    )]
    InsufficientInventory {
        commodity: Commodity,
        date: NaiveDate,
        requested_near: Decimal,
        requested_long: Decimal,
        held_near: Decimal,
        held_long: Decimal,
    },
    #[error("negative quantity for {commodity} on {date}: near {near}, long {long}")]
    NegativeQuantity {
        commodity: Commodity,
        date: NaiveDate,
        near: Decimal,
        long: Decimal,
    },
}

/// What a rebalance did when it was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceOutcome {
    Traded(TradeAction),
    /// Nothing to hedge: zero spread, or a seed with zero net size.
    NoChange,
}

/// Cash-constrained spread broker. Sole owner of cash, positions and ledger.
#[derive(Debug, Clone)]
pub struct SpreadBroker {
    cash: Decimal,
    positions: BTreeMap<Commodity, SpreadPosition>,
    ledger: Ledger,
}

impl SpreadBroker {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            positions: BTreeMap::new(),
            ledger: Ledger::new(),
        }
    }

    pub fn cash_balance(&self) -> Decimal {
        self.cash
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn position(&self, commodity: &Commodity) -> Option<&SpreadPosition> {
        self.positions.get(commodity)
    }

    pub fn positions(&self) -> &BTreeMap<Commodity, SpreadPosition> {
        &self.positions
    }

    /// Open or add to a spread. Costs `|spread * (near - long)|`.
    pub fn buy_spread(
        &mut self,
        commodity: &Commodity,
        near_qty: Decimal,
        long_qty: Decimal,
        spread: Decimal,
        date: NaiveDate,
    ) -> Result<&LedgerEntry, TradeRejection> {
        ensure_non_negative(commodity, date, near_qty, long_qty)?;
        let cost = (spread * (near_qty - long_qty)).abs();
        self.ensure_affordable(commodity, date, cost)?;

        self.cash -= cost;
        self.apply_to_position(commodity, near_qty, long_qty, spread);
        Ok(self.record(date, TradeAction::BuySpread, commodity, spread))
    }

    /// Reduce or close a spread. Both held legs must cover the request.
    pub fn sell_spread(
        &mut self,
        commodity: &Commodity,
        near_qty: Decimal,
        long_qty: Decimal,
        spread: Decimal,
        date: NaiveDate,
    ) -> Result<&LedgerEntry, TradeRejection> {
        ensure_non_negative(commodity, date, near_qty, long_qty)?;
        let (held_near, held_long) = self
            .positions
            .get(commodity)
            .map(|p| (p.near_term_quantity, p.long_term_quantity))
            .unwrap_or_default();

        if held_near < near_qty || held_long < long_qty {
            let rejection = TradeRejection::InsufficientInventory {
                commodity: commodity.clone(),
                date,
                requested_near: near_qty,
                requested_long: long_qty,
                held_near,
                held_long,
            };
            warn!("sell_spread rejected: {}", rejection);
            return Err(rejection);
        }

        let proceeds = (spread * (near_qty - long_qty)).abs();
        self.cash += proceeds;
        self.apply_to_position(commodity, -near_qty, -long_qty, spread);
        Ok(self.record(date, TradeAction::SellSpread, commodity, spread))
    }

    /// Move the position toward the market spread `long_term - short_term`.
    ///
    /// A positive spread buys near and sells long; a negative one does the
    /// opposite. Each side hedges the full spread amount when the leg being
    /// sold holds more than that, only the held inventory when it holds less,
    /// and opens the bought leg outright when it holds nothing. With no
    /// position yet, the requested quantities are bought as a seed at the
    /// market spread, subject to the same cash check.
    pub fn rebalance(
        &mut self,
        commodity: &Commodity,
        near_qty: Decimal,
        long_qty: Decimal,
        short_term_spread: Decimal,
        long_term_spread: Decimal,
        date: NaiveDate,
    ) -> Result<RebalanceOutcome, TradeRejection> {
        let spread = long_term_spread - short_term_spread;

        let Some(position) = self.positions.get(commodity) else {
            return self.seed(commodity, near_qty, long_qty, spread, date);
        };

        if spread.is_zero() {
            debug!("{} {}: zero spread, nothing to rebalance", commodity, date);
            return Ok(RebalanceOutcome::NoChange);
        }

        let (action, cost, near_delta, long_delta) = if spread.is_positive() {
            let held_long = position.long_term_quantity;
            let (cost, long_delta) = if held_long > spread {
                ((spread * (short_term_spread - long_term_spread)).abs(), -spread)
            } else if held_long.is_positive() {
                (held_long * long_term_spread + spread * short_term_spread, -held_long)
            } else {
                (spread * short_term_spread, Decimal::zero())
            };
            (TradeAction::LongNearShortLong, cost, spread, long_delta)
        } else {
            let amount = -spread;
            let held_near = position.near_term_quantity;
            let (cost, near_delta) = if held_near > amount {
                ((amount * (long_term_spread - short_term_spread)).abs(), -amount)
            } else if held_near.is_positive() {
                (held_near * short_term_spread + amount * long_term_spread, -held_near)
            } else {
                (amount * long_term_spread, Decimal::zero())
            };
            (TradeAction::LongLongShortNear, cost, near_delta, amount)
        };

        self.ensure_affordable(commodity, date, cost)?;

        self.cash -= cost;
        self.apply_to_position(commodity, near_delta, long_delta, spread);
        self.record(date, action, commodity, spread);
        Ok(RebalanceOutcome::Traded(action))
    }

    /// Cash plus every open position marked at `quotes`.
    ///
    /// Positions without a quote contribute nothing.
    pub fn portfolio_value(&self, quotes: &BTreeMap<Commodity, SpreadQuote>) -> Decimal {
        let marked: Decimal = self
            .positions
            .iter()
            .filter_map(|(commodity, position)| {
                quotes.get(commodity).map(|quote| position.market_value(quote))
            })
            .sum();
        self.cash + marked
    }

    fn seed(
        &mut self,
        commodity: &Commodity,
        near_qty: Decimal,
        long_qty: Decimal,
        spread: Decimal,
        date: NaiveDate,
    ) -> Result<RebalanceOutcome, TradeRejection> {
        ensure_non_negative(commodity, date, near_qty, long_qty)?;
        if (near_qty - long_qty).is_zero() {
            debug!("{} {}: seed has zero net size, nothing opened", commodity, date);
            return Ok(RebalanceOutcome::NoChange);
        }

        let cost = (spread * (near_qty - long_qty)).abs();
        self.ensure_affordable(commodity, date, cost)?;

        self.cash -= cost;
        self.positions.insert(
            commodity.clone(),
            SpreadPosition::open(commodity.clone(), near_qty, long_qty, spread),
        );
        self.record(date, TradeAction::Initialize, commodity, spread);
        Ok(RebalanceOutcome::Traded(TradeAction::Initialize))
    }

    fn ensure_affordable(
        &self,
        commodity: &Commodity,
        date: NaiveDate,
        cost: Decimal,
    ) -> Result<(), TradeRejection> {
        if cost > self.cash {
            let rejection = TradeRejection::InsufficientCash {
                commodity: commodity.clone(),
                date,
                cost,
                available: self.cash,
            };
            warn!("trade rejected: {}", rejection);
            return Err(rejection);
        }
        Ok(())
    }

    fn apply_to_position(
        &mut self,
        commodity: &Commodity,
        near_delta: Decimal,
        long_delta: Decimal,
        trade_spread: Decimal,
    ) {
        let position = self
            .positions
            .entry(commodity.clone())
            .or_insert_with(|| {
                SpreadPosition::open(commodity.clone(), Decimal::zero(), Decimal::zero(), trade_spread)
            });
        position.apply_trade(near_delta, long_delta, trade_spread);

        if position.is_flat() {
            self.positions.remove(commodity);
        }
    }

    fn record(
        &mut self,
        date: NaiveDate,
        action: TradeAction,
        commodity: &Commodity,
        spread: Decimal,
    ) -> &LedgerEntry {
        let (near_term_qty, long_term_qty) = self
            .positions
            .get(commodity)
            .map(|p| (p.near_term_quantity, p.long_term_quantity))
            .unwrap_or_default();

        debug!(
            "{} {} {}: near {} long {} spread {} cash {}",
            date, action, commodity, near_term_qty, long_term_qty, spread, self.cash
        );

        self.ledger.append(LedgerEntry {
            date,
            action,
            commodity: commodity.clone(),
            near_term_qty,
            long_term_qty,
            spread,
            cash: self.cash,
        })
    }
}

/// Requested legs are sizes; direction comes from the operation.
fn ensure_non_negative(
    commodity: &Commodity,
    date: NaiveDate,
    near: Decimal,
    long: Decimal,
) -> Result<(), TradeRejection> {
    if near.is_negative() || long.is_negative() {
        let rejection = TradeRejection::NegativeQuantity {
            commodity: commodity.clone(),
            date,
            near,
            long,
        };
        warn!("trade rejected: {}", rejection);
        return Err(rejection);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, n).unwrap()
    }

    fn corn() -> Commodity {
        Commodity::from("CORN")
    }

    #[test]
    fn test_buy_into_empty_slot_creates_position() {
        let mut broker = SpreadBroker::new(d("100"));
        let entry = broker
            .buy_spread(&corn(), d("3"), d("1"), d("2"), day(2))
            .unwrap()
            .clone();

        assert_eq!(entry.action, TradeAction::BuySpread);
        assert_eq!(entry.cash, d("96"));
        assert_eq!(entry.near_term_qty, d("3"));
        assert_eq!(entry.long_term_qty, d("1"));
        assert_eq!(broker.position(&corn()).unwrap().entry_spread, d("2"));
    }

    #[test]
    fn test_buy_with_equal_legs_costs_nothing_and_leaves_no_position() {
        let mut broker = SpreadBroker::new(d("100"));
        broker
            .buy_spread(&corn(), d("4"), d("4"), d("2"), day(2))
            .unwrap();

        assert_eq!(broker.cash_balance(), d("100"));
        assert!(broker.position(&corn()).is_none());
        assert_eq!(broker.ledger().len(), 1);
    }

    #[test]
    fn test_sell_without_position_is_inventory_rejection() {
        let mut broker = SpreadBroker::new(d("100"));
        let err = broker
            .sell_spread(&corn(), d("1"), d("0"), d("1"), day(2))
            .unwrap_err();

        assert!(matches!(err, TradeRejection::InsufficientInventory { .. }));
        assert!(broker.ledger().is_empty());
    }

    #[test]
    fn test_negative_legs_are_rejected_by_buy_and_sell() {
        let mut broker = SpreadBroker::new(d("100"));

        let err = broker
            .buy_spread(&corn(), d("-2"), d("0"), d("1"), day(2))
            .unwrap_err();
        assert!(matches!(err, TradeRejection::NegativeQuantity { .. }));

        let err = broker
            .sell_spread(&corn(), d("0"), d("-2"), d("1"), day(2))
            .unwrap_err();
        assert!(matches!(err, TradeRejection::NegativeQuantity { .. }));

        assert_eq!(broker.cash_balance(), d("100"));
        assert!(broker.positions().is_empty());
        assert!(broker.ledger().is_empty());
    }

    #[test]
    fn test_rebalance_zero_spread_is_no_change() {
        let mut broker = SpreadBroker::new(d("100"));
        broker
            .buy_spread(&corn(), d("3"), d("1"), d("2"), day(2))
            .unwrap();

        let outcome = broker
            .rebalance(&corn(), d("1"), d("1"), d("1.5"), d("1.5"), day(3))
            .unwrap();
        assert_eq!(outcome, RebalanceOutcome::NoChange);
        assert_eq!(broker.ledger().len(), 1);
    }

    #[test]
    fn test_rejection_message_carries_context() {
        let mut broker = SpreadBroker::new(d("1"));
        let err = broker
            .buy_spread(&corn(), d("10"), d("0"), d("1"), day(2))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("CORN"));
        assert!(msg.contains("2025-01-02"));
    }
}
