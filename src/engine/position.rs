use crate::domain::{Commodity, Decimal, SpreadQuote};

/// Open calendar-spread position for one commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadPosition {
    commodity: Commodity,

    /// Near-term leg: positive = long.
    pub near_term_quantity: Decimal,

    /// Long-term leg, signed like the near leg.
    pub long_term_quantity: Decimal,

    /// Volume-weighted average spread paid for the current net exposure.
    pub entry_spread: Decimal,
}

impl SpreadPosition {
    pub fn open(
        commodity: Commodity,
        near_term_quantity: Decimal,
        long_term_quantity: Decimal,
        entry_spread: Decimal,
    ) -> Self {
        Self {
            commodity,
            near_term_quantity,
            long_term_quantity,
            entry_spread,
        }
    }

    pub fn commodity(&self) -> &Commodity {
        &self.commodity
    }

    /// Signed exposure: near minus long.
    pub fn exposure(&self) -> Decimal {
        self.near_term_quantity - self.long_term_quantity
    }

    /// `|near - long|`.
    pub fn net_size(&self) -> Decimal {
        self.exposure().abs()
    }

    pub fn is_flat(&self) -> bool {
        self.net_size().is_zero()
    }

    /// Add a trade's leg deltas at `trade_spread`.
    ///
    /// Growing exposure blends the entry spread by net size, shrinking it keeps
    /// the entry spread, and crossing through zero re-bases it on the trade.
    /// The caller drops the position once it is flat.
    pub fn apply_trade(&mut self, near_delta: Decimal, long_delta: Decimal, trade_spread: Decimal) {
        let old_exposure = self.exposure();
        let trade_exposure = near_delta - long_delta;
        let new_exposure = old_exposure + trade_exposure;

        self.near_term_quantity += near_delta;
        self.long_term_quantity += long_delta;

        if new_exposure.is_zero() {
            return;
        }

        let flipped = !old_exposure.is_zero()
            && old_exposure.is_positive() != new_exposure.is_positive();

        if flipped {
            self.entry_spread = trade_spread;
        } else if new_exposure.abs() >= old_exposure.abs() {
            let old_value = self.entry_spread * old_exposure.abs();
            let added_value = trade_spread * trade_exposure.abs();
            self.entry_spread = (old_value + added_value) / new_exposure.abs();
        }
    }

    /// Mark both legs to the supplied quotes.
    pub fn market_value(&self, quote: &SpreadQuote) -> Decimal {
        quote.near_term * self.near_term_quantity + quote.long_term * self.long_term_quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn corn(near: &str, long: &str, spread: &str) -> SpreadPosition {
        SpreadPosition::open(Commodity::from("CORN"), d(near), d(long), d(spread))
    }

    #[test]
    fn test_net_size_is_absolute() {
        assert_eq!(corn("10", "5", "1.5").net_size(), d("5"));
        assert_eq!(corn("5", "10", "1.5").net_size(), d("5"));
        assert_eq!(corn("5", "10", "1.5").exposure(), d("-5"));
    }

    #[test]
    fn test_adding_blends_entry_spread() {
        let mut position = corn("10", "5", "1.5");
        position.apply_trade(d("4"), d("1"), d("2.3"));

        assert_eq!(position.near_term_quantity, d("14"));
        assert_eq!(position.long_term_quantity, d("6"));
        // (1.5 * 5 + 2.3 * 3) / 8
        assert_eq!(position.entry_spread, d("1.8"));
    }

    #[test]
    fn test_reduction_keeps_entry_spread() {
        let mut position = corn("10", "5", "1.5");
        position.apply_trade(d("-3"), d("-1"), d("9"));

        assert_eq!(position.near_term_quantity, d("7"));
        assert_eq!(position.long_term_quantity, d("4"));
        assert_eq!(position.entry_spread, d("1.5"));
    }

    #[test]
    fn test_flip_rebases_entry_spread() {
        let mut position = corn("10", "5", "1.5");
        position.apply_trade(d("0"), d("8"), d("-0.4"));

        assert_eq!(position.exposure(), d("-3"));
        assert_eq!(position.entry_spread, d("-0.4"));
    }

    #[test]
    fn test_netting_to_zero_is_flat() {
        let mut position = corn("10", "5", "1.5");
        position.apply_trade(d("-5"), d("0"), d("1.0"));
        assert!(position.is_flat());
    }

    #[test]
    fn test_market_value_uses_both_legs() {
        let position = corn("10", "5", "1.5");
        let quote = SpreadQuote::new(d("2"), d("3"));
        assert_eq!(position.market_value(&quote), d("35"));
    }
}
