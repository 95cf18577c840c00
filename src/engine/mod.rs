//! Spread accounting engine: positions, the trade ledger and the broker.

pub mod analytics;
pub mod broker;
pub mod ledger;
pub mod position;

pub use analytics::{optimize_spread_weights, spread_series, SpreadStatistics};
pub use broker::{RebalanceOutcome, SpreadBroker, TradeRejection};
pub use ledger::Ledger;
pub use position::SpreadPosition;
