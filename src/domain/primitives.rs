//! Domain primitives: Commodity.

use serde::{Deserialize, Serialize};

/// Commodity identifier (e.g., "CORN", "WHEAT").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Commodity(pub String);

impl Commodity {
    pub fn new(symbol: impl Into<String>) -> Self {
        Commodity(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Commodity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Commodity {
    fn from(value: &str) -> Self {
        Commodity(value.to_string())
    }
}
