use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one logical instrument (an underlying or an option chain).
/// e.g. "50etf", "50etf_option"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identifier for market and limit orders. Assigned by the
/// matching engine in submission order so identical inputs reproduce
/// identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(u64);

impl OrderId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order.{}", self.0)
    }
}

/// Monotonic identifier for stop orders (separate namespace from orders).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopOrderId(u64);

impl StopOrderId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for StopOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stop.{}", self.0)
    }
}

/// Monotonic trade sequence id, unique within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(u64);

impl TradeId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trade.{}", self.0)
    }
}
