// ============================================================================
// Order Domain Model
// ============================================================================

use crate::numeric::{Price, Quantity};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Order identifier, globally unique across the engine's lifetime.
///
/// Assigned by the producer; the engine only compares and indexes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct OrderId(u64);

impl OrderId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trader identifier, carried through into trades unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct TraderId(u64);

impl TraderId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trading instrument identifier (e.g. "EURUSD").
///
/// Cheap to clone; the engine treats it as an opaque map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolId(Arc<str>);

impl SymbolId {
    pub fn new(symbol: &str) -> Self {
        Self(Arc::from(symbol))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolId {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeInForce {
    /// Remains active until filled or cancelled
    Day,
    /// Fill immediately as far as possible, discard the remainder
    ImmediateOrCancel,
    /// Fill the entire order immediately or execute nothing at all
    FillOrKill,
}

// ============================================================================
// Intents
// ============================================================================

/// Submission intent from a producer.
///
/// `price` must be present for limit orders and is ignored for market
/// orders. `qty` is the only authoritative quantity.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewOrder {
    pub id: OrderId,
    pub trader: TraderId,
    pub symbol: SymbolId,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Option<Price>,
    pub qty: Quantity,
}

/// Cancellation intent. Carries only the order id; the engine resolves the
/// owning symbol through its index.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CancelOrder {
    pub id: OrderId,
}

// ============================================================================
// Resting Order
// ============================================================================

/// An order at rest in (or being matched against) a book.
///
/// `price` is the effective limit price: for market orders the engine
/// rewrites it to the side's marketable sentinel before matching.
#[derive(Debug, Clone, Copy)]
pub struct BookOrder {
    pub id: OrderId,
    pub trader: TraderId,
    pub qty: Quantity,
    pub price: Price,
    pub side: Side,
    /// Arrival time, for time priority
    pub arrival_ts_ns: u64,
}

impl BookOrder {
    pub fn new(order: &NewOrder, effective_price: Price, arrival_ts_ns: u64) -> Self {
        Self {
            id: order.id,
            trader: order.trader,
            qty: order.qty,
            price: effective_price,
            side: order.side,
            arrival_ts_ns,
        }
    }
}
