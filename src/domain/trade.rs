// ============================================================================
// Trade and Market Data Domain Models
// ============================================================================

use crate::numeric::{Price, Quantity};

use super::order::{OrderId, Side, SymbolId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A match between a resting order and an incoming order.
///
/// Executions always happen at the resting order's price (maker-price
/// semantics); `aggressor_side` is the side of the incoming order.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    pub resting_id: OrderId,
    pub incoming_id: OrderId,
    pub symbol: SymbolId,
    pub aggressor_side: Side,
    pub price: Price,
    pub qty: Quantity,
    pub match_ts_ns: u64,
}

/// One aggregated price level: the price and the summed quantity of every
/// resting order at that price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookLevel {
    pub price: Price,
    pub qty: Quantity,
}

/// Best level on each side of one symbol's book.
///
/// A side is `None` when it holds no resting orders; an update is still
/// published so consumers observe the emptied side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopOfBook {
    pub symbol: SymbolId,
    pub best_bid: Option<BookLevel>,
    pub best_ask: Option<BookLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_of_book_one_sided() {
        let tob = TopOfBook {
            symbol: SymbolId::new("BTCUSD"),
            best_bid: None,
            best_ask: Some(BookLevel {
                price: Price::from_ticks(101),
                qty: Quantity::from_units(10),
            }),
        };

        assert!(tob.best_bid.is_none());
        assert_eq!(
            tob.best_ask,
            Some(BookLevel {
                price: Price::from_ticks(101),
                qty: Quantity::from_units(10),
            })
        );
    }
}
