// ============================================================================
// Market Data Publisher
// Callback-shaped sink for trades, top-of-book, and depth snapshots
// ============================================================================

use crate::domain::{BookLevel, SymbolId, TopOfBook, Trade};

type TradeHandler = Box<dyn FnMut(&Trade) + Send>;
type TopOfBookHandler = Box<dyn FnMut(&TopOfBook) + Send>;
type DepthHandler = Box<dyn FnMut(&SymbolId, &[BookLevel], &[BookLevel]) + Send>;

/// Demultiplexer for market-data callbacks.
///
/// Each stream accepts at most one handler; publishing to a stream with no
/// handler is a no-op. Handlers run on the engine's thread and must not
/// block it; heavy sinks should hand the data off to their own channel.
#[derive(Default)]
pub struct MarketDataPublisher {
    trade_handler: Option<TradeHandler>,
    tob_handler: Option<TopOfBookHandler>,
    depth_handler: Option<DepthHandler>,
}

impl MarketDataPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that debug-logs every stream, for demos and tests.
    pub fn logging() -> Self {
        let mut publisher = Self::new();
        publisher.on_trade(|trade| {
            tracing::debug!(
                symbol = %trade.symbol,
                price = %trade.price,
                qty = %trade.qty,
                resting = %trade.resting_id,
                incoming = %trade.incoming_id,
                "trade"
            );
        });
        publisher.on_top_of_book(|tob| {
            tracing::debug!(symbol = %tob.symbol, bid = ?tob.best_bid, ask = ?tob.best_ask, "top of book");
        });
        publisher.on_depth_snapshot(|symbol, bids, asks| {
            tracing::debug!(%symbol, bid_levels = bids.len(), ask_levels = asks.len(), "depth");
        });
        publisher
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub fn on_trade(&mut self, handler: impl FnMut(&Trade) + Send + 'static) {
        self.trade_handler = Some(Box::new(handler));
    }

    pub fn on_top_of_book(&mut self, handler: impl FnMut(&TopOfBook) + Send + 'static) {
        self.tob_handler = Some(Box::new(handler));
    }

    pub fn on_depth_snapshot(
        &mut self,
        handler: impl FnMut(&SymbolId, &[BookLevel], &[BookLevel]) + Send + 'static,
    ) {
        self.depth_handler = Some(Box::new(handler));
    }

    // ========================================================================
    // Publication
    // ========================================================================

    pub fn publish_trade(&mut self, trade: &Trade) {
        if let Some(handler) = &mut self.trade_handler {
            handler(trade);
        }
    }

    pub fn publish_top_of_book(&mut self, tob: &TopOfBook) {
        if let Some(handler) = &mut self.tob_handler {
            handler(tob);
        }
    }

    pub fn publish_depth(&mut self, symbol: &SymbolId, bids: &[BookLevel], asks: &[BookLevel]) {
        if let Some(handler) = &mut self.depth_handler {
            handler(symbol, bids, asks);
        }
    }
}

impl std::fmt::Debug for MarketDataPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataPublisher")
            .field("trade_handler", &self.trade_handler.is_some())
            .field("tob_handler", &self.tob_handler.is_some())
            .field("depth_handler", &self.depth_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderId, Side};
    use crate::numeric::{Price, Quantity};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sample_trade() -> Trade {
        Trade {
            resting_id: OrderId::new(1),
            incoming_id: OrderId::new(2),
            symbol: SymbolId::new("EURUSD"),
            aggressor_side: Side::Buy,
            price: Price::from_ticks(100),
            qty: Quantity::from_units(5),
            match_ts_ns: 1,
        }
    }

    #[test]
    fn test_unset_handlers_are_noops() {
        let mut publisher = MarketDataPublisher::new();
        publisher.publish_trade(&sample_trade());
        publisher.publish_top_of_book(&TopOfBook {
            symbol: SymbolId::new("EURUSD"),
            best_bid: None,
            best_ask: None,
        });
        publisher.publish_depth(&SymbolId::new("EURUSD"), &[], &[]);
    }

    #[test]
    fn test_registered_handler_receives_publishes() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let mut publisher = MarketDataPublisher::new();
        publisher.on_trade(move |trade| {
            assert_eq!(trade.qty, Quantity::from_units(5));
            seen.fetch_add(1, Ordering::Relaxed);
        });

        publisher.publish_trade(&sample_trade());
        publisher.publish_trade(&sample_trade());
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_second_registration_replaces_first() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut publisher = MarketDataPublisher::new();
        let counter = Arc::clone(&first);
        publisher.on_trade(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let counter = Arc::clone(&second);
        publisher.on_trade(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        publisher.publish_trade(&sample_trade());
        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }
}
