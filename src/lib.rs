// ============================================================================
// Matchbook Library
// Single-venue in-memory limit order book matching engine
// ============================================================================

//! # Matchbook
//!
//! A single-venue, in-memory limit-order-book matching engine: the hot path
//! of a trading gateway, equally at home in simulations and backtests.
//!
//! ## Features
//!
//! - **Strict price-time priority** with maker-price executions
//! - **O(1) cancellation** through an engine-wide order locator and
//!   doubly-linked per-level queues
//! - **Day / IOC / FOK** time-in-force handling, with a non-mutating
//!   liquidity dry run for fill-or-kill
//! - **Lock-free SPSC ingress** feeding a dedicated matching thread, with a
//!   drain-on-shutdown protocol that never loses an event
//! - **Callback market data**: trades, top-of-book, and on-demand depth
//!   snapshots
//!
//! ## Example
//!
//! ```rust
//! use matchbook::numeric::{Price, Quantity};
//! use matchbook::prelude::*;
//!
//! let symbol = SymbolId::new("EURUSD");
//!
//! let mut publisher = MarketDataPublisher::new();
//! publisher.on_trade(|trade| println!("{} x {} @ {}", trade.symbol, trade.qty, trade.price));
//!
//! let mut engine = MatchingEngine::new(publisher);
//! engine.add_symbol(symbol.clone());
//!
//! let mut pipeline = EventPipeline::spawn(engine, &PipelineConfig::default()).unwrap();
//!
//! pipeline.send(EngineEvent::New {
//!     order: NewOrder {
//!         id: OrderId::new(1),
//!         trader: TraderId::new(7),
//!         symbol: symbol.clone(),
//!         side: Side::Sell,
//!         order_type: OrderType::Limit,
//!         time_in_force: TimeInForce::Day,
//!         price: Some(Price::from_ticks(101)),
//!         qty: Quantity::from_units(50),
//!     },
//!     ts_ns: 1,
//! });
//! pipeline.send(EngineEvent::New {
//!     order: NewOrder {
//!         id: OrderId::new(2),
//!         trader: TraderId::new(8),
//!         symbol: symbol.clone(),
//!         side: Side::Buy,
//!         order_type: OrderType::Market,
//!         time_in_force: TimeInForce::ImmediateOrCancel,
//!         price: None,
//!         qty: Quantity::from_units(20),
//!     },
//!     ts_ns: 2,
//! });
//!
//! let report = pipeline.shutdown();
//! assert_eq!(report.events_dispatched, 2);
//!
//! let book = report.engine.book(&symbol).unwrap();
//! assert_eq!(book.best_ask().unwrap().qty, Quantity::from_units(30));
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;
pub mod pipeline;
pub mod utils;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        BookLevel, BookOrder, CancelOrder, EngineEvent, NewOrder, OrderBook, OrderId, OrderType,
        PipelineConfig, Side, SymbolId, TimeInForce, TopOfBook, Trade, TraderId,
    };
    pub use crate::engine::{EngineError, MatchingEngine, SubmitOutcome};
    pub use crate::interfaces::MarketDataPublisher;
    pub use crate::pipeline::{EventPipeline, PipelineError, ShutdownReport};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use crate::numeric::{Price, Quantity};
    use std::sync::{Arc, Mutex};

    fn order(id: u64, side: Side, price: i64, qty: i64) -> NewOrder {
        NewOrder {
            id: OrderId::new(id),
            trader: TraderId::new(id * 10),
            symbol: SymbolId::new("XAUUSD"),
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            price: Some(Price::from_ticks(price)),
            qty: Quantity::from_units(qty),
        }
    }

    #[test]
    fn test_end_to_end_cross_and_market_sweep() {
        let symbol = SymbolId::new("XAUUSD");
        let trades = Arc::new(Mutex::new(Vec::new()));
        let tobs = Arc::new(Mutex::new(Vec::new()));

        let mut publisher = MarketDataPublisher::new();
        let sink = Arc::clone(&trades);
        publisher.on_trade(move |trade| sink.lock().unwrap().push(trade.clone()));
        let sink = Arc::clone(&tobs);
        publisher.on_top_of_book(move |tob| sink.lock().unwrap().push(tob.clone()));

        let mut engine = MatchingEngine::new(publisher);
        engine.add_symbol(symbol.clone());

        let mut pipeline = EventPipeline::spawn(engine, &PipelineConfig::default()).unwrap();

        // Build the book, then cross it with an aggressive buy
        for event in [
            order(1, Side::Sell, 101, 50),
            order(2, Side::Sell, 102, 75),
            order(3, Side::Buy, 99, 40),
            order(4, Side::Buy, 102, 60),
        ] {
            let ts_ns = event.id.value();
            pipeline.send(EngineEvent::New {
                order: event,
                ts_ns,
            });
        }

        // Market sell into the surviving bid
        pipeline.send(EngineEvent::New {
            order: NewOrder {
                id: OrderId::new(5),
                trader: TraderId::new(50),
                symbol: symbol.clone(),
                side: Side::Sell,
                order_type: OrderType::Market,
                time_in_force: TimeInForce::ImmediateOrCancel,
                price: None,
                qty: Quantity::from_units(30),
            },
            ts_ns: 5,
        });

        let report = pipeline.shutdown();
        assert_eq!(report.events_dispatched, 5);

        let trades = trades.lock().unwrap();
        assert_eq!(trades.len(), 3);

        // The aggressive buy consumed the cheap ask fully, then part of the
        // next level, at maker prices
        assert_eq!(trades[0].resting_id, OrderId::new(1));
        assert_eq!(trades[0].price, Price::from_ticks(101));
        assert_eq!(trades[0].qty, Quantity::from_units(50));
        assert_eq!(trades[1].resting_id, OrderId::new(2));
        assert_eq!(trades[1].price, Price::from_ticks(102));
        assert_eq!(trades[1].qty, Quantity::from_units(10));

        // The market sell hit the resting bid
        assert_eq!(trades[2].resting_id, OrderId::new(3));
        assert_eq!(trades[2].incoming_id, OrderId::new(5));
        assert_eq!(trades[2].price, Price::from_ticks(99));
        assert_eq!(trades[2].qty, Quantity::from_units(30));

        // Final book: ask residual and the swept-down bid
        let book = report.engine.book(&symbol).unwrap();
        assert_eq!(
            book.best_ask(),
            Some(BookLevel {
                price: Price::from_ticks(102),
                qty: Quantity::from_units(65),
            })
        );
        assert_eq!(
            book.best_bid(),
            Some(BookLevel {
                price: Price::from_ticks(99),
                qty: Quantity::from_units(10),
            })
        );

        // Every book change published a top-of-book, in event order
        let tobs = tobs.lock().unwrap();
        assert_eq!(tobs.len(), 5);
        assert!(tobs.iter().all(|tob| tob.symbol == symbol));
    }
}
