// ============================================================================
// Event Loop
// Dedicated matching thread fed by the SPSC ring, with a drain-on-shutdown
// protocol that never loses an enqueued event
// ============================================================================

use crate::domain::{ConfigError, EngineEvent, PipelineConfig};
use crate::engine::MatchingEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use super::spsc::{self, Consumer, Producer};

/// Failures while standing up the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn the event-loop thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Final state handed back when the loop exits: the engine (with all its
/// books) and the number of events dispatched over the loop's lifetime.
#[derive(Debug)]
pub struct ShutdownReport {
    pub engine: MatchingEngine,
    pub events_dispatched: u64,
}

// ============================================================================
// Consumer Side
// ============================================================================

/// The consumer loop that owns the matching engine.
///
/// Spin-drains the ring and dispatches each event into the engine. Once the
/// shutdown flag is observed the ring is drained one final time before the
/// loop exits, so every event pushed before shutdown is processed.
pub struct EventLoop {
    engine: MatchingEngine,
    events: Consumer<EngineEvent>,
    shutdown: Arc<AtomicBool>,
    dispatched: u64,
}

impl EventLoop {
    pub fn new(
        engine: MatchingEngine,
        events: Consumer<EngineEvent>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            engine,
            events,
            shutdown,
            dispatched: 0,
        }
    }

    /// Run until shutdown is observed and the ring is drained.
    pub fn run(mut self) -> ShutdownReport {
        tracing::debug!("event loop started");

        loop {
            while let Some(event) = self.events.try_pop() {
                self.dispatch(event);
            }

            if self.shutdown.load(Ordering::Acquire) {
                // Final drain: anything pushed before the flag was raised
                while let Some(event) = self.events.try_pop() {
                    self.dispatch(event);
                }
                break;
            }

            std::hint::spin_loop();
        }

        tracing::debug!(events = self.dispatched, "event loop drained and stopped");
        ShutdownReport {
            engine: self.engine,
            events_dispatched: self.dispatched,
        }
    }

    fn dispatch(&mut self, event: EngineEvent) {
        self.dispatched += 1;
        match event {
            EngineEvent::New { order, ts_ns } => {
                // Rejections are data, not loop failures
                if let Err(error) = self.engine.on_new_order(&order, ts_ns) {
                    tracing::debug!(%error, "order rejected");
                }
            }
            EngineEvent::Cancel { cancel, .. } => {
                self.engine.on_cancel(&cancel);
            }
        }
    }
}

// ============================================================================
// Producer Side
// ============================================================================

/// Producer-facing handle over a running pipeline: the ring's push endpoint,
/// the shutdown flag, and the consumer thread's join handle.
///
/// End the pipeline with [`EventPipeline::shutdown`]; dropping the handle
/// without it leaves the consumer thread spinning on an abandoned ring.
pub struct EventPipeline {
    producer: Producer<EngineEvent>,
    shutdown: Arc<AtomicBool>,
    consumer: JoinHandle<ShutdownReport>,
}

impl EventPipeline {
    /// Validate the configuration, build the ring, and start the matching
    /// thread around the given engine.
    ///
    /// # Errors
    /// Configuration violations and thread-spawn failures.
    pub fn spawn(engine: MatchingEngine, config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let (producer, events) = spsc::ring(config.ring_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));
        let event_loop = EventLoop::new(engine, events, Arc::clone(&shutdown));

        let consumer = thread::Builder::new()
            .name("matchbook-engine".into())
            .spawn(move || event_loop.run())?;

        Ok(Self {
            producer,
            shutdown,
            consumer,
        })
    }

    /// Enqueue an event, yielding while the ring is full.
    ///
    /// Back-pressure blocks the producer; no event is ever dropped at
    /// ingress.
    pub fn send(&mut self, event: EngineEvent) {
        let mut event = event;
        loop {
            match self.producer.try_push(event) {
                Ok(()) => return,
                Err(returned) => {
                    event = returned;
                    thread::yield_now();
                }
            }
        }
    }

    /// Enqueue without blocking.
    ///
    /// # Errors
    /// Returns the event back when the ring is full.
    pub fn try_send(&mut self, event: EngineEvent) -> Result<(), EngineEvent> {
        self.producer.try_push(event)
    }

    /// Stop the pipeline: wait until the ring reads empty, raise the
    /// shutdown flag, and join the matching thread.
    ///
    /// This ordering guarantees the consumer dispatched every event that
    /// was ever pushed.
    pub fn shutdown(self) -> ShutdownReport {
        while !self.producer.is_empty() {
            std::hint::spin_loop();
        }
        self.shutdown.store(true, Ordering::Release);
        self.consumer
            .join()
            .expect("event-loop thread panicked")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CancelOrder, NewOrder, OrderId, OrderType, Side, SymbolId, TimeInForce, TraderId,
    };
    use crate::interfaces::MarketDataPublisher;
    use crate::numeric::{Price, Quantity};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::sync::atomic::AtomicU64;

    fn day_limit(id: u64, symbol: &SymbolId, side: Side, price: i64, qty: i64) -> NewOrder {
        NewOrder {
            id: OrderId::new(id),
            trader: TraderId::new(id),
            symbol: symbol.clone(),
            side,
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Day,
            price: Some(Price::from_ticks(price)),
            qty: Quantity::from_units(qty),
        }
    }

    #[test]
    fn test_events_processed_in_fifo_order() {
        let trades = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut publisher = MarketDataPublisher::new();
        let sink = Arc::clone(&trades);
        publisher.on_trade(move |trade| sink.lock().unwrap().push(trade.clone()));

        let symbol = SymbolId::new("EURUSD");
        let mut engine = MatchingEngine::new(publisher);
        engine.add_symbol(symbol.clone());

        let mut pipeline = EventPipeline::spawn(engine, &PipelineConfig::default()).unwrap();

        pipeline.send(EngineEvent::New {
            order: day_limit(1, &symbol, Side::Sell, 101, 50),
            ts_ns: 1,
        });
        pipeline.send(EngineEvent::New {
            order: day_limit(2, &symbol, Side::Buy, 101, 20),
            ts_ns: 2,
        });
        pipeline.send(EngineEvent::Cancel {
            cancel: CancelOrder { id: OrderId::new(1) },
            ts_ns: 3,
        });
        pipeline.send(EngineEvent::New {
            order: day_limit(3, &symbol, Side::Buy, 101, 20),
            ts_ns: 4,
        });

        let report = pipeline.shutdown();
        assert_eq!(report.events_dispatched, 4);

        // The cancel landed between the two buys, so only the first traded
        let trades = trades.lock().unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].incoming_id, OrderId::new(2));

        let book = report.engine.book(&symbol).unwrap();
        assert!(book.contains(OrderId::new(3)));
        assert!(!book.contains(OrderId::new(1)));
    }

    #[test]
    fn test_shutdown_drains_every_event_and_conserves_quantity() {
        const EVENTS: u64 = 100_000;

        let traded = Arc::new(AtomicU64::new(0));
        let mut publisher = MarketDataPublisher::new();
        let sink = Arc::clone(&traded);
        publisher.on_trade(move |trade| {
            sink.fetch_add(trade.qty.units() as u64, Ordering::Relaxed);
        });

        let symbols = [SymbolId::new("XAUUSD"), SymbolId::new("EURUSD")];
        let mut engine = MatchingEngine::new(publisher);
        for symbol in &symbols {
            engine.add_symbol(symbol.clone());
        }

        let config = PipelineConfig {
            ring_capacity: 1024,
            ..PipelineConfig::default()
        };
        let mut pipeline = EventPipeline::spawn(engine, &config).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut submitted: u64 = 0;
        for id in 1..=EVENTS {
            let symbol = &symbols[rng.gen_range(0..symbols.len())];
            let side = if rng.gen_bool(0.5) {
                Side::Buy
            } else {
                Side::Sell
            };
            let qty = rng.gen_range(1..=500);
            submitted += qty as u64;

            pipeline.send(EngineEvent::New {
                order: day_limit(id, symbol, side, rng.gen_range(90..=110), qty),
                ts_ns: id,
            });
        }

        let report = pipeline.shutdown();
        assert_eq!(report.events_dispatched, EVENTS);

        // Day limit orders only: every submitted unit was either traded
        // (counted once on each side) or is still resting
        let resting: u64 = symbols
            .iter()
            .flat_map(|symbol| {
                let book = report.engine.book(symbol).unwrap();
                let bids = book.depth(Side::Buy, usize::MAX);
                let asks = book.depth(Side::Sell, usize::MAX);
                bids.into_iter().chain(asks)
            })
            .map(|level| level.qty.units() as u64)
            .sum();

        assert_eq!(2 * traded.load(Ordering::Relaxed) + resting, submitted);
    }
}
