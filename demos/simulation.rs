// ============================================================================
// Market Simulation
// ============================================================================
//
// Drives a high-throughput simulation: random NewOrder and CancelOrder
// events for three symbols are pushed through the SPSC ring to the matching
// thread, and the run is timed end to end.
//
// Simulation parameters:
//   - Symbols:   XAUUSD, EURUSD, BTCUSD
//   - Events:    1,000,000
//   - Ring:      8,192 slots
// ============================================================================

use matchbook::numeric::{Price, Quantity};
use matchbook::prelude::*;
use matchbook::utils::scope_timer::{self, ScopeTimer};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const EVENTS: u64 = 1_000_000;

fn build_event(rng: &mut ThreadRng, symbols: &[SymbolId], clock: &Instant) -> EngineEvent {
    let ts_ns = clock.elapsed().as_nanos() as u64;

    // Order ids are drawn from a small range on purpose: collisions exercise
    // duplicate rejection, and cancels occasionally hit a live order
    let id = OrderId::new(rng.gen_range(1..=10_000));

    if rng.gen_bool(0.5) {
        EngineEvent::New {
            order: NewOrder {
                id,
                trader: TraderId::new(rng.gen_range(1..=100)),
                symbol: symbols[rng.gen_range(0..symbols.len())].clone(),
                side: if rng.gen_bool(0.5) {
                    Side::Buy
                } else {
                    Side::Sell
                },
                order_type: OrderType::Limit,
                time_in_force: TimeInForce::Day,
                price: Some(Price::from_ticks(rng.gen_range(90..=110))),
                qty: Quantity::from_units(rng.gen_range(1..=500)),
            },
            ts_ns,
        }
    } else {
        EngineEvent::Cancel {
            cancel: CancelOrder { id },
            ts_ns,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let symbols = [
        SymbolId::new("XAUUSD"),
        SymbolId::new("EURUSD"),
        SymbolId::new("BTCUSD"),
    ];

    let trade_count = Arc::new(AtomicU64::new(0));
    let tob_count = Arc::new(AtomicU64::new(0));

    let mut publisher = MarketDataPublisher::new();
    let counter = Arc::clone(&trade_count);
    publisher.on_trade(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    let counter = Arc::clone(&tob_count);
    publisher.on_top_of_book(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });
    publisher.on_depth_snapshot(|symbol, bids, asks| {
        println!("\n{symbol} depth:");
        for level in bids {
            println!("  bid {} x {}", level.price, level.qty);
        }
        for level in asks {
            println!("  ask {} x {}", level.price, level.qty);
        }
    });

    let mut engine = MatchingEngine::new(publisher);
    for symbol in &symbols {
        engine.add_symbol(symbol.clone());
    }

    let config = PipelineConfig::default();
    let mut pipeline = EventPipeline::spawn(engine, &config).expect("failed to start pipeline");

    let mut rng = rand::thread_rng();
    let clock = Instant::now();

    let report = {
        let _timer = ScopeTimer::start("simulation");

        for _ in 0..EVENTS {
            pipeline.send(build_event(&mut rng, &symbols, &clock));
        }
        pipeline.shutdown()
    };

    let elapsed = scope_timer::take("simulation").expect("simulation was timed");

    println!("=== Simulation Complete ===");
    println!("events:     {}", report.events_dispatched);
    println!("trades:     {}", trade_count.load(Ordering::Relaxed));
    println!("tob updates: {}", tob_count.load(Ordering::Relaxed));
    println!(
        "elapsed:    {:?} ({:.0} events/s)",
        elapsed,
        report.events_dispatched as f64 / elapsed.as_secs_f64()
    );

    let mut engine = report.engine;
    for symbol in &symbols {
        engine
            .publish_depth(symbol, config.depth_levels)
            .expect("symbol is registered");
    }
}
