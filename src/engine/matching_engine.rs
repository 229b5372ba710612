// ============================================================================
// Matching Engine
// Routes order flow into per-symbol books and publishes market data
// ============================================================================

use crate::domain::{
    BookError, BookOrder, CancelOrder, NewOrder, OrderBook, OrderId, OrderType, Side, SymbolId,
    TimeInForce, TopOfBook,
};
use crate::interfaces::MarketDataPublisher;
use crate::numeric::Price;
use std::collections::HashMap;
use thiserror::Error;

/// Rejections surfaced by the engine. All are caller-input failures; the
/// engine's state is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown symbol: {symbol}")]
    UnknownSymbol { symbol: SymbolId },

    #[error("duplicate order id: {id}")]
    DuplicateOrderId { id: OrderId },

    #[error("order {id} has non-positive quantity")]
    InvalidQuantity { id: OrderId },

    #[error("limit order {id} is missing a price")]
    MissingLimitPrice { id: OrderId },

    #[error(transparent)]
    Book(#[from] BookError),
}

/// How a submission was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Fully executed against resting liquidity
    Filled,
    /// Partially executed; any residual was rested or discarded per TIF
    PartiallyFilled,
    /// No execution; the order now rests in the book
    Resting,
    /// No execution and nothing rested (FOK liquidity miss, or an
    /// unmarketable IOC/market order)
    Killed,
}

/// Per-symbol dispatcher over one book per registered symbol.
///
/// Owns the engine-wide order locator (id → symbol) so cancellations need
/// no symbol, applies time-in-force, and feeds the market-data publisher.
/// Intended to be owned by a single thread; the event loop drives it.
#[derive(Debug)]
pub struct MatchingEngine {
    /// One book per registered symbol
    books: HashMap<SymbolId, OrderBook>,

    /// Engine-wide locator for resting orders: id → owning symbol
    order_index: HashMap<OrderId, SymbolId>,

    /// Market-data sink, invoked on the dispatching thread
    publisher: MarketDataPublisher,
}

impl MatchingEngine {
    pub fn new(publisher: MarketDataPublisher) -> Self {
        Self {
            books: HashMap::new(),
            order_index: HashMap::new(),
            publisher,
        }
    }

    /// Register a symbol. Idempotent: re-registering keeps the existing book.
    pub fn add_symbol(&mut self, symbol: SymbolId) {
        self.books
            .entry(symbol.clone())
            .or_insert_with(|| OrderBook::new(symbol));
    }

    /// Read access to a symbol's book, for queries and tests.
    pub fn book(&self, symbol: &SymbolId) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Number of resting orders tracked across all books.
    pub fn resting_order_count(&self) -> usize {
        self.order_index.len()
    }

    // ========================================================================
    // Event Entry Points
    // ========================================================================

    /// Process a submission: validate, match, apply time-in-force, publish.
    ///
    /// Trades execute at the resting order's price. A top-of-book update is
    /// published whenever the event changed either side of the book.
    ///
    /// # Errors
    /// See `EngineError`; a rejected order has no effect on any book.
    pub fn on_new_order(
        &mut self,
        order: &NewOrder,
        ts_ns: u64,
    ) -> Result<SubmitOutcome, EngineError> {
        if !order.qty.is_positive() {
            return Err(EngineError::InvalidQuantity { id: order.id });
        }

        let effective_price = match order.order_type {
            // Market orders cross every level on the opposite side
            OrderType::Market => match order.side {
                Side::Buy => Price::MAX,
                Side::Sell => Price::MIN,
            },
            OrderType::Limit => order
                .price
                .ok_or(EngineError::MissingLimitPrice { id: order.id })?,
        };

        if self.order_index.contains_key(&order.id) {
            return Err(EngineError::DuplicateOrderId { id: order.id });
        }

        let Some(book) = self.books.get_mut(&order.symbol) else {
            tracing::warn!(symbol = %order.symbol, id = %order.id, "order for unknown symbol");
            return Err(EngineError::UnknownSymbol {
                symbol: order.symbol.clone(),
            });
        };

        let incoming = BookOrder::new(order, effective_price, ts_ns);

        // FOK dry run: all or nothing, decided before any fill happens
        if order.time_in_force == TimeInForce::FillOrKill
            && !book.peek_liquidity(order.side, effective_price, order.qty)
        {
            tracing::debug!(id = %order.id, symbol = %order.symbol, "fill-or-kill miss");
            return Ok(SubmitOutcome::Killed);
        }

        let (trades, remaining) = book.match_incoming(&incoming, ts_ns);

        for trade in &trades {
            // A maker absent from the book after matching was fully consumed
            if !book.contains(trade.resting_id) {
                self.order_index.remove(&trade.resting_id);
            }
            self.publisher.publish_trade(trade);
        }

        // Day limit residuals rest; IOC residuals and market residuals are
        // discarded
        let mut rested = false;
        if order.order_type == OrderType::Limit
            && remaining.is_positive()
            && order.time_in_force == TimeInForce::Day
        {
            let mut residual = incoming;
            residual.qty = remaining;
            book.add(residual)?;
            self.order_index.insert(order.id, order.symbol.clone());
            rested = true;
        }

        if !trades.is_empty() || rested {
            let tob = top_of_book(book);
            self.publisher.publish_top_of_book(&tob);
        }

        Ok(if remaining.is_zero() {
            SubmitOutcome::Filled
        } else if !trades.is_empty() {
            SubmitOutcome::PartiallyFilled
        } else if rested {
            SubmitOutcome::Resting
        } else {
            SubmitOutcome::Killed
        })
    }

    /// Process a cancellation.
    ///
    /// Unknown (or already consumed) ids are a no-op so producers can fire
    /// and forget. Returns whether an order was removed; a top-of-book
    /// update is published on removal.
    pub fn on_cancel(&mut self, cancel: &CancelOrder) -> bool {
        let Some(symbol) = self.order_index.remove(&cancel.id) else {
            tracing::debug!(id = %cancel.id, "cancel for unknown order id");
            return false;
        };

        let book = self
            .books
            .get_mut(&symbol)
            .expect("indexed order must belong to a registered book");
        let removed = book.cancel(cancel.id);
        debug_assert!(removed, "engine index pointed at a missing order");

        let tob = top_of_book(book);
        self.publisher.publish_top_of_book(&tob);
        true
    }

    // ========================================================================
    // Query Path
    // ========================================================================

    /// Publish a depth snapshot for one symbol through the depth sink.
    ///
    /// This is an explicit query; the event path never emits depth.
    ///
    /// # Errors
    /// Returns `UnknownSymbol` for an unregistered symbol.
    pub fn publish_depth(&mut self, symbol: &SymbolId, levels: usize) -> Result<(), EngineError> {
        let book = self
            .books
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol {
                symbol: symbol.clone(),
            })?;

        let bids = book.depth(Side::Buy, levels);
        let asks = book.depth(Side::Sell, levels);
        self.publisher.publish_depth(symbol, &bids, &asks);
        Ok(())
    }
}

fn top_of_book(book: &OrderBook) -> TopOfBook {
    TopOfBook {
        symbol: book.symbol().clone(),
        best_bid: book.best_bid(),
        best_ask: book.best_ask(),
    }
}

// ============================================================================
// Tests
// ============================================================================
