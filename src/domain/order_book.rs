// ============================================================================
// Order Book Domain Model
// Price-indexed resting-order container and price-time matching for one symbol
// ============================================================================

use crate::numeric::{Price, Quantity};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use super::order::{BookOrder, OrderId, Side, SymbolId};
use super::trade::{BookLevel, Trade};

/// Rejections produced by book mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("order {id} is already resting in the book")]
    DuplicateOrder { id: OrderId },

    #[error("order {id} has non-positive quantity")]
    InvalidQuantity { id: OrderId },
}

// ============================================================================
// Internal Storage
// ============================================================================

/// Arena node: a resting order plus its links within the price-level queue.
///
/// Nodes live in a single `Vec` arena; freed slots are chained through
/// `next` into a free list and reused, so steady-state matching allocates
/// nothing.
#[derive(Debug, Clone, Copy)]
struct OrderNode {
    order: BookOrder,
    next: Option<usize>,
    prev: Option<usize>,
}

/// One price level: a doubly-linked FIFO queue of arena slots plus the
/// running aggregate quantity (kept incrementally, never recomputed).
#[derive(Debug, Clone, Copy)]
struct Level {
    head: Option<usize>,
    tail: Option<usize>,
    total_qty: Quantity,
}

impl Level {
    const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            total_qty: Quantity::ZERO,
        }
    }
}

// ============================================================================
// Order Book
// ============================================================================

/// Limit order book for a single symbol.
///
/// Resting orders are indexed by price with strict FIFO queues per level.
/// Cancellation is O(1): an id→slot index locates the node and the queue is
/// doubly linked, so middle removal needs no scan.
///
/// The book holds state only; interpretation of order type and time in
/// force, index maintenance across symbols, and market-data emission belong
/// to the engine layer.
#[derive(Debug, Clone)]
pub struct OrderBook {
    symbol: SymbolId,

    /// Bid side; best bid is the highest price (iterated in reverse)
    bids: BTreeMap<Price, Level>,

    /// Ask side; best ask is the lowest price
    asks: BTreeMap<Price, Level>,

    /// Arena of queue nodes, shared by both sides
    nodes: Vec<OrderNode>,

    /// Head of the free-slot chain threaded through `OrderNode::next`
    free_head: Option<usize>,

    /// Resting-order locator: id → arena slot
    index: HashMap<OrderId, usize>,
}

impl OrderBook {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            nodes: Vec::new(),
            free_head: None,
            index: HashMap::new(),
        }
    }

    pub fn symbol(&self) -> &SymbolId {
        &self.symbol
    }

    /// Number of orders currently resting in the book.
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Whether an order with this id is resting in the book.
    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }

    /// The resting order with this id, if present.
    pub fn resting(&self, id: OrderId) -> Option<&BookOrder> {
        self.index.get(&id).map(|&slot| &self.nodes[slot].order)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a resting order at the tail of its price level.
    ///
    /// No matching happens here; the caller is expected to have matched the
    /// order first and to be depositing only the residual.
    ///
    /// # Errors
    /// - `DuplicateOrder` if the id is already resting (book unchanged)
    /// - `InvalidQuantity` if `qty <= 0` (book unchanged)
    pub fn add(&mut self, order: BookOrder) -> Result<(), BookError> {
        if !order.qty.is_positive() {
            return Err(BookError::InvalidQuantity { id: order.id });
        }
        if self.index.contains_key(&order.id) {
            return Err(BookError::DuplicateOrder { id: order.id });
        }

        let slot = self.alloc_node(order);

        let level = match order.side {
            Side::Buy => self.bids.entry(order.price).or_insert_with(Level::new),
            Side::Sell => self.asks.entry(order.price).or_insert_with(Level::new),
        };

        match level.tail {
            Some(tail) => {
                self.nodes[tail].next = Some(slot);
                self.nodes[slot].prev = Some(tail);
            }
            None => level.head = Some(slot),
        }
        level.tail = Some(slot);
        level.total_qty += order.qty;

        self.index.insert(order.id, slot);
        Ok(())
    }

    /// Remove a resting order by id.
    ///
    /// Returns whether an order was removed. Empty levels are pruned
    /// eagerly so no level ever exists with an empty queue.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };

        let node = self.nodes[slot];
        let level = match node.order.side {
            Side::Buy => self.bids.get_mut(&node.order.price),
            Side::Sell => self.asks.get_mut(&node.order.price),
        }
        .expect("indexed order must have a price level");

        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => level.head = node.next,
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => level.tail = node.prev,
        }
        level.total_qty -= node.order.qty;

        let level_empty = level.head.is_none();
        if level_empty {
            match node.order.side {
                Side::Buy => self.bids.remove(&node.order.price),
                Side::Sell => self.asks.remove(&node.order.price),
            };
        }

        self.free_node(slot);
        true
    }

    /// Match an incoming order against the opposite side.
    ///
    /// Walks the opposite side best-price-first, consuming resting orders
    /// in FIFO order at each crossing level. Fills execute at the resting
    /// order's price. Returns the trades and the unmatched residual; the
    /// residual is NOT deposited into the book.
    ///
    /// The incoming order's `price` must already be the effective limit
    /// price (marketable sentinel for market orders).
    pub fn match_incoming(&mut self, incoming: &BookOrder, ts_ns: u64) -> (Vec<Trade>, Quantity) {
        let mut trades = Vec::new();
        let mut remaining = incoming.qty;

        while remaining.is_positive() {
            // Best opposite level: lowest ask for a buy, highest bid for a sell
            let best_price = match incoming.side {
                Side::Buy => self.asks.keys().next().copied(),
                Side::Sell => self.bids.keys().next_back().copied(),
            };
            let Some(best_price) = best_price else {
                break;
            };

            let crosses = match incoming.side {
                Side::Buy => incoming.price >= best_price,
                Side::Sell => incoming.price <= best_price,
            };
            if !crosses {
                break;
            }

            let level = match incoming.side {
                Side::Buy => self.asks.get_mut(&best_price),
                Side::Sell => self.bids.get_mut(&best_price),
            }
            .expect("best price came from this side");

            // Consume the level head-first until the level or the incoming
            // order is exhausted
            while remaining.is_positive() {
                let Some(head) = level.head else {
                    break;
                };

                let fill = remaining.min(self.nodes[head].order.qty);
                trades.push(Trade {
                    resting_id: self.nodes[head].order.id,
                    incoming_id: incoming.id,
                    symbol: self.symbol.clone(),
                    aggressor_side: incoming.side,
                    price: best_price,
                    qty: fill,
                    match_ts_ns: ts_ns,
                });

                remaining -= fill;
                self.nodes[head].order.qty -= fill;
                level.total_qty -= fill;

                if self.nodes[head].order.qty.is_zero() {
                    let next = self.nodes[head].next;
                    level.head = next;
                    match next {
                        Some(next) => self.nodes[next].prev = None,
                        None => level.tail = None,
                    }

                    let resting_id = self.nodes[head].order.id;
                    self.index.remove(&resting_id);

                    // Inline free-list push; `free_node` would re-borrow self
                    // while the level is held
                    self.nodes[head].next = self.free_head;
                    self.nodes[head].prev = None;
                    self.free_head = Some(head);
                }
            }

            let level_empty = level.head.is_none();
            if level_empty {
                match incoming.side {
                    Side::Buy => self.asks.remove(&best_price),
                    Side::Sell => self.bids.remove(&best_price),
                };
            } else {
                // Incoming exhausted against a partially consumed head
                break;
            }
        }

        (trades, remaining)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Non-mutating liquidity check: would an order of `needed` units on
    /// `side` fill completely at prices crossing `limit_price`?
    ///
    /// Used by the engine for the fill-or-kill dry run.
    pub fn peek_liquidity(&self, side: Side, limit_price: Price, needed: Quantity) -> bool {
        let mut available = Quantity::ZERO;

        match side {
            Side::Buy => {
                for (&price, level) in self.asks.iter() {
                    if limit_price < price {
                        break;
                    }
                    available = available.saturating_add(level.total_qty);
                    if available >= needed {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (&price, level) in self.bids.iter().rev() {
                    if limit_price > price {
                        break;
                    }
                    available = available.saturating_add(level.total_qty);
                    if available >= needed {
                        return true;
                    }
                }
            }
        }

        false
    }

    /// Best bid level (highest price), or `None` when the side is empty.
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.iter().next_back().map(|(&price, level)| BookLevel {
            price,
            qty: level.total_qty,
        })
    }

    /// Best ask level (lowest price), or `None` when the side is empty.
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.iter().next().map(|(&price, level)| BookLevel {
            price,
            qty: level.total_qty,
        })
    }

    /// Up to `levels` aggregated levels on the requested side, best-first.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<BookLevel> {
        let iter: Box<dyn Iterator<Item = (&Price, &Level)>> = match side {
            Side::Buy => Box::new(self.bids.iter().rev()),
            Side::Sell => Box::new(self.asks.iter()),
        };

        iter.take(levels)
            .map(|(&price, level)| BookLevel {
                price,
                qty: level.total_qty,
            })
            .collect()
    }

    // ========================================================================
    // Arena Management
    // ========================================================================

    fn alloc_node(&mut self, order: BookOrder) -> usize {
        let node = OrderNode {
            order,
            next: None,
            prev: None,
        };

        match self.free_head {
            Some(slot) => {
                self.free_head = self.nodes[slot].next;
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn free_node(&mut self, slot: usize) {
        self.nodes[slot].next = self.free_head;
        self.nodes[slot].prev = None;
        self.free_head = Some(slot);
    }
}

// ============================================================================
// Tests
// ============================================================================
