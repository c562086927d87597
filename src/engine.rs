//! Engine facade - submission, cancellation, counters.
//!
//! Owns the slot pool and the book, drives the matcher, and recycles slots.
//! Every operation runs to completion with no intermediate publish points;
//! a failed submission leaves the book and the counters untouched.

use std::time::Instant;

use crate::error::EngineError;
use crate::matching;
use crate::order_book::OrderBook;
use crate::pool::{Order, SlotPool};
use crate::types::{OrderId, OrderKind, Price, Quantity, Side, Trade};

/// Default pool capacity for [`MatchingEngine::default`]
const DEFAULT_CAPACITY: u32 = 1_000_000;

/// The matching engine: a single-writer facade over the pool, the book and
/// the matcher.
///
/// Order lifecycle: New -> Resting (limit residual), New -> Filled,
/// New -> Discarded (market residual), Resting -> Filled,
/// Resting -> Cancelled. Every terminal state releases the slot.
pub struct MatchingEngine {
    pool: SlotPool,
    book: OrderBook,
    /// Epoch of the monotonic clock stamping orders and trades
    started: Instant,
    total_orders: u64,
    total_trades: u64,
}

impl MatchingEngine {
    /// Create a new engine with a fixed order capacity.
    pub fn new(capacity: u32) -> Self {
        Self {
            pool: SlotPool::new(capacity),
            book: OrderBook::with_capacity(capacity as usize),
            started: Instant::now(),
            total_orders: 0,
            total_trades: 0,
        }
    }

    /// Nanoseconds since engine construction (monotonic, observability only)
    #[inline]
    fn clock_ns(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit a limit order.
    ///
    /// Matches against the opposite side first; any residual quantity rests
    /// in the book. Returns the executed trades in consumption order.
    pub fn submit_limit(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<Vec<Trade>, EngineError> {
        let timestamp_ns = self.clock_ns();
        self.submit(Order::new(id, side, OrderKind::Limit, price, qty, timestamp_ns))
    }

    /// Submit a market order.
    ///
    /// Walks the opposite side until it is exhausted or the quantity is
    /// filled; any residual is discarded. Market orders never rest.
    pub fn submit_market(
        &mut self,
        id: OrderId,
        side: Side,
        qty: Quantity,
    ) -> Result<Vec<Trade>, EngineError> {
        let timestamp_ns = self.clock_ns();
        // The price field of a market order is never read
        self.submit(Order::new(id, side, OrderKind::Market, 0, qty, timestamp_ns))
    }

    fn submit(&mut self, order: Order) -> Result<Vec<Trade>, EngineError> {
        // All rejections happen before any state change: failure is atomic
        if order.quantity == 0 {
            return Err(EngineError::InvalidQuantity { order_id: order.id });
        }
        if self.book.contains(order.id) {
            return Err(EngineError::DuplicateOrderId { order_id: order.id });
        }

        let kind = order.kind;
        let timestamp_ns = order.timestamp_ns;
        let taker = self
            .pool
            .acquire(order)
            .ok_or(EngineError::PoolExhausted {
                capacity: self.pool.capacity(),
            })?;
        self.total_orders += 1;

        let result = matching::execute(&mut self.book, &mut self.pool, taker, timestamp_ns);
        self.total_trades += result.trades.len() as u64;

        // Recycle resting orders the matcher filled
        for filled in &result.filled {
            self.pool.release(*filled);
        }

        // Rest a limit residual; discard everything else
        if kind == OrderKind::Limit && self.pool.get(taker).remaining > 0 {
            self.book.insert(&mut self.pool, taker);
        } else {
            self.pool.release(taker);
        }

        Ok(result.trades)
    }

    /// Cancel a resting order by id.
    ///
    /// Returns `true` and releases the slot iff the id was resting. Unknown
    /// ids (never submitted, filled, or already cancelled) return `false`
    /// with no side effects.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        match self.book.cancel(&mut self.pool, id) {
            Some(index) => {
                self.pool.release(index);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Market Data
    // ========================================================================

    /// Highest resting buy price
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    /// Lowest resting sell price
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// `best_ask - best_bid` when both sides are non-empty
    #[inline]
    pub fn spread(&self) -> Option<Price> {
        self.book.spread()
    }

    /// Remaining quantity of a resting order, `None` if not resting
    #[inline]
    pub fn order_remaining(&self, id: OrderId) -> Option<Quantity> {
        self.book
            .lookup(id)
            .map(|index| self.pool.get(index).remaining)
    }

    /// Best-first `(price, total_qty, order_count)` rows for one side
    #[inline]
    pub fn depth(&self, side: Side, max_levels: usize) -> Vec<(Price, u64, u32)> {
        self.book.depth(side, max_levels)
    }

    /// Read access to the book (printing, market data)
    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Number of currently resting orders
    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Number of distinct bid prices
    #[inline]
    pub fn bid_level_count(&self) -> usize {
        self.book.bid_level_count()
    }

    /// Number of distinct ask prices
    #[inline]
    pub fn ask_level_count(&self) -> usize {
        self.book.ask_level_count()
    }

    /// Cumulative count of accepted submissions (never decreases)
    #[inline]
    pub fn total_orders(&self) -> u64 {
        self.total_orders
    }

    /// Cumulative count of executed trades (never decreases)
    #[inline]
    pub fn total_trades(&self) -> u64 {
        self.total_trades
    }

    /// Fixed capacity of the slot pool
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Pre-fault the pool's memory pages before the first submission.
    pub fn warm_up(&mut self) {
        self.pool.warm_up();
    }

    /// Verify every book invariant against the pool.
    ///
    /// Used by tests and debug tooling; a violation means the engine state
    /// can no longer be trusted.
    pub fn audit(&self) -> Result<(), EngineError> {
        self.book.audit(&self.pool)?;
        if self.pool.live() as usize != self.book.order_count() {
            return Err(EngineError::InvariantViolation(format!(
                "{} live slots vs {} resting orders",
                self.pool.live(),
                self.book.order_count()
            )));
        }
        Ok(())
    }

    /// Hash of the observable state (for determinism testing).
    pub fn state_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.book.best_bid().hash(&mut hasher);
        self.book.best_ask().hash(&mut hasher);
        self.book.order_count().hash(&mut hasher);
        self.pool.live().hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
