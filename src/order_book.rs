//! Order Book - the two-sided priced index of resting orders.
//!
//! Each side is an ordered map from tick price to its price level, so the
//! best price is the first (asks) or last (bids) key in O(log L). A separate
//! id map gives O(1) lookup for cancellation.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::EngineError;
use crate::pool::{SlotIndex, SlotPool, NULL_SLOT};
use crate::price_level::PriceLevel;
use crate::types::{OrderId, OrderKind, Price, Side};

/// The resting book: ordered bid and ask sides plus the id lookup map.
///
/// The book holds only slot indices; the pool owns the order storage. The
/// book never rests in a locked or crossed state: a crossing incoming order
/// is matched to exhaustion before any residual is inserted.
pub struct OrderBook {
    /// Bid levels by price; the best bid is the highest (last) key
    pub(crate) bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels by price; the best ask is the lowest (first) key
    pub(crate) asks: BTreeMap<Price, PriceLevel>,
    /// Resting-order lookup: id -> slot index
    pub(crate) ids: FxHashMap<OrderId, SlotIndex>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Create an empty book with the id map pre-sized for `orders` resting
    /// orders, so the lookup table never rehashes on the submit path.
    pub fn with_capacity(orders: usize) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            ids: FxHashMap::with_capacity_and_hasher(orders, Default::default()),
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    /// Highest resting buy price
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.last_key_value().map(|(price, _)| *price)
    }

    /// Lowest resting sell price
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first_key_value().map(|(price, _)| *price)
    }

    /// `best_ask - best_bid`; present only when both sides are non-empty.
    /// Never negative while the book invariants hold.
    #[inline]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Place a resting order into its side's level, creating the level if
    /// absent, and record the id binding.
    ///
    /// The order must be a limit with positive remaining; market orders are
    /// never inserted (the facade guarantees both).
    pub fn insert(&mut self, pool: &mut SlotPool, index: SlotIndex) {
        let order = pool.get(index);
        let (id, side, price) = (order.id, order.side, order.price);
        debug_assert!(order.kind == OrderKind::Limit, "market orders never rest");
        debug_assert!(order.remaining > 0, "filled orders never rest");
        debug_assert!(!self.ids.contains_key(&id), "id already resting");

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(price)
            .or_insert_with(PriceLevel::new)
            .enqueue(pool, index);

        self.ids.insert(id, index);
    }

    /// Remove a resting order by id (cancellation path).
    ///
    /// Unlinks the order from its level in O(1) via its stored handle,
    /// erases the level if it empties, and clears the id binding.
    ///
    /// # Returns
    /// The freed slot index for the caller to release, or `None` if the id
    /// is not resting.
    pub fn cancel(&mut self, pool: &mut SlotPool, id: OrderId) -> Option<SlotIndex> {
        let index = self.ids.remove(&id)?;
        let (side, price) = {
            let order = pool.get(index);
            (order.side, order.price)
        };

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&price) {
            level.unlink(pool, index);
            if level.is_empty() {
                levels.remove(&price);
            }
        }

        Some(index)
    }

    /// Look up a resting order's slot by id.
    #[inline]
    pub fn lookup(&self, id: OrderId) -> Option<SlotIndex> {
        self.ids.get(&id).copied()
    }

    /// Check whether an id is currently resting.
    #[inline]
    pub fn contains(&self, id: OrderId) -> bool {
        self.ids.contains_key(&id)
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Number of resting orders
    #[inline]
    pub fn order_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of distinct bid prices
    #[inline]
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of distinct ask prices
    #[inline]
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Returns true if no orders rest on either side
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Best-first `(price, total_qty, order_count)` rows for one side,
    /// at most `max_levels` of them.
    pub fn depth(&self, side: Side, max_levels: usize) -> Vec<(Price, u64, u32)> {
        match side {
            Side::Buy => self
                .bids
                .iter()
                .rev()
                .take(max_levels)
                .map(|(price, level)| (*price, level.total_qty(), level.len()))
                .collect(),
            Side::Sell => self
                .asks
                .iter()
                .take(max_levels)
                .map(|(price, level)| (*price, level.total_qty(), level.len()))
                .collect(),
        }
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Walk the whole book and verify its invariants against the pool:
    /// level totals and counts, side/price agreement, id-map consistency,
    /// no empty levels, no crossed book.
    ///
    /// Any violation is fatal to the caller; the book can no longer be
    /// trusted after one.
    pub fn audit(&self, pool: &SlotPool) -> Result<(), EngineError> {
        let violation = |msg: String| Err(EngineError::InvariantViolation(msg));

        let mut resting = 0usize;
        for (side, levels) in [(Side::Buy, &self.bids), (Side::Sell, &self.asks)] {
            for (&price, level) in levels {
                if level.is_empty() {
                    return violation(format!("empty level persisted at {price} on {side:?}"));
                }

                let mut qty_sum = 0u64;
                let mut walked = 0u32;
                let mut cursor = level.front();
                while let Some(index) = cursor {
                    let order = pool.get(index);
                    if order.side != side || order.price != price {
                        return violation(format!(
                            "order {} keyed under {price} {side:?} but carries {} {:?}",
                            order.id, order.price, order.side
                        ));
                    }
                    if order.remaining == 0 || order.remaining > order.quantity {
                        return violation(format!(
                            "order {} rests with remaining {} of {}",
                            order.id, order.remaining, order.quantity
                        ));
                    }
                    if self.ids.get(&order.id) != Some(&index) {
                        return violation(format!("order {} missing from id map", order.id));
                    }
                    qty_sum += order.remaining as u64;
                    walked += 1;
                    cursor = (order.next != NULL_SLOT).then_some(order.next);
                }

                if qty_sum != level.total_qty() || walked != level.len() {
                    return violation(format!(
                        "level {price} {side:?} caches qty {} count {} but holds qty {} count {}",
                        level.total_qty(),
                        level.len(),
                        qty_sum,
                        walked
                    ));
                }
                resting += walked as usize;
            }
        }

        if resting != self.ids.len() {
            return violation(format!(
                "id map binds {} orders but levels hold {}",
                self.ids.len(),
                resting
            ));
        }

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return violation(format!("book rests crossed: bid {bid} >= ask {ask}"));
            }
        }

        Ok(())
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.bids.len())
            .field("ask_levels", &self.asks.len())
            .field("order_count", &self.ids.len())
            .finish()
    }
}
