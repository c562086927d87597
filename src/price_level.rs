//! Price Level - the FIFO queue of resting orders at one price.
//!
//! The queue is intrusive: each order's `prev`/`next` slot indices are its
//! position handle. Removal splices the two neighbors around the departing
//! order, so it costs O(1) from any position and never disturbs the handles
//! of the orders that stay.

use crate::pool::{SlotIndex, SlotPool, NULL_SLOT};
use crate::types::Quantity;

/// Queue metadata for one price. The orders themselves live in the pool;
/// the level tracks only the two ends, the resting total, and the length.
///
/// Matching consumes from the front (oldest), new orders join at the back.
#[derive(Clone, Copy, Debug)]
pub struct PriceLevel {
    front: SlotIndex,
    back: SlotIndex,
    total_qty: u64,
    len: u32,
}

impl PriceLevel {
    /// Create a new empty price level
    #[inline]
    pub const fn new() -> Self {
        Self {
            front: NULL_SLOT,
            back: NULL_SLOT,
            total_qty: 0,
            len: 0,
        }
    }

    /// True when no orders rest at this price
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.front == NULL_SLOT
    }

    /// Number of resting orders
    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Cached sum of `remaining` across the level
    #[inline]
    pub const fn total_qty(&self) -> u64 {
        self.total_qty
    }

    /// Oldest resting order, `None` when the level is empty
    #[inline]
    pub fn front(&self) -> Option<SlotIndex> {
        (self.front != NULL_SLOT).then_some(self.front)
    }

    /// Join the queue at the back (newest position).
    ///
    /// The order's current `remaining` joins the level total.
    ///
    /// # Complexity
    /// O(1)
    pub fn enqueue(&mut self, pool: &mut SlotPool, index: SlotIndex) {
        let back = self.back;
        {
            let order = pool.get_mut(index);
            debug_assert!(order.remaining > 0, "empty order joining a level");
            order.prev = back;
            order.next = NULL_SLOT;
            self.total_qty += u64::from(order.remaining);
        }

        if back == NULL_SLOT {
            self.front = index;
        } else {
            pool.get_mut(back).next = index;
        }
        self.back = index;
        self.len += 1;
    }

    /// Unlink an order from anywhere in the queue in O(1).
    ///
    /// Each neighbor is spliced independently; a missing neighbor means the
    /// departing order was an end of the queue and the level absorbs the
    /// link instead. The order's `remaining` at this moment leaves the level
    /// total, and its handle is cleared. The slot is NOT released.
    pub fn unlink(&mut self, pool: &mut SlotPool, index: SlotIndex) {
        debug_assert!(self.len > 0, "unlink on an empty level");
        let order = *pool.get(index);

        if order.prev == NULL_SLOT {
            debug_assert!(self.front == index);
            self.front = order.next;
        } else {
            pool.get_mut(order.prev).next = order.next;
        }

        if order.next == NULL_SLOT {
            debug_assert!(self.back == index);
            self.back = order.prev;
        } else {
            pool.get_mut(order.next).prev = order.prev;
        }

        let departed = pool.get_mut(index);
        departed.prev = NULL_SLOT;
        departed.next = NULL_SLOT;

        self.total_qty -= u64::from(order.remaining);
        self.len -= 1;
    }

    /// Unlink and return the oldest order, `None` when the level is empty.
    ///
    /// A just-filled front order (remaining == 0) leaves the total
    /// untouched, since its fills were already deducted.
    pub fn take_front(&mut self, pool: &mut SlotPool) -> Option<SlotIndex> {
        let index = self.front()?;
        self.unlink(pool, index);
        Some(index)
    }

    /// Account for a partial fill after an order's `remaining` was
    /// decremented directly.
    #[inline]
    pub fn deduct(&mut self, qty: Quantity) {
        debug_assert!(self.total_qty >= u64::from(qty), "level total underflow");
        self.total_qty -= u64::from(qty);
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
