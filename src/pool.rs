//! Slot Pool - fixed-capacity order storage with O(1) acquire/release.
//!
//! The pool pre-allocates a contiguous block of slots at construction,
//! eliminating heap allocation on the submit/cancel path. A free list is
//! threaded through the `next` field of unused slots; reuse is LIFO so the
//! most recently released cache line is handed out first.

use std::fmt;

use crate::types::{OrderId, OrderKind, Price, Quantity, Side};

/// Sentinel value representing a null/invalid slot index
pub const NULL_SLOT: u32 = u32::MAX;

/// Index into the slot pool - a "compressed pointer".
/// 32 bits instead of a machine pointer halves linkage metadata.
pub type SlotIndex = u32;

/// A single order - exactly 64 bytes (one cache line).
///
/// The `prev`/`next` fields double as the order's handle into its price
/// level's FIFO queue while resting, and as free-list linkage while the slot
/// is unallocated. The handle is only meaningful while the order rests.
#[repr(C)]
#[repr(align(64))]
#[derive(Clone, Copy)]
pub struct Order {
    /// Price in ticks. Unused for market orders and never read for them.
    pub price: Price,

    /// External order ID (client-assigned)
    pub id: OrderId,

    /// Nanoseconds on the engine's monotonic clock at construction.
    /// Observational only; matching depends on arrival order.
    pub timestamp_ns: u64,

    /// Original quantity
    pub quantity: Quantity,

    /// Quantity left to fill (0 <= remaining <= quantity)
    pub remaining: Quantity,

    /// Next order at the same price level (or next free slot)
    pub next: SlotIndex,

    /// Previous order at the same price level (enables O(1) cancel)
    pub prev: SlotIndex,

    /// Buy or sell
    pub side: Side,

    /// Limit or market
    pub kind: OrderKind,
}

// Compile-time assertion: Order must occupy exactly one cache line
const _: () = assert!(
    std::mem::size_of::<Order>() == 64,
    "Order must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<Order>() == 64,
    "Order must be 64-byte aligned"
);

impl Order {
    /// Create a new order with full remaining quantity
    #[inline]
    pub const fn new(
        id: OrderId,
        side: Side,
        kind: OrderKind,
        price: Price,
        quantity: Quantity,
        timestamp_ns: u64,
    ) -> Self {
        Self {
            price,
            id,
            timestamp_ns,
            quantity,
            remaining: quantity,
            next: NULL_SLOT,
            prev: NULL_SLOT,
            side,
            kind,
        }
    }

    /// Create an empty/uninitialized slot (for the free list)
    #[inline]
    pub const fn empty() -> Self {
        Self {
            price: 0,
            id: 0,
            timestamp_ns: 0,
            quantity: 0,
            remaining: 0,
            next: NULL_SLOT,
            prev: NULL_SLOT,
            side: Side::Buy,
            kind: OrderKind::Limit,
        }
    }

    /// Is this order fully filled?
    #[inline]
    pub const fn is_filled(&self) -> bool {
        self.remaining == 0
    }

    /// Fill up to `qty`, returning how much was actually filled.
    /// Never underflows: the fill is clamped to `remaining`.
    #[inline]
    pub fn fill(&mut self, qty: Quantity) -> Quantity {
        let filled = qty.min(self.remaining);
        self.remaining -= filled;
        filled
    }

    /// Reset the slot for reuse (when returning to the free list)
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::empty();
    }
}

impl fmt::Debug for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Order")
            .field("id", &self.id)
            .field("side", &self.side)
            .field("kind", &self.kind)
            .field("price", &self.price)
            .field("quantity", &self.quantity)
            .field("remaining", &self.remaining)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish()
    }
}

/// Pre-allocated order storage with O(1) acquire and release.
///
/// The pool is the only source of order storage; the book index holds
/// slot indices into it. No system calls or allocation after construction.
pub struct SlotPool {
    /// Contiguous block of pre-allocated slots
    slots: Vec<Order>,

    /// Head of the free list (index of first available slot)
    free_head: SlotIndex,

    /// Number of currently live orders
    live: u32,

    /// Total capacity
    capacity: u32,
}

impl SlotPool {
    /// Create a new pool with the specified capacity.
    ///
    /// # Panics
    /// Panics if capacity is not below `NULL_SLOT` (reserved as sentinel).
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NULL_SLOT, "capacity must be less than NULL_SLOT");

        let mut slots = vec![Order::empty(); capacity as usize];

        // Thread the free list through all slots
        for i in 0..capacity.saturating_sub(1) {
            slots[i as usize].next = i + 1;
        }
        if capacity > 0 {
            slots[(capacity - 1) as usize].next = NULL_SLOT;
        }

        Self {
            slots,
            free_head: if capacity > 0 { 0 } else { NULL_SLOT },
            live: 0,
            capacity,
        }
    }

    /// Acquire a slot and store `order` in it.
    ///
    /// Returns `None` if the pool is exhausted.
    ///
    /// # Complexity
    /// O(1) - pops from the head of the free list
    #[inline]
    pub fn acquire(&mut self, order: Order) -> Option<SlotIndex> {
        if self.free_head == NULL_SLOT {
            return None;
        }

        let index = self.free_head;
        self.free_head = self.slots[index as usize].next;
        self.live += 1;

        let slot = &mut self.slots[index as usize];
        *slot = order;
        slot.next = NULL_SLOT;
        slot.prev = NULL_SLOT;

        Some(index)
    }

    /// Release a slot back to the pool.
    ///
    /// The index must have been previously acquired and not yet released;
    /// only the engine facade holds slot indices, which is what prevents a
    /// double release by construction.
    ///
    /// # Complexity
    /// O(1) - pushes onto the head of the free list
    #[inline]
    pub fn release(&mut self, index: SlotIndex) {
        debug_assert!(index < self.capacity, "slot index out of bounds");
        debug_assert!(self.live > 0, "release with no live orders");

        let slot = &mut self.slots[index as usize];
        slot.reset();
        slot.next = self.free_head;
        self.free_head = index;
        self.live -= 1;
    }

    /// Get an immutable reference to a slot.
    #[inline]
    pub fn get(&self, index: SlotIndex) -> &Order {
        debug_assert!(index < self.capacity, "slot index out of bounds");
        &self.slots[index as usize]
    }

    /// Get a mutable reference to a slot.
    #[inline]
    pub fn get_mut(&mut self, index: SlotIndex) -> &mut Order {
        debug_assert!(index < self.capacity, "slot index out of bounds");
        &mut self.slots[index as usize]
    }

    /// Number of currently live orders.
    #[inline]
    pub fn live(&self) -> u32 {
        self.live
    }

    /// Total capacity of the pool.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of free slots remaining.
    #[inline]
    pub fn available(&self) -> u32 {
        self.capacity - self.live
    }

    /// Returns true if no orders are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns true if no free slots remain.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_head == NULL_SLOT
    }

    /// Pre-fault all memory pages (warm-up routine).
    ///
    /// Walks every slot to force the OS to map virtual pages to physical
    /// RAM, preventing page faults on the submit path.
    pub fn warm_up(&mut self) {
        for slot in &mut self.slots {
            // Volatile write to prevent the touch being optimized away
            unsafe {
                std::ptr::write_volatile(&mut slot.timestamp_ns, 0);
            }
        }
    }
}

impl fmt::Debug for SlotPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("capacity", &self.capacity)
            .field("live", &self.live)
            .field("free_head", &self.free_head)
            .finish()
    }
}
