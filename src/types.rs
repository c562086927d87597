//! Scalar aliases and value types shared across the engine.

use std::fmt;

/// Price in integer ticks. The engine never fixes a tick size; prices are
/// compared as plain integers and may be negative.
pub type Price = i64;

/// Order quantity.
pub type Quantity = u32;

/// External order ID (client-assigned).
pub type OrderId = u64;

/// Order side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind determines matching behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum OrderKind {
    /// Limit order - rests in the book if not fully matched (default)
    #[default]
    Limit = 0,
    /// Market order - walks the opposite side; any residual is discarded
    Market = 1,
}

/// An executed fill, emitted by the matcher in consumption order.
///
/// The buy/sell ids are populated from the correct sides regardless of which
/// side was the aggressor. `price` is always the resting order's price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trade {
    /// Order id on the buy side of the fill
    pub buy_order_id: OrderId,
    /// Order id on the sell side of the fill
    pub sell_order_id: OrderId,
    /// Execution price in ticks
    pub price: Price,
    /// Executed quantity
    pub quantity: Quantity,
    /// Nanoseconds on the engine's monotonic clock (observability only)
    pub timestamp_ns: u64,
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade: buyer={} seller={} price={} qty={}",
            self.buy_order_id, self.sell_order_id, self.price, self.quantity
        )
    }
}
