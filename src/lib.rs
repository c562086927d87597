//! # Tickmatch
//!
//! A deterministic, single-instrument limit order book matching engine.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one thread owns the book exclusively (no locks)
//! - **Price-Time Priority**: strict price priority across levels, FIFO within
//! - **Slot Allocation**: no heap allocation on the submit/cancel path once warm
//! - **Ordered Index**: O(log L) best-price access on both sides
//!
//! ## Architecture
//!
//! ```text
//! submit_limit / submit_market / cancel
//!         |
//!   [MatchingEngine] --> [Matcher] --> [OrderBook (bids | asks | id map)]
//!         |                                    |
//!     [SlotPool] <--- released slots ----------+
//! ```

pub mod engine;
pub mod error;
pub mod matching;
pub mod order_book;
pub mod pool;
pub mod price_level;
pub mod types;

// Re-exports for convenience
pub use engine::MatchingEngine;
pub use error::EngineError;
pub use matching::MatchResult;
pub use order_book::OrderBook;
pub use pool::{Order, SlotIndex, SlotPool, NULL_SLOT};
pub use price_level::PriceLevel;
pub use types::{OrderId, OrderKind, Price, Quantity, Side, Trade};
