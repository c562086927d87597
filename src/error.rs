//! Error taxonomy for the engine facade.
//!
//! Submission failures are atomic: an error means no trade happened, no slot
//! was consumed and no counter moved. Cancelling an unknown id is not an
//! error (it returns `false`).

use thiserror::Error;

use crate::types::OrderId;

/// Errors surfaced by [`crate::MatchingEngine`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The slot pool has no free slot for the incoming order.
    #[error("order pool exhausted (capacity {capacity})")]
    PoolExhausted {
        /// Fixed capacity the pool was built with
        capacity: u32,
    },

    /// Zero-quantity submission, rejected before any state change.
    #[error("invalid quantity for order {order_id}: must be positive")]
    InvalidQuantity {
        /// Id of the rejected order
        order_id: OrderId,
    },

    /// The id is already bound to a resting order.
    #[error("order {order_id} is already resting in the book")]
    DuplicateOrderId {
        /// Id of the rejected order
        order_id: OrderId,
    },

    /// Detected internal inconsistency. Fatal: the book can no longer be
    /// trusted.
    #[error("book integrity violated: {0}")]
    InvariantViolation(String),
}
