//! Order book error types.

use thiserror::Error;

/// Errors surfaced by direct order book operations.
///
/// The engine facade validates requests before they reach the book, so these
/// only occur when the book is driven directly with a malformed order.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderBookError {
    /// A resting insert requires a limit price.
    #[error("order has no limit price and cannot rest in the book")]
    MissingPrice,

    /// A resting insert requires a positive remaining quantity.
    #[error("order has zero remaining quantity")]
    ZeroQuantity,
}
