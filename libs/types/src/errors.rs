//! Error taxonomy shared across the pipeline
//!
//! Transport- and storage-specific errors live in their own crates;
//! this module covers the failures both sides of the bus can produce.

use thiserror::Error;

/// Errors arising from sample construction and payload decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The bus delivered a payload that fails structural validation.
    /// Dropped at the consumer, never propagated as a fatal error.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A price value was negative. Upstream quotes are non-negative by
    /// contract; a negative value means a decoding bug, not a market move.
    #[error("negative price: {0}")]
    NegativePrice(String),

    /// Serialization of an outbound sample failed.
    #[error("encode error: {0}")]
    Encode(String),
}
