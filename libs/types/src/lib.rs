//! Types library for the price feed pipeline
//!
//! This library provides the core type definitions shared by the
//! producer, the consumer, and the bus transport, ensuring a single
//! definition of the asset universe and the persisted row format.
//!
//! # Modules
//! - `ids`: Asset identifiers and the configured asset universe
//! - `numeric`: Non-negative decimal price type
//! - `sample`: Published samples and durable rows
//! - `errors`: Error taxonomy

// Public modules
pub mod errors;
pub mod ids;
pub mod numeric;
pub mod sample;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::sample::*;
}
