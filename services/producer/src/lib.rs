//! Price Producer
//!
//! Polls the upstream quote source on a fixed interval, rejects
//! degenerate readings, timestamps accepted ones, and publishes them to
//! the bus. No local persistence: a producer with no attached consumer
//! performs no durable write.
//!
//! ```text
//! Quote Source ──fetch──▶ acceptance policy ──stamp──▶ bus publish
//!      ▲                        │
//!      └── next poll ◀── skip ──┘   (errors and degenerate readings)
//! ```

pub mod config;
pub mod policy;
pub mod poll;
pub mod source;

pub use poll::{ProducerLoop, TickOutcome};
pub use source::{CoinGeckoSource, QuoteSource, SourceError};
