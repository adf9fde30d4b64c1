//! Price Consumer
//!
//! Receives published samples from the bus and maintains:
//! - a bounded, resizable in-memory rolling history per asset plus a
//!   latest-price slot,
//! - a durable append-only record of every distinct observation.
//!
//! ```text
//! Bus delivery
//!      │
//!  ┌───▼────┐   dedup vs last appended row
//!  │ Ingest │──────────────────┐
//!  └───┬────┘                  │
//!      │                  (dropped)
//!  ┌───┴────────┬──────────┐
//!  │            │          │
//! Rolling    Latest     Durable
//! windows    prices     CSV log
//! ```
//!
//! The rolling history is the read surface for the UI/analysis context
//! and the forecaster; the durable log is the unbounded record.

pub mod config;
pub mod forecast;
pub mod history;
pub mod ingest;
pub mod log;

pub use history::{RollingHistoryStore, StoreStats};
pub use ingest::{IngestHandler, IngestOutcome};
pub use log::{LogError, PriceLog};
