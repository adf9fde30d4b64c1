//! Message Bus
//!
//! Topic-addressed publish/subscribe channel decoupling the producer
//! from its consumers:
//! - Publish is fire-and-forget: no blocking on subscribers, no
//!   delivery confirmation.
//! - Each live subscriber receives every payload independently, in
//!   publish order, on its own execution context.
//! - Delivery is at-most-once per connected subscriber: no replay for
//!   late joiners, and a lagging subscriber drops messages rather than
//!   back-pressuring the publisher.
//!
//! The in-process [`Broker`] is the core; [`server`] exposes it over a
//! WebSocket endpoint and [`client::BusClient`] gives remote processes
//! the same publish/subscribe surface.

pub mod broker;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod topics;

pub use broker::{spawn_dispatch, Broker, Subscription};
pub use client::{BusClient, RemoteSubscription};
pub use error::BusError;
pub use topics::PRICE_TOPIC;

/// Fire-and-forget publish surface shared by the in-process broker and
/// the remote client, so the producer loop is transport-agnostic.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;
}
