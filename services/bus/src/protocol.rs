//! Wire frames shared by the broker server and the remote client
//!
//! All frames are JSON text. Payloads are carried as text because the
//! pipeline's bus payloads are themselves a self-describing text
//! format; the publish/subscribe API still speaks bytes at the edges.

use serde::{Deserialize, Serialize};

/// Client → broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Register this connection for every future payload on `topic`.
    Subscribe { topic: String },
    /// Fan `payload` out to the topic's current subscribers.
    Publish { topic: String, payload: String },
}

/// Broker → client: one delivered payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub topic: String,
    pub payload: String,
}
