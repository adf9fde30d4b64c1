//! Remote bus client
//!
//! Connects to the broker server over WebSocket and offers the same
//! publish/subscribe surface as the in-process broker. Outbound frames
//! go through a writer task (publish never blocks on the socket);
//! inbound deliveries are routed to per-topic subscription channels by
//! a reader task.

use std::sync::Arc;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::BusError;
use crate::protocol::{ClientFrame, Delivery};
use crate::topics::is_valid_topic;
use crate::Publisher;

/// Handle to a broker connection. Cheap to clone; clones share the
/// underlying socket.
#[derive(Clone)]
pub struct BusClient {
    outbound: mpsc::UnboundedSender<ClientFrame>,
    routes: Arc<DashMap<String, mpsc::UnboundedSender<Vec<u8>>>>,
}

impl BusClient {
    /// Connect to a broker (e.g. `ws://127.0.0.1:7447/ws`).
    ///
    /// Failing to reach the broker is an unrecoverable startup
    /// condition for both pipeline processes.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let (ws, _) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();
        info!(url, "Connected to bus broker");

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientFrame>();
        let routes: Arc<DashMap<String, mpsc::UnboundedSender<Vec<u8>>>> =
            Arc::new(DashMap::new());

        // Writer task: serializes and sends outbound frames.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(error = %e, "Failed to encode outbound frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        // Reader task: routes deliveries to topic subscriptions.
        let reader_routes = routes.clone();
        tokio::spawn(async move {
            while let Some(Ok(message)) = stream.next().await {
                if let Message::Text(text) = message {
                    match serde_json::from_str::<Delivery>(&text) {
                        Ok(delivery) => {
                            if let Some(route) = reader_routes.get(&delivery.topic) {
                                // Receiver gone means the subscription
                                // was dropped; the message is lost, per
                                // the at-most-once contract.
                                let _ = route.send(delivery.payload.into_bytes());
                            }
                        }
                        Err(e) => warn!(error = %e, "Dropping unparseable delivery frame"),
                    }
                }
            }
            debug!("Bus reader loop finished");
        });

        Ok(Self {
            outbound: out_tx,
            routes,
        })
    }

    /// Fire-and-forget publish. Queues the frame for the writer task
    /// and returns without waiting for delivery.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if !is_valid_topic(topic) {
            return Err(BusError::InvalidTopic(topic.to_string()));
        }
        let payload =
            String::from_utf8(payload).map_err(|e| BusError::Encode(e.to_string()))?;
        let frame = ClientFrame::Publish {
            topic: topic.to_string(),
            payload,
        };
        self.outbound.send(frame).map_err(|_| BusError::Closed)
    }

    /// Subscribe to a topic. One subscription per topic per client.
    pub fn subscribe(&self, topic: &str) -> Result<RemoteSubscription, BusError> {
        if !is_valid_topic(topic) {
            return Err(BusError::InvalidTopic(topic.to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.insert(topic.to_string(), tx);
        self.outbound
            .send(ClientFrame::Subscribe {
                topic: topic.to_string(),
            })
            .map_err(|_| BusError::Closed)?;
        Ok(RemoteSubscription {
            topic: topic.to_string(),
            rx,
        })
    }
}

impl Publisher for BusClient {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        BusClient::publish(self, topic, payload)
    }
}

/// A live remote subscription to one topic.
pub struct RemoteSubscription {
    topic: String,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl RemoteSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next payload, or `None` when the connection is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for callers that poll.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }
}
