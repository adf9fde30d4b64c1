//! WebSocket broker server
//!
//! Exposes the in-process [`Broker`] to remote processes. Each
//! connection may subscribe to any number of topics and publish to any
//! topic; deliveries for all of a connection's subscriptions are
//! funneled through one outbound writer task so a slow socket never
//! blocks the broker.

use std::env;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::broker::Broker;
use crate::error::BusError;
use crate::protocol::{ClientFrame, Delivery};
use crate::topics::is_valid_topic;

/// Broker configuration derived from environment variables.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub bind: String,
    pub port: u16,
    pub channel_capacity: usize,
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_str("BUS_BIND", "0.0.0.0"),
            port: env_parse("BUS_PORT", 7447),
            channel_capacity: env_parse("BUS_CHANNEL_CAPACITY", 1024),
        }
    }

    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind, self.port).parse()
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Serve the broker on `addr` until the process is terminated.
pub async fn serve(broker: Broker, addr: SocketAddr) -> Result<(), BusError> {
    let listener = TcpListener::bind(addr).await?;
    serve_with(broker, listener).await
}

/// Serve the broker on an already-bound listener.
pub async fn serve_with(broker: Broker, listener: TcpListener) -> Result<(), BusError> {
    let app = Router::new().route("/ws", get(ws_handler)).with_state(broker);
    info!(addr = %listener.local_addr()?, "Bus broker listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(broker): State<Broker>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, broker))
}

async fn handle_connection(socket: WebSocket, broker: Broker) {
    let (mut sink, mut stream) = socket.split();

    // Single writer task per connection; subscription tasks feed it.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut forwarders: Vec<JoinHandle<()>> = Vec::new();

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(ClientFrame::Subscribe { topic }) => {
                    if !is_valid_topic(&topic) {
                        warn!(topic, "Rejecting subscription to invalid topic");
                        continue;
                    }
                    let mut subscription = broker.subscribe(&topic);
                    let out_tx = out_tx.clone();
                    forwarders.push(tokio::spawn(async move {
                        while let Some(payload) = subscription.recv().await {
                            let delivery = Delivery {
                                topic: subscription.topic().to_string(),
                                payload: String::from_utf8_lossy(&payload).into_owned(),
                            };
                            let frame = match serde_json::to_string(&delivery) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    warn!(error = %e, "Dropping undeliverable payload");
                                    continue;
                                }
                            };
                            if out_tx.send(frame).is_err() {
                                break;
                            }
                        }
                    }));
                }
                Ok(ClientFrame::Publish { topic, payload }) => {
                    if !is_valid_topic(&topic) {
                        warn!(topic, "Rejecting publish to invalid topic");
                        continue;
                    }
                    let delivered = broker.publish(&topic, payload.into_bytes());
                    debug!(topic, delivered, "Published");
                }
                Err(e) => {
                    warn!(error = %e, "Dropping unparseable client frame");
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part
            // of the protocol.
            _ => {}
        }
    }

    for forwarder in forwarders {
        forwarder.abort();
    }
    writer.abort();
    debug!("Bus connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BrokerConfig::from_env();
        assert!(!config.bind.is_empty());
        assert!(config.channel_capacity > 0);
        assert!(config.addr().is_ok());
    }
}
