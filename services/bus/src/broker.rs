//! In-process topic broker
//!
//! One broadcast channel per topic. Publishing clones the payload to
//! every live subscriber; a subscriber that falls more than the channel
//! capacity behind loses the overwritten messages (at-most-once), and a
//! subscriber created after a publish never sees that payload.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default per-topic channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

struct BrokerInner {
    topics: DashMap<String, broadcast::Sender<Vec<u8>>>,
    capacity: usize,
}

/// Topic-addressed fanout hub. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

impl Broker {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                topics: DashMap::new(),
                capacity: channel_capacity.max(1),
            }),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        self.inner
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .clone()
    }

    /// Publish a payload to every live subscriber of `topic`.
    ///
    /// Fire-and-forget: returns the number of subscribers the payload
    /// was handed to, which is zero when nobody is listening.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> usize {
        let sender = self.sender(topic);
        match sender.send(payload) {
            Ok(receivers) => receivers,
            // No live subscribers: the message is simply lost.
            Err(_) => 0,
        }
    }

    /// Register a new subscriber for `topic`.
    ///
    /// Only payloads published after this call are delivered.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let rx = self.sender(topic).subscribe();
        debug!(topic, "Subscriber registered");
        Subscription {
            topic: topic.to_string(),
            rx,
        }
    }

    /// Number of live subscribers for a topic.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl crate::Publisher for Broker {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), crate::BusError> {
        Broker::publish(self, topic, payload);
        Ok(())
    }
}

/// A live subscription to one topic.
pub struct Subscription {
    topic: String,
    rx: broadcast::Receiver<Vec<u8>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Receive the next payload in publish order.
    ///
    /// Returns `None` once the topic channel is closed. If this
    /// subscriber lagged behind the channel capacity, the lost messages
    /// are skipped and reception continues with the oldest retained one.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(topic = %self.topic, missed, "Subscriber lagged; messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive, for callers that poll.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.try_recv() {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(topic = %self.topic, missed, "Subscriber lagged; messages dropped");
                }
                Err(_) => return None,
            }
        }
    }
}

/// Run `callback` once per delivered payload on a dedicated task, so
/// delivery never blocks the host's main execution context.
pub fn spawn_dispatch<F>(mut subscription: Subscription, mut callback: F) -> JoinHandle<()>
where
    F: FnMut(Vec<u8>) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(payload) = subscription.recv().await {
            callback(payload);
        }
        debug!(topic = %subscription.topic(), "Dispatch loop finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let broker = Broker::with_defaults();
        let mut a = broker.subscribe("t");
        let mut b = broker.subscribe("t");

        let delivered = broker.publish("t", b"hello".to_vec());
        assert_eq!(delivered, 2);
        assert_eq!(a.recv().await.unwrap(), b"hello");
        assert_eq!(b.recv().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_lost() {
        let broker = Broker::with_defaults();
        assert_eq!(broker.publish("t", b"nobody".to_vec()), 0);

        // A later subscriber never sees the earlier payload.
        let mut sub = broker.subscribe("t");
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_delivery_in_publish_order() {
        let broker = Broker::with_defaults();
        let mut sub = broker.subscribe("t");
        for i in 0u8..5 {
            broker.publish("t", vec![i]);
        }
        for i in 0u8..5 {
            assert_eq!(sub.recv().await.unwrap(), vec![i]);
        }
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let broker = Broker::with_defaults();
        let mut prices = broker.subscribe("prices");
        broker.publish("news", b"headline".to_vec());
        assert!(prices.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_drops_oldest() {
        let broker = Broker::new(2);
        let mut sub = broker.subscribe("t");
        for i in 0u8..5 {
            broker.publish("t", vec![i]);
        }
        // Capacity 2: only the newest two survive.
        assert_eq!(sub.recv().await.unwrap(), vec![3]);
        assert_eq!(sub.recv().await.unwrap(), vec![4]);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_spawn_dispatch_invokes_callback() {
        let broker = Broker::with_defaults();
        let sub = broker.subscribe("t");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_dispatch(sub, move |payload| {
            let _ = tx.send(payload);
        });

        broker.publish("t", b"x".to_vec());
        assert_eq!(rx.recv().await.unwrap(), b"x");
        handle.abort();
    }
}
