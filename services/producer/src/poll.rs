//! Producer poll loop
//!
//! Unbounded loop with a fixed poll interval: fetch → policy → stamp →
//! publish. Adapter failures and degenerate readings skip the iteration
//! and never terminate the loop; there is no backoff and no retry limit.
//! A shutdown signal stops scheduling new iterations; the in-flight one
//! finishes first.

use std::time::Duration;

use bus::{Publisher, PRICE_TOPIC};
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use types::ids::AssetSet;
use types::sample::PriceSample;

use crate::policy::{self, Acceptance};
use crate::source::QuoteSource;

/// What one poll iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A sample was stamped and handed to the bus.
    Published,
    /// The adapter call failed; no publish this round.
    SkippedFetchError,
    /// The reading was fully zero/absent; no publish this round.
    SkippedDegenerate,
    /// The bus rejected the publish; no publish this round.
    SkippedPublishError,
}

/// The producer's polling/dedup/publish loop.
pub struct ProducerLoop<S, P> {
    source: S,
    publisher: P,
    assets: AssetSet,
    topic: &'static str,
    samples_published: u64,
    iterations_skipped: u64,
}

impl<S: QuoteSource, P: Publisher> ProducerLoop<S, P> {
    pub fn new(source: S, publisher: P, assets: AssetSet) -> Self {
        Self {
            source,
            publisher,
            assets,
            topic: PRICE_TOPIC,
            samples_published: 0,
            iterations_skipped: 0,
        }
    }

    /// Run one poll iteration.
    pub async fn tick(&mut self) -> TickOutcome {
        let prices = match self.source.fetch(&self.assets).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "Quote fetch failed; skipping iteration");
                self.iterations_skipped += 1;
                return TickOutcome::SkippedFetchError;
            }
        };

        if policy::evaluate(&prices, &self.assets) == Acceptance::Degenerate {
            debug!("Degenerate reading; skipping iteration");
            self.iterations_skipped += 1;
            return TickOutcome::SkippedDegenerate;
        }

        let sample = PriceSample::new(Utc::now(), prices);
        let payload = match sample.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode sample; skipping iteration");
                self.iterations_skipped += 1;
                return TickOutcome::SkippedPublishError;
            }
        };

        match self.publisher.publish(self.topic, payload) {
            Ok(()) => {
                info!(
                    timestamp = %sample.timestamp,
                    assets = sample.prices.len(),
                    "Published price sample"
                );
                self.samples_published += 1;
                TickOutcome::Published
            }
            Err(e) => {
                warn!(error = %e, "Bus publish failed; skipping iteration");
                self.iterations_skipped += 1;
                TickOutcome::SkippedPublishError
            }
        }
    }

    /// Run until the shutdown signal fires, polling every `interval`.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            assets = self.assets.len(),
            topic = self.topic,
            "Producer loop started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // The iteration runs to completion before shutdown
                    // is observed again.
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    info!("Shutdown signal received; stopping producer loop");
                    break;
                }
            }
        }

        info!(
            published = self.samples_published,
            skipped = self.iterations_skipped,
            "Producer loop stopped"
        );
    }

    /// Samples published since creation.
    pub fn samples_published(&self) -> u64 {
        self.samples_published
    }

    /// Iterations skipped (fetch errors, degenerate readings, publish
    /// failures) since creation.
    pub fn iterations_skipped(&self) -> u64 {
        self.iterations_skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use bus::Broker;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use types::ids::AssetId;
    use types::numeric::Price;

    /// Scripted source: pops one pre-programmed response per fetch.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<BTreeMap<AssetId, Price>, SourceError>>>,
    }

    impl ScriptedSource {
        fn new(
            responses: Vec<Result<BTreeMap<AssetId, Price>, SourceError>>,
        ) -> Self {
            Self {
                script: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for ScriptedSource {
        async fn fetch(
            &self,
            _assets: &AssetSet,
        ) -> Result<BTreeMap<AssetId, Price>, SourceError> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SourceError::Decode("script exhausted".into())))
        }
    }

    fn reading(entries: &[(&str, u64)]) -> BTreeMap<AssetId, Price> {
        entries
            .iter()
            .map(|(id, v)| (AssetId::new(*id), Price::from_u64(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_accepted_reading_is_published() {
        let broker = Broker::with_defaults();
        let mut sub = broker.subscribe(PRICE_TOPIC);
        let source = ScriptedSource::new(vec![Ok(reading(&[
            ("bitcoin", 65000),
            ("ethereum", 3200),
        ]))]);
        let mut producer = ProducerLoop::new(source, broker, AssetSet::default());

        assert_eq!(producer.tick().await, TickOutcome::Published);
        assert_eq!(producer.samples_published(), 1);

        let payload = sub.recv().await.unwrap();
        let sample = PriceSample::from_payload(&payload).unwrap();
        assert_eq!(
            sample.prices[&AssetId::new("bitcoin")],
            Price::from_u64(65000)
        );
    }

    #[tokio::test]
    async fn test_degenerate_reading_not_published() {
        let broker = Broker::with_defaults();
        let mut sub = broker.subscribe(PRICE_TOPIC);
        let source = ScriptedSource::new(vec![Ok(reading(&[
            ("bitcoin", 0),
            ("ethereum", 0),
            ("dogecoin", 0),
            ("solana", 0),
        ]))]);
        let mut producer = ProducerLoop::new(source, broker, AssetSet::default());

        assert_eq!(producer.tick().await, TickOutcome::SkippedDegenerate);
        assert!(sub.try_recv().is_none());
        assert_eq!(producer.iterations_skipped(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_skips_iteration() {
        let broker = Broker::with_defaults();
        let mut sub = broker.subscribe(PRICE_TOPIC);
        let source =
            ScriptedSource::new(vec![Err(SourceError::Decode("boom".into()))]);
        let mut producer = ProducerLoop::new(source, broker, AssetSet::default());

        assert_eq!(producer.tick().await, TickOutcome::SkippedFetchError);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_loop_survives_error_then_publishes() {
        let broker = Broker::with_defaults();
        let mut sub = broker.subscribe(PRICE_TOPIC);
        let source = ScriptedSource::new(vec![
            Err(SourceError::Decode("transient".into())),
            Ok(reading(&[("bitcoin", 64000)])),
        ]);
        let mut producer = ProducerLoop::new(source, broker, AssetSet::default());

        assert_eq!(producer.tick().await, TickOutcome::SkippedFetchError);
        assert_eq!(producer.tick().await, TickOutcome::Published);
        assert!(sub.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let broker = Broker::with_defaults();
        let source = ScriptedSource::new(vec![]);
        let producer = ProducerLoop::new(source, broker, AssetSet::default());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(producer.run(Duration::from_secs(60), rx));
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
