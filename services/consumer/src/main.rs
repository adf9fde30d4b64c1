use std::sync::Arc;

use anyhow::Context;
use bus::{BusClient, PRICE_TOPIC};
use consumer::config::ConsumerConfig;
use consumer::{IngestHandler, PriceLog, RollingHistoryStore};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting price consumer");

    let config = ConsumerConfig::from_env();

    // Unrecoverable startup conditions: log path and bus.
    let log = Arc::new(
        PriceLog::open(&config.log_path, &config.assets).with_context(|| {
            format!("cannot create log file at {}", config.log_path.display())
        })?,
    );
    let store = Arc::new(RollingHistoryStore::new(
        &config.assets,
        config.window_capacity,
    ));
    let handler = IngestHandler::new(config.assets.clone(), store.clone(), log);

    let client = BusClient::connect(&config.bus_url)
        .await
        .with_context(|| format!("cannot open the bus at {}", config.bus_url))?;
    let mut subscription = client.subscribe(PRICE_TOPIC)?;

    // Message-passing boundary between the bus callback and the
    // handler: deliveries queue here and the handler task drains them.
    let (delivery_tx, mut delivery_rx) = mpsc::channel::<Vec<u8>>(1024);
    let ingest_task = tokio::spawn(async move {
        while let Some(payload) = delivery_rx.recv().await {
            handler.handle(&payload);
        }
        handler.store().stats()
    });

    loop {
        tokio::select! {
            delivery = subscription.recv() => match delivery {
                Some(payload) => {
                    if delivery_tx.send(payload).await.is_err() {
                        break;
                    }
                }
                None => {
                    tracing::warn!("Bus connection closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received; draining in-flight deliveries");
                break;
            }
        }
    }

    // Close the queue and let the handler finish what it has.
    drop(delivery_tx);
    let stats = ingest_task.await?;
    tracing::info!(
        accepted = stats.accepted,
        duplicates = stats.duplicates,
        malformed = stats.malformed,
        append_failures = stats.append_failures,
        "Consumer stopped"
    );

    Ok(())
}
