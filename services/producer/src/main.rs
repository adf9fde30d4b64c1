use anyhow::Context;
use bus::BusClient;
use producer::config::ProducerConfig;
use producer::{CoinGeckoSource, ProducerLoop};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting price producer");

    let config = ProducerConfig::from_env();

    // Failing to reach the bus is an unrecoverable startup condition.
    let client = BusClient::connect(&config.bus_url)
        .await
        .with_context(|| format!("cannot open the bus at {}", config.bus_url))?;

    let source = CoinGeckoSource::new(&config.api_base, config.fetch_timeout)
        .context("cannot build quote source")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let producer = ProducerLoop::new(source, client, config.assets.clone());
    producer.run(config.poll_interval, shutdown_rx).await;

    tracing::info!("Producer stopped");
    Ok(())
}
