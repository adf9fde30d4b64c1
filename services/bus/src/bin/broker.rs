use bus::server::{serve, BrokerConfig};
use bus::Broker;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting bus broker");

    let config = BrokerConfig::from_env();
    let broker = Broker::new(config.channel_capacity);
    let addr = config.addr()?;

    serve(broker, addr).await?;

    Ok(())
}
