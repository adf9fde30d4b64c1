//! Consumer configuration derived from environment variables.

use std::env;
use std::path::PathBuf;

use types::ids::AssetSet;

use crate::history::DEFAULT_WINDOW_CAPACITY;

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Broker WebSocket endpoint.
    pub bus_url: String,
    /// Durable log file path.
    pub log_path: PathBuf,
    /// Initial rolling-window capacity per asset.
    pub window_capacity: usize,
    /// The configured asset universe. Must match the producer's.
    pub assets: AssetSet,
}

impl ConsumerConfig {
    pub fn from_env() -> Self {
        let asset_list = env_str("PRICE_ASSETS", "bitcoin,ethereum,dogecoin,solana");
        let currency = env_str("PRICE_CURRENCY", "usd");
        Self {
            bus_url: env_str("PRICE_BUS_URL", "ws://127.0.0.1:7447/ws"),
            log_path: PathBuf::from(env_str("PRICE_LOG_PATH", "crypto_prices.csv")),
            window_capacity: env_parse("PRICE_WINDOW_CAPACITY", DEFAULT_WINDOW_CAPACITY),
            assets: AssetSet::parse(&asset_list, &currency),
        }
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
