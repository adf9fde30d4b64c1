//! Producer configuration derived from environment variables.

use std::env;
use std::time::Duration;

use types::ids::AssetSet;

use crate::source::CoinGeckoSource;

#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Broker WebSocket endpoint.
    pub bus_url: String,
    /// Fixed poll interval (reference: 10s).
    pub poll_interval: Duration,
    /// Bounded timeout for each adapter call.
    pub fetch_timeout: Duration,
    /// Upstream API base URL.
    pub api_base: String,
    /// The configured asset universe.
    pub assets: AssetSet,
}

impl ProducerConfig {
    pub fn from_env() -> Self {
        let asset_list = env_str("PRICE_ASSETS", "bitcoin,ethereum,dogecoin,solana");
        let currency = env_str("PRICE_CURRENCY", "usd");
        Self {
            bus_url: env_str("PRICE_BUS_URL", "ws://127.0.0.1:7447/ws"),
            poll_interval: Duration::from_secs(env_parse("PRICE_POLL_INTERVAL_SECS", 10)),
            fetch_timeout: Duration::from_secs(env_parse("PRICE_FETCH_TIMEOUT_SECS", 5)),
            api_base: env_str("PRICE_API_BASE", CoinGeckoSource::DEFAULT_BASE_URL),
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
