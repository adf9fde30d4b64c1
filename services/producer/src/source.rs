//! Quote Source Adapter
//!
//! The upstream returns a mapping asset → price for a requested set of
//! assets; it may omit assets or fail outright. Both cases are handled
//! per poll iteration by the producer loop, never fatally.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use types::ids::{AssetId, AssetSet};
use types::numeric::Price;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("decode error: {0}")]
    Decode(String),
}

/// Capability: fetch the current price map for a set of asset IDs.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch current prices. Assets the upstream does not know are
    /// omitted from the result, not reported as zero.
    async fn fetch(&self, assets: &AssetSet) -> Result<BTreeMap<AssetId, Price>, SourceError>;
}

/// Reference upstream: the CoinGecko simple-price endpoint.
///
/// Response shape: `{"bitcoin": {"usd": 65000.0}, ...}`.
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com";

    /// Build a source with a bounded request timeout. No call in the
    /// poll loop may block indefinitely.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoSource {
    async fn fetch(&self, assets: &AssetSet) -> Result<BTreeMap<AssetId, Price>, SourceError> {
        let url = format!("{}/api/v3/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", assets.id_list()),
                ("vs_currencies", assets.currency().to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let quotes: BTreeMap<String, BTreeMap<String, Decimal>> = response.json().await?;

        let mut prices = BTreeMap::new();
        for asset in assets.assets() {
            if let Some(per_currency) = quotes.get(asset.as_str()) {
                if let Some(value) = per_currency.get(assets.currency()) {
                    let price =
                        Price::new(*value).map_err(|e| SourceError::Decode(e.to_string()))?;
                    prices.insert(asset.clone(), price);
                }
            }
        }

        debug!(
            requested = assets.len(),
            returned = prices.len(),
            "Fetched quotes"
        );
        Ok(prices)
    }
}
