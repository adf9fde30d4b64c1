//! Asset identifier types and the configured asset universe
//!
//! The pipeline tracks a fixed, configured set of assets. Adding an
//! asset is a configuration change, not a schema change: the durable
//! log header and the per-asset rolling windows are all derived from
//! the `AssetSet` at startup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a tracked instrument (e.g., "bitcoin").
///
/// Identifiers are lowercase upstream listing IDs, not ticker symbols.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new AssetId, normalizing to lowercase.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_lowercase())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The fixed, ordered asset universe plus the quote currency.
///
/// Order is significant: it fixes the durable log column order for the
/// lifetime of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSet {
    assets: Vec<AssetId>,
    currency: String,
}

impl AssetSet {
    /// Create an asset set, dropping duplicate IDs while preserving
    /// first-seen order.
    pub fn new(assets: Vec<AssetId>, currency: impl Into<String>) -> Self {
        let mut seen = Vec::with_capacity(assets.len());
        for asset in assets {
            if !seen.contains(&asset) {
                seen.push(asset);
            }
        }
        Self {
            assets: seen,
            currency: currency.into().trim().to_lowercase(),
        }
    }

    /// Parse a comma-separated asset list (e.g. from configuration).
    pub fn parse(list: &str, currency: &str) -> Self {
        let assets = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(AssetId::new)
            .collect();
        Self::new(assets, currency)
    }

    /// Configured assets in fixed order.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Quote currency (e.g. "usd").
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Number of configured assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Whether the given asset is part of the universe.
    pub fn contains(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }

    /// Durable log column names: `<asset>_<currency>` in fixed order.
    pub fn column_names(&self) -> Vec<String> {
        self.assets
            .iter()
            .map(|a| format!("{}_{}", a, self.currency))
            .collect()
    }

    /// Comma-joined ID list for upstream query strings.
    pub fn id_list(&self) -> String {
        self.assets
            .iter()
            .map(AssetId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for AssetSet {
    /// The reference deployment: four assets quoted in USD.
    fn default() -> Self {
        Self::new(
            vec![
                AssetId::new("bitcoin"),
                AssetId::new("ethereum"),
                AssetId::new("dogecoin"),
                AssetId::new("solana"),
            ],
            "usd",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_normalization() {
        assert_eq!(AssetId::new(" Bitcoin ").as_str(), "bitcoin");
        assert_eq!(AssetId::new("ETHEREUM"), AssetId::new("ethereum"));
    }

    #[test]
    fn test_default_universe_order() {
        let set = AssetSet::default();
        assert_eq!(set.len(), 4);
        assert_eq!(set.assets()[0], AssetId::new("bitcoin"));
        assert_eq!(set.assets()[3], AssetId::new("solana"));
        assert_eq!(set.currency(), "usd");
    }

    #[test]
    fn test_column_names() {
        let set = AssetSet::default();
        assert_eq!(
            set.column_names(),
            vec![
                "bitcoin_usd",
                "ethereum_usd",
                "dogecoin_usd",
                "solana_usd"
            ]
        );
    }

    #[test]
    fn test_parse_drops_duplicates_and_blanks() {
        let set = AssetSet::parse("bitcoin, ethereum,,bitcoin", "USD");
        assert_eq!(set.len(), 2);
        assert_eq!(set.currency(), "usd");
        assert_eq!(set.id_list(), "bitcoin,ethereum");
    }

    #[test]
    fn test_serde_roundtrip() {
        let set = AssetSet::default();
        let json = serde_json::to_string(&set).unwrap();
        let back: AssetSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }
}
