//! Sample acceptance policy
//!
//! A reading where every configured asset is zero or absent carries no
//! information and is treated as "no data", not as a valid zero-price
//! observation. Partial-zero readings are acceptable: only the fully
//! degenerate case is rejected.

use std::collections::BTreeMap;

use types::ids::{AssetId, AssetSet};
use types::numeric::Price;

/// Verdict on one polled reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// At least one configured asset has a present, non-zero price.
    Accepted,
    /// Every configured asset is zero or absent; skip the iteration.
    Degenerate,
}

/// Evaluate a polled price map against the configured universe.
///
/// Prices for assets outside the universe do not count toward
/// acceptance.
pub fn evaluate(prices: &BTreeMap<AssetId, Price>, assets: &AssetSet) -> Acceptance {
    let usable = assets
        .assets()
        .iter()
        .any(|asset| prices.get(asset).map_or(false, |p| !p.is_zero()));

    if usable {
        Acceptance::Accepted
    } else {
        Acceptance::Degenerate
    }
}
