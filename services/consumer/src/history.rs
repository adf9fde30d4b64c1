//! Rolling History Store
//!
//! Per-asset bounded FIFO buffer of recent prices plus a latest-price
//! slot, owned by the consumer process and passed by reference to every
//! execution context that needs it. All access goes through one
//! `RwLock`: the ingest context writes, the UI/analysis context reads
//! and may resize concurrently.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info};
use types::ids::{AssetId, AssetSet};
use types::numeric::Price;

/// Default window capacity (data points per asset).
pub const DEFAULT_WINDOW_CAPACITY: usize = 20;

#[derive(Debug, Default)]
struct AssetHistory {
    window: VecDeque<Price>,
    latest: Option<Price>,
}

/// Accepted vs. dropped sample counts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub append_failures: u64,
}

struct Inner {
    histories: BTreeMap<AssetId, AssetHistory>,
    capacity: usize,
    stats: StoreStats,
}

/// Shared rolling-window state. Lifecycle = process lifetime:
/// initialized empty at startup, never explicitly torn down.
pub struct RollingHistoryStore {
    inner: RwLock<Inner>,
}

impl RollingHistoryStore {
    /// Create empty windows for every configured asset.
    pub fn new(assets: &AssetSet, capacity: usize) -> Self {
        let histories = assets
            .assets()
            .iter()
            .map(|asset| (asset.clone(), AssetHistory::default()))
            .collect();
        info!(
            assets = assets.len(),
            capacity, "RollingHistoryStore initialized"
        );
        Self {
            inner: RwLock::new(Inner {
                histories,
                capacity,
                stats: StoreStats::default(),
            }),
        }
    }

    /// Append a price to the asset's window, evicting the oldest entry
    /// at capacity, and overwrite the latest-price slot.
    pub fn push(&self, asset: &AssetId, price: Price) {
        let mut inner = self.write();
        let capacity = inner.capacity;
        if let Some(history) = inner.histories.get_mut(asset) {
            history.window.push_back(price);
            while history.window.len() > capacity {
                history.window.pop_front();
            }
            history.latest = Some(price);
        } else {
            debug!(%asset, "Ignoring price for unconfigured asset");
        }
    }

    /// Most recently pushed price, independent of window capacity.
    pub fn latest(&self, asset: &AssetId) -> Option<Price> {
        self.read_lock()
            .histories
            .get(asset)
            .and_then(|h| h.latest)
    }

    /// The most recent `last_n` prices in chronological order (oldest
    /// first), or fewer if the window holds less.
    pub fn read(&self, asset: &AssetId, last_n: usize) -> Vec<Price> {
        let inner = self.read_lock();
        match inner.histories.get(asset) {
            Some(history) => {
                let start = history.window.len().saturating_sub(last_n);
                history.window.iter().skip(start).copied().collect()
            }
            None => Vec::new(),
        }
    }

    /// Number of buffered prices for the asset.
    pub fn len(&self, asset: &AssetId) -> usize {
        self.read_lock()
            .histories
            .get(asset)
            .map(|h| h.window.len())
            .unwrap_or(0)
    }

    /// Current window capacity.
    pub fn capacity(&self) -> usize {
        self.read_lock().capacity
    }

    /// Change the window capacity at runtime.
    ///
    /// Truncates every window to its most recent `new_capacity` entries
    /// in original relative order; never invents data. Latest-price
    /// slots are unaffected.
    pub fn resize(&self, new_capacity: usize) {
        let mut inner = self.write();
        for history in inner.histories.values_mut() {
            while history.window.len() > new_capacity {
                history.window.pop_front();
            }
        }
        info!(
            old_capacity = inner.capacity,
            new_capacity, "Rolling windows resized"
        );
        inner.capacity = new_capacity;
    }

    /// Diagnostics snapshot.
    pub fn stats(&self) -> StoreStats {
        self.read_lock().stats
    }

    pub(crate) fn record_accepted(&self) {
        self.write().stats.accepted += 1;
    }

    pub(crate) fn record_duplicate(&self) {
        self.write().stats.duplicates += 1;
    }

    pub(crate) fn record_malformed(&self) {
        self.write().stats.malformed += 1;
    }

    pub(crate) fn record_append_failure(&self) {
        self.write().stats.append_failures += 1;
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
