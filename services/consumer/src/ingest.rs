//! Consumer Ingest Handler
//!
//! Invoked once per delivered payload. Validates, builds the candidate
//! durable row in fixed asset order, drops immediate duplicates
//! (byte-identical bus redeliveries), and otherwise applies the
//! in-memory updates followed by the durable append.
//!
//! The dedup baseline is the last *successfully appended* row, so a row
//! whose append failed is retried if the same reading is delivered
//! again. A failed append does not roll back the in-memory updates;
//! until the next successful append, memory and the durable log may
//! diverge. That window is accepted by design of the pipeline's error
//! taxonomy, not silently repaired.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, warn};
use types::ids::AssetSet;
use types::sample::{DurableRow, PriceSample};

use crate::history::RollingHistoryStore;
use crate::log::PriceLog;

/// What the handler did with one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// In-memory state updated; durable append attempted.
    Accepted,
    /// Field-for-field identical to the last appended row; dropped
    /// silently with no state mutation.
    Duplicate,
    /// Failed structural validation; dropped and logged.
    Malformed,
}

/// The bus delivery callback target.
pub struct IngestHandler {
    assets: AssetSet,
    store: Arc<RollingHistoryStore>,
    log: Arc<PriceLog>,
    /// Last successfully appended row. The mutex also serializes the
    /// dedup-update-append sequence across delivery contexts.
    last_row: Mutex<Option<DurableRow>>,
}

impl IngestHandler {
    pub fn new(assets: AssetSet, store: Arc<RollingHistoryStore>, log: Arc<PriceLog>) -> Self {
        Self {
            assets,
            store,
            log,
            last_row: Mutex::new(None),
        }
    }

    /// Process one delivered payload.
    pub fn handle(&self, payload: &[u8]) -> IngestOutcome {
        let sample = match PriceSample::from_payload(payload) {
            Ok(sample) => sample,
            Err(e) => {
                warn!(error = %e, "Dropping malformed payload");
                self.store.record_malformed();
                return IngestOutcome::Malformed;
            }
        };

        let row = DurableRow::from_sample(&sample, &self.assets);

        let mut last_row = self.last_row.lock().unwrap_or_else(PoisonError::into_inner);

        if last_row.as_ref() == Some(&row) {
            debug!(timestamp = %row.timestamp, "Dropping immediate duplicate");
            self.store.record_duplicate();
            return IngestOutcome::Duplicate;
        }

        for (asset, cell) in self.assets.assets().iter().zip(&row.cells) {
            if let Some(price) = cell {
                self.store.push(asset, *price);
            }
        }
        self.store.record_accepted();

        match self.log.append(&row) {
            Ok(()) => {
                debug!(timestamp = %row.timestamp, "Row appended");
                *last_row = Some(row);
            }
            Err(e) => {
                error!(error = %e, "Durable append failed; in-memory state kept");
                self.store.record_append_failure();
            }
        }

        IngestOutcome::Accepted
    }

    /// The shared rolling history (read surface for other contexts).
    pub fn store(&self) -> &Arc<RollingHistoryStore> {
        &self.store
    }
}
