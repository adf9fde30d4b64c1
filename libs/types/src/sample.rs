//! Published samples and durable rows
//!
//! A `PriceSample` is the bus payload: one timestamped reading of the
//! asset universe, immutable once published. A `DurableRow` is the same
//! reading projected onto the fixed column order of the durable log,
//! with absent assets carried as an explicit `NA` marker rather than
//! omitted. Full-field row equality drives duplicate suppression.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::FeedError;
use crate::ids::{AssetId, AssetSet};
use crate::numeric::Price;

/// Literal marker written to the durable log for absent values.
pub const NA_MARKER: &str = "NA";

/// One timestamped reading of the asset universe.
///
/// Field names are stable across versions: `timestamp` (RFC 3339) and
/// `prices` (asset → price map). Assets the upstream omitted are absent
/// from the map, never present-as-null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Wall-clock capture time, UTC, round-trippable.
    pub timestamp: DateTime<Utc>,
    /// Prices for the assets the upstream reported this round.
    pub prices: BTreeMap<AssetId, Price>,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, prices: BTreeMap<AssetId, Price>) -> Self {
        Self { timestamp, prices }
    }

    /// Whether at least one asset has a present, non-zero price.
    ///
    /// The producer only publishes samples for which this holds.
    pub fn has_usable_price(&self) -> bool {
        self.prices.values().any(|p| !p.is_zero())
    }

    /// Serialize to the compact self-describing bus payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, FeedError> {
        serde_json::to_vec(self).map_err(|e| FeedError::Encode(e.to_string()))
    }

    /// Decode a bus payload, validating structure.
    ///
    /// Missing timestamp, missing price map, non-JSON bytes, and
    /// negative prices all surface as `MalformedPayload`.
    pub fn from_payload(payload: &[u8]) -> Result<Self, FeedError> {
        serde_json::from_slice(payload).map_err(|e| FeedError::MalformedPayload(e.to_string()))
    }
}

/// One row of the durable log: timestamp plus one cell per configured
/// asset, in the fixed column order. Written once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DurableRow {
    pub timestamp: DateTime<Utc>,
    /// One entry per configured asset; `None` renders as `NA`.
    pub cells: Vec<Option<Price>>,
}

impl DurableRow {
    /// Project a sample onto the fixed asset order.
    ///
    /// Prices for assets outside the configured universe are ignored.
    pub fn from_sample(sample: &PriceSample, assets: &AssetSet) -> Self {
        let cells = assets
            .assets()
            .iter()
            .map(|asset| sample.prices.get(asset).copied())
            .collect();
        Self {
            timestamp: sample.timestamp,
            cells,
        }
    }

    /// The header line written once when the log file is created.
    pub fn csv_header(assets: &AssetSet) -> String {
        let mut columns = vec!["timestamp".to_string()];
        columns.extend(assets.column_names());
        columns.join(",")
    }

    /// Render the row as one CSV line (no trailing newline).
    ///
    /// The timestamp keeps its sub-second precision so two distinct
    /// rows never render as identical lines.
    pub fn to_csv_line(&self) -> String {
        let mut fields = Vec::with_capacity(1 + self.cells.len());
        fields.push(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        for cell in &self.cells {
            fields.push(match cell {
                Some(price) => price.to_string(),
                None => NA_MARKER.to_string(),
            });
        }
        fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn sample_with(prices: &[(&str, u64)]) -> PriceSample {
        let map = prices
            .iter()
            .map(|(id, v)| (AssetId::new(*id), Price::from_u64(*v)))
            .collect();
        PriceSample::new(t1(), map)
    }

    #[test]
    fn test_payload_roundtrip() {
        let sample = sample_with(&[("bitcoin", 65000), ("ethereum", 3200)]);
        let payload = sample.to_payload().unwrap();
        let back = PriceSample::from_payload(&payload).unwrap();
        assert_eq!(sample, back);
    }

    #[test]
    fn test_payload_field_names_stable() {
        let sample = sample_with(&[("bitcoin", 65000)]);
        let json = String::from_utf8(sample.to_payload().unwrap()).unwrap();
        assert!(json.contains("\"timestamp\""));
        assert!(json.contains("\"prices\""));
        assert!(json.contains("\"bitcoin\""));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        assert!(PriceSample::from_payload(b"not json").is_err());
        // missing price map
        assert!(PriceSample::from_payload(br#"{"timestamp":"2024-05-01T12:00:00Z"}"#).is_err());
        // missing timestamp
        assert!(PriceSample::from_payload(br#"{"prices":{"bitcoin":1}}"#).is_err());
        // negative price
        assert!(PriceSample::from_payload(
            br#"{"timestamp":"2024-05-01T12:00:00Z","prices":{"bitcoin":-5}}"#
        )
        .is_err());
    }

    #[test]
    fn test_usable_price() {
        assert!(sample_with(&[("bitcoin", 65000), ("ethereum", 0)]).has_usable_price());
        assert!(!sample_with(&[("bitcoin", 0), ("ethereum", 0)]).has_usable_price());
        assert!(!sample_with(&[]).has_usable_price());
    }

    #[test]
    fn test_row_projection_fixed_order() {
        let assets = AssetSet::default();
        // ethereum reported first; projection must still follow the universe order
        let sample = sample_with(&[("ethereum", 3200), ("bitcoin", 65000)]);
        let row = DurableRow::from_sample(&sample, &assets);

        assert_eq!(row.cells.len(), 4);
        assert_eq!(row.cells[0], Some(Price::from_u64(65000))); // bitcoin
        assert_eq!(row.cells[1], Some(Price::from_u64(3200))); // ethereum
        assert_eq!(row.cells[2], None); // dogecoin
        assert_eq!(row.cells[3], None); // solana
    }

    #[test]
    fn test_row_ignores_unknown_assets() {
        let assets = AssetSet::default();
        let sample = sample_with(&[("bitcoin", 65000), ("litecoin", 80)]);
        let row = DurableRow::from_sample(&sample, &assets);
        assert_eq!(row.cells.iter().flatten().count(), 1);
    }

    #[test]
    fn test_csv_rendering() {
        let assets = AssetSet::default();
        assert_eq!(
            DurableRow::csv_header(&assets),
            "timestamp,bitcoin_usd,ethereum_usd,dogecoin_usd,solana_usd"
        );

        let sample = sample_with(&[("bitcoin", 65000), ("ethereum", 3200)]);
        let row = DurableRow::from_sample(&sample, &assets);
        assert_eq!(
            row.to_csv_line(),
            "2024-05-01T12:00:00Z,65000,3200,NA,NA"
        );
    }

    #[test]
    fn test_csv_line_keeps_subsecond_precision() {
        let assets = AssetSet::default();
        let a = DurableRow::from_sample(&sample_with(&[("bitcoin", 65000)]), &assets);
        let mut b = a.clone();
        b.timestamp = b.timestamp + chrono::Duration::milliseconds(250);

        // Distinct rows within the same second stay distinct on disk.
        assert_ne!(a, b);
        assert_ne!(a.to_csv_line(), b.to_csv_line());
        assert!(b.to_csv_line().starts_with("2024-05-01T12:00:00.250Z"));
    }

    #[test]
    fn test_row_equality_includes_timestamp() {
        let assets = AssetSet::default();
        let a = DurableRow::from_sample(&sample_with(&[("bitcoin", 65000)]), &assets);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.timestamp = b.timestamp + chrono::Duration::seconds(10);
        assert_ne!(a, b);
    }
}
