use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::workflows::filings::{ExtractionStats, FilingBatch, FilingRecord};

pub const DEFAULT_SOURCE: &str = "HKEX AP/PHIP";

/// Document persisted to `latest.json` and the dated archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestPayload {
    pub generated_at_hkt: DateTime<FixedOffset>,
    pub target_date_hkt: NaiveDate,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Vec<FilingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<ExtractionStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DigestPayload {
    pub fn build(batch: FilingBatch, generated_at: DateTime<FixedOffset>, source: &str) -> Self {
        let FilingBatch {
            target_date,
            items,
            stats,
        } = batch;

        // An empty page usually means the layout changed, not a quiet day.
        let message = (stats.raw_row_count == 0).then(|| {
            "listing page yielded no candidate rows; the page layout may have changed".to_string()
        });

        Self {
            generated_at_hkt: generated_at,
            target_date_hkt: target_date,
            source: source.to_string(),
            count: items.len(),
            items,
            debug: Some(stats),
            message,
        }
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
