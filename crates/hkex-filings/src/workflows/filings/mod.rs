mod browser;
pub mod calendar;
mod classifier;
pub mod domain;
mod normalizer;
mod parser;

pub use browser::{ChromePageSource, HtmlFilePageSource, PageSource, PageSourceError};
pub use domain::{Board, DocType, FilingRecord};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use domain::Candidate;

/// Counters describing how the page was reduced to the final items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionStats {
    pub raw_row_count: usize,
    pub parsed_record_count: usize,
    pub duplicate_count: usize,
    pub out_of_range_count: usize,
    pub doc_type_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct FilingBatch {
    pub target_date: NaiveDate,
    pub items: Vec<FilingRecord>,
    pub stats: ExtractionStats,
}

pub struct FilingImporter;

impl FilingImporter {
    pub fn fetch(
        source: &dyn PageSource,
        url: &str,
        target_date: NaiveDate,
    ) -> Result<FilingBatch, PageSourceError> {
        let html = source.fetch_html(url)?;
        Ok(Self::import(&html, url, target_date))
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        base_url: &str,
        target_date: NaiveDate,
    ) -> Result<FilingBatch, PageSourceError> {
        Self::fetch(&HtmlFilePageSource::new(path), base_url, target_date)
    }

    /// extract -> classify -> dedupe -> filter by date -> sort
    pub fn import(html: &str, base_url: &str, target_date: NaiveDate) -> FilingBatch {
        let candidates = parser::extract_candidates(html, base_url);
        let mut stats = ExtractionStats {
            raw_row_count: candidates.len(),
            ..ExtractionStats::default()
        };

        let records = classify_all(&candidates);
        let (records, duplicates) = dedupe(records);
        stats.parsed_record_count = records.len();
        stats.duplicate_count = duplicates;

        let (mut items, out_of_range): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|record| record.posting_date_hkt == target_date);
        stats.out_of_range_count = out_of_range.len();

        sort_records(&mut items);
        for item in &items {
            *stats
                .doc_type_distribution
                .entry(item.doc_type.label().to_string())
                .or_default() += 1;
        }

        info!(
            %target_date,
            raw_rows = stats.raw_row_count,
            parsed = stats.parsed_record_count,
            duplicates = stats.duplicate_count,
            kept = items.len(),
            "filings extracted"
        );

        FilingBatch {
            target_date,
            items,
            stats,
        }
    }
}

fn classify_all(candidates: &[Candidate]) -> Vec<FilingRecord> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let record = classifier::classify(candidate);
            if record.is_none() {
                debug!(text = %candidate.text, "discarded candidate");
            }
            record
        })
        .collect()
}

/// First occurrence wins; a record repeats when its applicant, type and
/// date, or its link, were already seen.
fn dedupe(records: Vec<FilingRecord>) -> (Vec<FilingRecord>, usize) {
    let mut seen_keys = HashSet::new();
    let mut seen_links = HashSet::new();
    let mut duplicates = 0;

    let unique = records
        .into_iter()
        .filter(|record| {
            let key = (
                normalizer::name_key(&record.applicant_name),
                record.doc_type,
                record.posting_date_hkt,
            );
            // Only kept records claim a key or link.
            if seen_keys.contains(&key) || seen_links.contains(&record.link) {
                duplicates += 1;
                return false;
            }
            seen_keys.insert(key);
            seen_links.insert(record.link.clone());
            true
        })
        .collect();

    (unique, duplicates)
}

fn sort_records(records: &mut [FilingRecord]) {
    records.sort_by(|a, b| {
        a.board
            .cmp(&b.board)
            .then_with(|| a.applicant_name.cmp(&b.applicant_name))
            .then_with(|| a.link.cmp(&b.link))
    });
}
