//! Cleaning reports with per-page counters.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::content::PageRewrite;
use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// What happened on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageReport {
    /// 1-based page number
    pub page: u32,
    pub annotations_removed: usize,
    pub operators_removed: usize,
    pub streams_removed: usize,
    pub mixed_streams: usize,
    pub failed_streams: usize,

    /// Why content processing was skipped, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,

    /// Removal counts keyed by reason tag
    pub reasons: BTreeMap<String, usize>,
}

impl PageReport {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    /// Fold the counters of a page rewrite into this report.
    pub fn record(&mut self, rewrite: &PageRewrite) {
        self.operators_removed += rewrite.operators_removed;
        self.streams_removed += rewrite.streams_removed;
        self.mixed_streams += rewrite.mixed_streams;
        self.failed_streams += rewrite.failed_streams;
        for reason in &rewrite.reasons {
            *self.reasons.entry(reason.to_string()).or_insert(0) += 1;
        }
    }

    /// Mark content processing as skipped.
    pub fn skip(&mut self, reason: impl Into<String>) {
        self.skipped = Some(reason.into());
    }

    /// Header/footer elements removed: operators plus whole streams.
    pub fn elements_removed(&self) -> usize {
        self.operators_removed + self.streams_removed
    }
}

/// Document-wide sums of the page counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanTotals {
    pub annotations_removed: usize,
    pub operators_removed: usize,
    pub streams_removed: usize,
    pub mixed_streams: usize,
    pub failed_streams: usize,
    pub pages_skipped: usize,
}

impl CleanTotals {
    fn add(&mut self, page: &PageReport) {
        self.annotations_removed += page.annotations_removed;
        self.operators_removed += page.operators_removed;
        self.streams_removed += page.streams_removed;
        self.mixed_streams += page.mixed_streams;
        self.failed_streams += page.failed_streams;
        self.pages_skipped += usize::from(page.skipped.is_some());
    }
}

/// Result of cleaning one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    /// Number of pages processed
    pub pages: usize,

    /// Counters summed over all pages
    pub totals: CleanTotals,

    /// Where the cleaned file was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Input file size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,

    /// Output file size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_size: Option<u64>,

    pub page_reports: Vec<PageReport>,
}

impl CleanReport {
    /// Build a report from per-page reports.
    pub fn from_pages(page_reports: Vec<PageReport>) -> Self {
        let mut totals = CleanTotals::default();
        for page in &page_reports {
            totals.add(page);
        }
        Self {
            pages: page_reports.len(),
            totals,
            page_reports,
            ..Self::default()
        }
    }

    pub fn annotations_removed(&self) -> usize {
        self.totals.annotations_removed
    }

    /// Header/footer elements removed: operators plus whole streams.
    pub fn elements_removed(&self) -> usize {
        self.totals.operators_removed + self.totals.streams_removed
    }

    /// Size reduction in percent, when both sizes are known.
    pub fn size_reduction(&self) -> Option<f64> {
        match (self.original_size, self.cleaned_size) {
            (Some(original), Some(cleaned)) if original > 0 => {
                Some((original as f64 - cleaned as f64) / original as f64 * 100.0)
            }
            _ => None,
        }
    }

    /// One-line summary of what was removed.
    pub fn summary(&self) -> String {
        format!(
            "PDF cleaned successfully. Removed {} annotations and {} header/footer elements.",
            self.annotations_removed(),
            self.elements_removed()
        )
    }

    /// Serialize the report.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };

        result.map_err(|e| Error::Other(format!("JSON serialization error: {}", e)))
    }
}
