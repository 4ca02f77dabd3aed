//! Secondary OCR statistics (diagnostics only, never persisted)

use serde::Serialize;
use serde_json::{Map, Value};

use super::{PageShape, SecondaryShape};

/// Per-page counts and confidences
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageStats {
    pub page_number: Option<u64>,
    pub line_count: u64,
    pub block_count: u64,
    pub confidence_scores: Vec<f64>,
    /// Page-level `confidence_score` as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    /// Page-level `average_confidence` as reported upstream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,
}

/// Aggregate statistics over all pages
///
/// `average_confidence`, `min_confidence` and `max_confidence` are present
/// exactly when `confidence_scores` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub total_pages: u64,
    pub total_lines: u64,
    pub total_blocks: u64,
    pub confidence_scores: Vec<f64>,
    pub page_details: Vec<PageStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_confidence: Option<f64>,
}

impl ExtractionStats {
    /// Reported totals come from upstream and may be absurd; sums saturate
    fn add_page(&mut self, page: PageStats) {
        self.total_lines = self.total_lines.saturating_add(page.line_count);
        self.total_blocks = self.total_blocks.saturating_add(page.block_count);
        self.confidence_scores
            .extend(page.confidence_scores.iter().copied());
        self.page_details.push(page);
    }

    fn finish(mut self) -> Self {
        if !self.confidence_scores.is_empty() {
            let count = self.confidence_scores.len() as f64;
            let sum: f64 = self.confidence_scores.iter().sum();
            self.average_confidence = Some(sum / count);
            self.min_confidence = Some(
                self.confidence_scores
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min),
            );
            self.max_confidence = Some(
                self.confidence_scores
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max),
            );
        }
        self
    }
}

/// Compute statistics over secondary OCR
///
/// Follows the same shape precedence as
/// [`extract_secondary_text`](super::extract_secondary_text). Strings, text
/// mappings and malformed input produce zero-valued statistics.
pub fn compute_statistics(value: &Value) -> ExtractionStats {
    match SecondaryShape::classify(value) {
        SecondaryShape::Pages(pages) | SecondaryShape::PagesMapping(pages) => {
            let mut stats = ExtractionStats {
                total_pages: pages.len() as u64,
                ..Default::default()
            };
            for page in pages.iter().filter_map(page_stats) {
                stats.add_page(page);
            }
            stats.finish()
        }
        SecondaryShape::Nested(inner) => compute_statistics(inner),
        SecondaryShape::Text(_) | SecondaryShape::TextMapping(_) | SecondaryShape::Empty => {
            ExtractionStats::default()
        }
    }
}

/// Statistics for one page, or `None` when the page carries nothing countable
fn page_stats(page: &Value) -> Option<PageStats> {
    match PageShape::classify(page) {
        PageShape::ExtractedText { page, meta, lines } => Some(PageStats {
            line_count: u64_member(meta, "total_lines").unwrap_or(lines.len() as u64),
            block_count: u64_member(meta, "total_blocks").unwrap_or(0),
            s3_key: string_member(meta, "s3_key"),
            job_id: string_member(meta, "job_id"),
            ..page_base(page, lines)
        }),
        PageShape::Lines { page, lines } => Some(PageStats {
            line_count: u64_member(page, "total_lines").unwrap_or(lines.len() as u64),
            block_count: u64_member(page, "total_blocks").unwrap_or(0),
            ..page_base(page, lines)
        }),
        PageShape::Text { page, .. } | PageShape::Unrecognized(page) => {
            let line_count = u64_member(page, "total_lines")?;
            Some(PageStats {
                line_count,
                block_count: u64_member(page, "total_blocks").unwrap_or(0),
                ..page_base(page, &[])
            })
        }
        PageShape::Bare(_) | PageShape::Invalid => None,
    }
}

fn page_base(page: &Map<String, Value>, lines: &[Value]) -> PageStats {
    PageStats {
        page_number: u64_member(page, "page_number"),
        confidence_scores: lines
            .iter()
            .filter_map(|line| line.get("confidence").and_then(Value::as_f64))
            .collect(),
        confidence_score: page.get("confidence_score").and_then(Value::as_f64),
        average_confidence: page.get("average_confidence").and_then(Value::as_f64),
        processing_status: string_member(page, "processing_status"),
        image_filename: string_member(page, "image_filename"),
        ..Default::default()
    }
}

/// Non-negative integer member; numeric strings are accepted
fn u64_member(map: &Map<String, Value>, key: &str) -> Option<u64> {
    match map.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_member(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}
