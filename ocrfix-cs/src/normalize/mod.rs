//! OCR payload normalization
//!
//! Upstream producers disagree on shape: plain strings, lists of blocks,
//! lists of pages, mappings wrapping `textract_results` or `pages`, single
//! mappings with a `text` member. Each accepted shape is a variant of a
//! closed enum below; extraction and statistics `match` on those variants
//! so the accepted shapes and their precedence are explicit.
//!
//! Nothing in this module fails. Unrecognized input produces empty text
//! or zero-valued statistics.

mod primary;
mod secondary;
mod stats;

pub use primary::extract_primary_text;
pub use secondary::extract_secondary_text;
pub use stats::{compute_statistics, ExtractionStats, PageStats};

use serde_json::{Map, Value};

/// Shapes accepted for primary OCR
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryShape<'a> {
    /// Already flat text
    Text(&'a str),
    /// Sequence of blocks (`{BlockType, Text}` / `{text}`) or strings
    Blocks(&'a [Value]),
    /// Single mapping carrying `text` or `Text`
    Mapping(&'a Map<String, Value>),
    /// Null, numbers, booleans
    Empty,
}

impl<'a> PrimaryShape<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => PrimaryShape::Text(s),
            Value::Array(blocks) => PrimaryShape::Blocks(blocks),
            Value::Object(map) => PrimaryShape::Mapping(map),
            _ => PrimaryShape::Empty,
        }
    }
}

/// Shapes accepted for secondary OCR, in precedence order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecondaryShape<'a> {
    /// Already flat text
    Text(&'a str),
    /// Sequence of page mappings (or strings)
    Pages(&'a [Value]),
    /// Mapping wrapping the real payload under `textract_results`
    Nested(&'a Value),
    /// Mapping with a direct `pages` sequence
    PagesMapping(&'a [Value]),
    /// Mapping with a direct `text` string
    TextMapping(&'a str),
    /// Anything else
    Empty,
}

impl<'a> SecondaryShape<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => SecondaryShape::Text(s),
            Value::Array(pages) => SecondaryShape::Pages(pages),
            Value::Object(map) => {
                if let Some(nested) = map.get("textract_results") {
                    return SecondaryShape::Nested(nested);
                }
                if let Some(Value::Array(pages)) = map.get("pages") {
                    return SecondaryShape::PagesMapping(pages);
                }
                match map.get("text") {
                    Some(Value::String(text)) => SecondaryShape::TextMapping(text),
                    _ => SecondaryShape::Empty,
                }
            }
            _ => SecondaryShape::Empty,
        }
    }
}

/// Shapes accepted for a single page; the first matching shape wins
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageShape<'a> {
    /// `extracted_text` mapping; `lines` is empty when it carries no
    /// `extracted_lines` and nothing else on the page matched
    ExtractedText {
        page: &'a Map<String, Value>,
        meta: &'a Map<String, Value>,
        lines: &'a [Value],
    },
    /// Page-level `extracted_lines`
    Lines {
        page: &'a Map<String, Value>,
        lines: &'a [Value],
    },
    /// Page-level `text`
    Text {
        page: &'a Map<String, Value>,
        text: &'a str,
    },
    /// The page itself is a string
    Bare(&'a str),
    /// A mapping none of the above matched
    Unrecognized(&'a Map<String, Value>),
    /// Not a mapping or string
    Invalid,
}

impl<'a> PageShape<'a> {
    pub fn classify(value: &'a Value) -> Self {
        let page = match value {
            Value::Object(page) => page,
            Value::String(s) => return PageShape::Bare(s),
            _ => return PageShape::Invalid,
        };

        let extracted = match page.get("extracted_text") {
            Some(Value::Object(meta)) => Some(meta),
            _ => None,
        };

        if let Some(meta) = extracted {
            if let Some(Value::Array(lines)) = meta.get("extracted_lines") {
                return PageShape::ExtractedText { page, meta, lines };
            }
        }
        if let Some(Value::Array(lines)) = page.get("extracted_lines") {
            return PageShape::Lines { page, lines };
        }
        if let Some(Value::String(text)) = page.get("text") {
            return PageShape::Text { page, text };
        }
        match extracted {
            Some(meta) => PageShape::ExtractedText {
                page,
                meta,
                lines: &[],
            },
            None => PageShape::Unrecognized(page),
        }
    }
}

/// Truthiness used for payload checks: null, `false`, `0`, and empty strings,
/// sequences and mappings are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// JSON type label used in logs and diagnostics
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Length of strings (chars), sequences and mappings; 0 otherwise
pub fn json_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

/// First `max_chars` characters of `text`
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
