//! Secondary OCR ("textract") text extraction

use serde_json::Value;

use super::{PageShape, SecondaryShape};

/// Flatten secondary OCR into text
///
/// Shapes, in precedence order:
/// 1. string, returned verbatim
/// 2. sequence of pages
/// 3. mapping with `textract_results`, extracted recursively
/// 4. mapping with a `pages` sequence, or with a `text` string (verbatim)
///
/// Page and line text is trimmed and blank fragments are dropped before
/// joining with single spaces. Unrecognized input yields `""`.
pub fn extract_secondary_text(value: &Value) -> String {
    match SecondaryShape::classify(value) {
        SecondaryShape::Text(text) | SecondaryShape::TextMapping(text) => text.to_string(),
        SecondaryShape::Pages(pages) | SecondaryShape::PagesMapping(pages) => {
            let fragments = pages_fragments(pages);
            tracing::debug!(
                pages = pages.len(),
                segments = fragments.len(),
                "Extracted secondary OCR segments"
            );
            fragments.join(" ")
        }
        SecondaryShape::Nested(inner) => extract_secondary_text(inner),
        SecondaryShape::Empty => String::new(),
    }
}

fn pages_fragments(pages: &[Value]) -> Vec<&str> {
    let mut fragments = Vec::new();
    for page in pages {
        match PageShape::classify(page) {
            PageShape::ExtractedText { lines, .. } | PageShape::Lines { lines, .. } => {
                fragments.extend(lines.iter().filter_map(line_text));
            }
            PageShape::Text { text, .. } | PageShape::Bare(text) => {
                fragments.extend(non_blank(text));
            }
            PageShape::Unrecognized(_) | PageShape::Invalid => {}
        }
    }
    fragments
}

fn line_text(line: &Value) -> Option<&str> {
    line.get("text").and_then(Value::as_str).and_then(non_blank)
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_is_identity() {
        for s in ["", "  keeps padding  ", "x"] {
            assert_eq!(extract_secondary_text(&json!(s)), s);
        }
    }

    #[test]
    fn test_null_is_empty() {
        assert_eq!(extract_secondary_text(&Value::Null), "");
    }

    #[test]
    fn test_blank_lines_dropped_order_preserved() {
        let value = json!([
            {"extracted_text": {"extracted_lines": [{"text": "a"}, {"text": " "}, {"text": "b"}]}},
            {"extracted_text": {"extracted_lines": [{"text": " c "}]}}
        ]);
        assert_eq!(extract_secondary_text(&value), "a b c");
    }

    #[test]
    fn test_page_level_shapes() {
        let value = json!([
            {"extracted_lines": [{"text": "one"}, {"confidence": 0.9}]},
            {"text": "  two  "},
            "three",
            {"image": "ignored.png"},
            17
        ]);
        assert_eq!(extract_secondary_text(&value), "one two three");
    }

    #[test]
    fn test_first_matching_page_shape_wins() {
        let value = json!([{
            "extracted_text": {"extracted_lines": [{"text": "nested"}]},
            "extracted_lines": [{"text": "page-level"}],
            "text": "plain"
        }]);
        assert_eq!(extract_secondary_text(&value), "nested");
    }

    #[test]
    fn test_nested_textract_results_list() {
        let value = json!({"textract_results": [{"text": "inner"}]});
        assert_eq!(extract_secondary_text(&value), "inner");
    }

    #[test]
    fn test_nested_textract_results_pages() {
        let value = json!({
            "textract_results": {
                "pages": [
                    {"extracted_lines": [{"text": "p1"}]},
                    {"extracted_lines": [{"text": "p2"}, {"text": ""}]}
                ]
            }
        });
        assert_eq!(extract_secondary_text(&value), "p1 p2");
    }

    #[test]
    fn test_direct_pages_and_direct_text() {
        let pages = json!({"pages": [{"extracted_lines": [{"text": "x"}, {"text": "y"}]}]});
        assert_eq!(extract_secondary_text(&pages), "x y");

        let text = json!({"text": " verbatim "});
        assert_eq!(extract_secondary_text(&text), " verbatim ");
    }

    #[test]
    fn test_malformed_input_never_fails() {
        let value = json!({"textract_results": {"pages": "broken"}});
        assert_eq!(extract_secondary_text(&value), "");

        let value = json!([{"extracted_lines": [{"text": 3}, "loose", null]}]);
        assert_eq!(extract_secondary_text(&value), "");

        assert_eq!(extract_secondary_text(&json!({"unrelated": 1})), "");
    }
}
