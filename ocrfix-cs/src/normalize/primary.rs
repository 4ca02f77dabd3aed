//! Primary OCR text extraction

use serde_json::{Map, Value};

use super::PrimaryShape;

const LINE_BLOCK: &str = "LINE";

/// Flatten primary OCR into text
///
/// Strings are returned unchanged. Sequences contribute, in order, the
/// text of every `LINE` block, every untyped block and every bare string;
/// blocks typed as anything other than `LINE` are skipped. Fragments are
/// joined with single spaces. A mapping yields its `text` (or `Text`).
pub fn extract_primary_text(value: &Value) -> String {
    match PrimaryShape::classify(value) {
        PrimaryShape::Text(text) => text.to_string(),
        PrimaryShape::Blocks(blocks) => blocks
            .iter()
            .filter_map(block_text)
            .collect::<Vec<_>>()
            .join(" "),
        PrimaryShape::Mapping(map) => string_member(map, "text")
            .or_else(|| string_member(map, "Text"))
            .unwrap_or_default()
            .to_string(),
        PrimaryShape::Empty => String::new(),
    }
}

fn block_text(block: &Value) -> Option<&str> {
    match block {
        Value::String(text) => Some(text),
        Value::Object(map) => match map.get("BlockType") {
            Some(Value::String(kind)) if kind == LINE_BLOCK => {
                string_member(map, "Text").or_else(|| string_member(map, "text"))
            }
            Some(_) => None,
            None => string_member(map, "text").or_else(|| string_member(map, "Text")),
        },
        _ => None,
    }
}

fn string_member<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_is_identity() {
        for s in ["", "plain text", "  padded  ", "multi\nline"] {
            assert_eq!(extract_primary_text(&json!(s)), s);
        }
    }

    #[test]
    fn test_null_and_scalars_are_empty() {
        assert_eq!(extract_primary_text(&Value::Null), "");
        assert_eq!(extract_primary_text(&json!(12)), "");
        assert_eq!(extract_primary_text(&json!(true)), "");
    }

    #[test]
    fn test_line_blocks_gate_on_block_type() {
        let value = json!([
            {"BlockType": "LINE", "Text": "Hello"},
            {"BlockType": "WORD", "Text": "ignored"},
            {"text": "World"}
        ]);
        assert_eq!(extract_primary_text(&value), "Hello World");
    }

    #[test]
    fn test_mixed_sequence_preserves_order() {
        let value = json!([
            "first",
            {"Text": "second"},
            {"confidence": 0.4},
            42,
            null,
            {"BlockType": "LINE", "text": "third"},
            {"BlockType": "PAGE"}
        ]);
        assert_eq!(extract_primary_text(&value), "first second third");
    }

    #[test]
    fn test_non_string_text_is_skipped() {
        let value = json!([{"text": 5}, {"text": "kept"}]);
        assert_eq!(extract_primary_text(&value), "kept");
    }

    #[test]
    fn test_mapping_prefers_lowercase_text() {
        assert_eq!(extract_primary_text(&json!({"text": "a", "Text": "b"})), "a");
        assert_eq!(extract_primary_text(&json!({"Text": "b"})), "b");
        assert_eq!(extract_primary_text(&json!({"lines": ["x"]})), "");
    }

    #[test]
    fn test_empty_sequence_is_empty() {
        assert_eq!(extract_primary_text(&json!([])), "");
    }
}
