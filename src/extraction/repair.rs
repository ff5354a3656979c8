//! Repair of malformed model output into JSON.
//!
//! Chat models frequently wrap JSON in Markdown fences or surround it with
//! prose. Four strategies run in order, stopping at the first success:
//!
//! 1. strip code-fence markers and parse
//! 2. parse the first balanced `[...]` array span
//! 3. parse the first balanced `{...}` object span
//! 4. parse the cleaned string directly
//!
//! All four failing is a distinct condition from an incomplete extraction and
//! is mapped to [`Error::UnparseableOutput`] by the caller-facing helper.

use crate::errors::Error;
use serde_json::Value;

/// Attempt to recover a JSON value from raw model output.
pub fn extract_json(raw: &str) -> Result<Value, Error> {
    let cleaned = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim()) {
        return Ok(value);
    }
    if let Some(value) = parse_balanced_span(&cleaned, '[', ']') {
        return Ok(value);
    }
    if let Some(value) = parse_balanced_span(&cleaned, '{', '}') {
        return Ok(value);
    }
    // Last resort: the cleaned string with surrounding noise characters removed
    let trimmed = cleaned.trim_matches(|c: char| c.is_whitespace() || c == '`');
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    Err(Error::UnparseableOutput)
}

/// Remove leading/trailing Markdown fences, with or without a language tag.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag line ("json", "JSON", ...) if present
    let body = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

/// Find the first balanced `open..close` span and try to parse it. Bracket
/// counting ignores brackets inside string literals.
fn parse_balanced_span(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let span = &text[start..start + offset + c.len_utf8()];
                    return serde_json::from_str::<Value>(span).ok();
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_json_parses_directly() {
        let value = extract_json(r#"[{"symbol": "BTCUSDT"}]"#).unwrap();
        assert_eq!(value, json!([{"symbol": "BTCUSDT"}]));
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let raw = "```json\n[{\"symbol\": \"ETHUSDT\"}]\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!([{"symbol": "ETHUSDT"}]));
    }

    #[test]
    fn test_fenced_without_language_tag() {
        let raw = "```\n{\"trades\": []}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!({"trades": []}));
    }

    #[test]
    fn test_array_embedded_in_prose() {
        let raw = "Here are the trades I found:\n[{\"symbol\": \"SOLUSDT\"}]\nLet me know if you need more.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value, json!([{"symbol": "SOLUSDT"}]));
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let raw = "Sure! {\"trades\": [{\"symbol\": \"BTCUSDT\"}]} Done.";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["trades"][0]["symbol"], "BTCUSDT");
    }

    #[test]
    fn test_brackets_inside_strings_ignored() {
        let raw = r#"noise [{"notes": "stop ] was hit", "symbol": "XRPUSDT"}] noise"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value[0]["symbol"], "XRPUSDT");
    }

    #[test]
    fn test_unparseable_output_is_distinct_error() {
        let err = extract_json("the screenshot shows three trades").unwrap_err();
        assert!(matches!(err, Error::UnparseableOutput));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(extract_json(""), Err(Error::UnparseableOutput)));
    }
}
