//! Locating a JSON object inside free text.
//!
//! Agents wrap their summary in markdown fences, surround it with prose, or
//! emit it as a JSON-encoded string. [`extract_json_block`] finds the span
//! that most likely holds the object; decoding and validation happen later.

use std::borrow::Cow;

use serde_json::Value;

use crate::error::SkipReason;

const FENCE: &str = "```";

/// Returns the substring believed to hold one top-level JSON object.
///
/// Rules, first match wins:
/// 1. fenced text: first `{` through last `}`;
/// 2. the trimmed text already starts with `{` and ends with `}`;
/// 3. the first balanced object starting at the first `{`.
///
/// Rule 3 ignores braces inside string literals.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let text = text.trim();

    if text.contains(FENCE) {
        if let Some(span) = outer_span(text) {
            return Some(span);
        }
    }

    if text.starts_with('{') && text.ends_with('}') {
        return Some(text);
    }

    first_balanced_object(text)
}

/// Decodes `text` as a JSON string literal, for payloads that were encoded
/// twice. Anything other than a string literal yields `None`.
pub fn decode_json_string(text: &str) -> Option<String> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::String(decoded)) => Some(decoded),
        _ => None,
    }
}

/// [`extract_json_block`], preceded by an unescape attempt when the text
/// carries literal `\n` or `\"` sequences.
pub fn extract_json_block_unescaped(text: &str) -> Option<Cow<'_, str>> {
    let trimmed = text.trim();
    if has_literal_escapes(trimmed) {
        if let Some(decoded) = decode_json_string(trimmed) {
            return extract_json_block(&decoded).map(|block| Cow::Owned(block.to_owned()));
        }
    }
    extract_json_block(trimmed).map(Cow::Borrowed)
}

pub fn decode_block(block: &str) -> Result<Value, SkipReason> {
    serde_json::from_str(block).map_err(|_| SkipReason::JsonParse)
}

fn has_literal_escapes(text: &str) -> bool {
    text.contains("\\n") || text.contains("\\\"")
}

fn outer_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
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

    #[test]
    fn fenced_block_with_language_tag() {
        let text = "```json\n{\"task_id\":\"t1\",\"status\":\"ok\"}\n```";
        assert_eq!(
            extract_json_block(text),
            Some("{\"task_id\":\"t1\",\"status\":\"ok\"}")
        );
    }

    #[test]
    fn fenced_block_without_language_tag_amid_prose() {
        let text = "Here is the result:\n```\n{\"status\":\"done\"}\n```\nThanks.";
        assert_eq!(extract_json_block(text), Some("{\"status\":\"done\"}"));
    }

    #[test]
    fn fence_without_braces_falls_through_to_absence() {
        assert_eq!(extract_json_block("```\nno json here\n```"), None);
    }

    #[test]
    fn whole_text_object_is_returned_verbatim() {
        let text = "  {\"a\": {\"b\": 1}}  ";
        assert_eq!(extract_json_block(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn returns_first_balanced_object_not_the_longest() {
        let text = "first {\"a\":{\"b\":1}} then {\"c\":2} end";
        assert_eq!(extract_json_block(text), Some("{\"a\":{\"b\":1}}"));
    }

    #[test]
    fn unbalanced_object_yields_none() {
        assert_eq!(extract_json_block("prefix {\"a\": {\"b\": 1}"), None);
        assert_eq!(extract_json_block("plain prose only"), None);
    }

    #[test]
    fn braces_inside_string_literals_do_not_end_the_span() {
        let text = r#"Result: {"summary":"fixed } and { cases","status":"ok"} trailing"#;
        assert_eq!(
            extract_json_block(text),
            Some(r#"{"summary":"fixed } and { cases","status":"ok"}"#)
        );
    }

    #[test]
    fn escaped_quotes_keep_string_state() {
        let text = r#"note {"summary":"say \"}\" loudly","status":"ok"} after"#;
        let block = extract_json_block(text).unwrap();
        let value = decode_block(block).unwrap();
        assert_eq!(value["summary"], "say \"}\" loudly");
    }

    #[test]
    fn decodes_double_encoded_payloads() {
        let encoded = serde_json::to_string("```json\n{\"status\":\"ok\"}\n```").unwrap();
        assert_eq!(
            extract_json_block_unescaped(&encoded).as_deref(),
            Some("{\"status\":\"ok\"}")
        );
        assert_eq!(decode_json_string("{\"status\":\"ok\"}"), None);
    }

    #[test]
    fn unescape_is_skipped_when_decoding_fails() {
        let text = r#"prefix {"summary":"a\nb"} suffix"#;
        assert_eq!(
            extract_json_block_unescaped(text).as_deref(),
            Some(r#"{"summary":"a\nb"}"#)
        );
    }
}
