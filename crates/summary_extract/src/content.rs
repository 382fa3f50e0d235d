use serde_json::Value;

/// Flattens an event's message content into one string.
///
/// Content is read from `event.message.content` when the event carries a
/// `message` field, otherwise from `event.content`.
pub fn extract_text(event: &Value) -> String {
    let content = match event.get("message") {
        Some(message) => message.get("content"),
        None => event.get("content"),
    };
    content.map(text_from_content).unwrap_or_default()
}

/// Plain text is returned as-is, a single part yields its `text`, and a list
/// of parts is joined with newlines, dropping parts without text.
pub fn text_from_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Object(part) => part
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(part_text)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn part_text(part: &Value) -> Option<&str> {
    let text = match part {
        Value::String(text) => text.as_str(),
        Value::Object(fields) => fields.get("text")?.as_str()?,
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
