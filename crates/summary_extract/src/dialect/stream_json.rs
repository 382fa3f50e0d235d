use serde_json::Value;

use super::{accept_or_skip, decode_text_block, summary_from_text, BlockScan, Diagnostics};
use super::{DialectParser, SelectionPolicy};
use crate::content;
use crate::error::SkipReason;
use crate::scanner;
use crate::summary::{Summary, TASK_ID};

const ASSISTANT_MESSAGE: &str = "assistant_message";
const CONTENT_BLOCK_DELTA: &str = "content_block_delta";
const STREAM_EVENT: &str = "stream_event";

/// Claude `stream-json` output.
///
/// An `assistant_message` whose content holds an object with both `task_id`
/// and `status` ends the scan immediately. Otherwise the first assistant
/// content and the running message text (full messages overwrite it, deltas
/// append to it) are scanned once all lines are consumed, in that order.
#[derive(Debug, Clone, Default)]
pub struct StreamJsonParser {
    assistant_content: Option<String>,
    message_text: String,
}

impl StreamJsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn observe_assistant(
        &mut self,
        line_number: usize,
        event: &Value,
        diag: &mut Diagnostics<'_>,
    ) -> Option<Summary> {
        let content = event
            .get("content")
            .map(content::text_from_content)
            .unwrap_or_default();
        let content = scanner::decode_json_string(&content).unwrap_or(content);
        if content.is_empty() {
            return None;
        }

        match decode_text_block(&content, BlockScan::Unescaped) {
            Ok(Value::Object(fields))
                if fields.contains_key(TASK_ID) && fields.contains_key("status") =>
            {
                return Some(Summary::accept(fields));
            }
            Ok(Value::Object(_)) => diag.skip(Some(line_number), SkipReason::MissingTaskKeys),
            Ok(_) => diag.skip(Some(line_number), SkipReason::NotAnObject),
            Err(reason) => diag.skip(Some(line_number), reason),
        }

        if self.assistant_content.is_none() {
            self.assistant_content = Some(content);
        }
        None
    }
}

impl DialectParser for StreamJsonParser {
    fn name(&self) -> &'static str {
        "stream-json"
    }

    fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::FirstWins
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn parse_line(
        &mut self,
        line_number: usize,
        event: Value,
        diag: &mut Diagnostics<'_>,
    ) -> Option<Summary> {
        let event = unwrap_stream_event(event);
        let kind = event.get("type").and_then(Value::as_str);

        if kind == Some(ASSISTANT_MESSAGE) {
            if let Some(summary) = self.observe_assistant(line_number, &event, diag) {
                return Some(summary);
            }
        }

        if event.get("message").is_some() {
            let text = content::extract_text(&event);
            if !text.is_empty() {
                self.message_text = text;
            }
        }

        if kind == Some(CONTENT_BLOCK_DELTA) {
            if let Some(text) = event
                .get("delta")
                .and_then(|delta| delta.get("text"))
                .and_then(Value::as_str)
            {
                self.message_text.push_str(text);
            }
        }

        None
    }

    fn finish(&mut self, diag: &mut Diagnostics<'_>) -> Option<Summary> {
        if let Some(content) = self.assistant_content.take() {
            let candidate = summary_from_text(&content, BlockScan::Unescaped);
            if let Some(summary) = accept_or_skip(candidate, None, diag) {
                return Some(summary);
            }
        }

        if self.message_text.is_empty() {
            return None;
        }
        let candidate = summary_from_text(&self.message_text, BlockScan::Unescaped);
        accept_or_skip(candidate, None, diag)
    }
}

/// `{"type":"stream_event","event":{...}}` wraps the raw API event.
fn unwrap_stream_event(event: Value) -> Value {
    if event.get("type").and_then(Value::as_str) == Some(STREAM_EVENT) {
        if let Some(inner) = event.get("event").filter(|inner| inner.is_object()) {
            return inner.clone();
        }
    }
    event
}
