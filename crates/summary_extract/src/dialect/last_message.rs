use serde_json::Value;

use super::{accept_or_skip, summary_from_text, BlockScan, Diagnostics};
use super::{DialectParser, SelectionPolicy};
use crate::content;
use crate::error::SkipReason;
use crate::summary::{self, Summary};

/// The agent's final message on its own, e.g. a Codex
/// `--output-last-message` file. The text is read as a whole; lines are
/// never walked.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastMessageParser;

impl LastMessageParser {
    pub fn new() -> Self {
        Self
    }
}

impl DialectParser for LastMessageParser {
    fn name(&self) -> &'static str {
        "last-message"
    }

    fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::FirstWins
    }

    fn walks_lines(&self) -> bool {
        false
    }

    fn reset(&mut self) {}

    fn parse_blob(&mut self, raw: &str, diag: &mut Diagnostics<'_>) -> Option<Summary> {
        let text = raw.trim();
        if text.is_empty() {
            diag.skip(None, SkipReason::NoJsonBlock);
            return None;
        }

        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
            let message_text = content::extract_text(&value);
            let direct = summary::validate(value).map_err(SkipReason::from);
            if let Some(summary) = accept_or_skip(direct, None, diag) {
                return Some(summary);
            }
            if !message_text.is_empty() {
                let candidate = summary_from_text(&message_text, BlockScan::Unescaped);
                return accept_or_skip(candidate, None, diag);
            }
        }

        accept_or_skip(summary_from_text(text, BlockScan::Unescaped), None, diag)
    }

    fn parse_line(
        &mut self,
        _line_number: usize,
        _event: Value,
        _diag: &mut Diagnostics<'_>,
    ) -> Option<Summary> {
        None
    }
}
