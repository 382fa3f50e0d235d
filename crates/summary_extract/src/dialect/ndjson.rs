use serde_json::Value;

use super::{accept_or_skip, summary_from_text, BlockScan, Diagnostics};
use super::{DialectParser, SelectionPolicy};
use crate::content;
use crate::error::SkipReason;
use crate::summary::{self, Summary};

/// Codex NDJSON output: every line is a candidate, either directly or via
/// the text of its message content. The last accepted line wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct NdjsonParser;

impl NdjsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl DialectParser for NdjsonParser {
    fn name(&self) -> &'static str {
        "ndjson"
    }

    fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::LastWins
    }

    fn reset(&mut self) {}

    fn parse_line(
        &mut self,
        line_number: usize,
        event: Value,
        diag: &mut Diagnostics<'_>,
    ) -> Option<Summary> {
        let text = content::extract_text(&event);
        let direct = match summary::validate(event) {
            Ok(summary) => return Some(summary),
            Err(rejection) => SkipReason::from(rejection),
        };

        if text.is_empty() {
            diag.skip(Some(line_number), direct);
            return None;
        }
        let candidate = summary_from_text(&text, BlockScan::Plain);
        accept_or_skip(candidate, Some(line_number), diag)
    }
}
