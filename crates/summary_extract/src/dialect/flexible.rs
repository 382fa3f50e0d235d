use serde_json::Value;

use super::{accept_or_skip, summary_from_text, BlockScan, Diagnostics};
use super::{DialectParser, SelectionPolicy};
use crate::error::SkipReason;
use crate::summary::{self, Summary};

/// Best effort for agents without a fixed output format.
///
/// Tiers, first success wins: the whole output as one JSON value, then the
/// first object the scanner finds in it, then the first line that is itself
/// a valid summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlexibleParser;

impl FlexibleParser {
    pub fn new() -> Self {
        Self
    }
}

impl DialectParser for FlexibleParser {
    fn name(&self) -> &'static str {
        "flexible"
    }

    fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::FirstWins
    }

    fn reset(&mut self) {}

    fn parse_blob(&mut self, raw: &str, diag: &mut Diagnostics<'_>) -> Option<Summary> {
        let whole = serde_json::from_str::<Value>(raw.trim())
            .map_err(|_| SkipReason::JsonParse)
            .and_then(|value| summary::validate(value).map_err(SkipReason::from));
        if let Some(summary) = accept_or_skip(whole, None, diag) {
            return Some(summary);
        }

        accept_or_skip(summary_from_text(raw, BlockScan::Plain), None, diag)
    }

    fn parse_line(
        &mut self,
        line_number: usize,
        event: Value,
        diag: &mut Diagnostics<'_>,
    ) -> Option<Summary> {
        let candidate = summary::validate(event).map_err(SkipReason::from);
        accept_or_skip(candidate, Some(line_number), diag)
    }
}

#[cfg(test)]
mod tests {
    use crate::{extract, Dialect};
    use serde_json::json;

    #[test]
    fn whole_blob_wins_over_later_lines() {
        let raw = "{\"task_id\": \"T1\", \"status\": \"done\", \"previous\":\n{\"task_id\": \"T0\", \"status\": \"failed\"}\n}\n";
        let summary = extract(Dialect::Flexible, raw).unwrap();
        assert_eq!(summary.task_id(), "T1");
        assert_eq!(summary.status(), Some("done"));
    }

    #[test]
    fn prose_wrapped_object_is_found_by_the_scanner() {
        let raw = "I finished the task.\nSummary: {\"status\": \"done\", \"summary\": \"all {braces} ok\"}\nBye";
        let summary = extract(Dialect::Flexible, raw).unwrap();
        assert_eq!(summary.summary_text(), Some("all {braces} ok"));
    }

    #[test]
    fn first_valid_line_wins_when_blob_tiers_fail() {
        let raw = format!(
            "{}\n{}\n{}\n",
            json!({"type": "start"}),
            json!({"task_id": "T1", "status": "in_progress"}),
            json!({"task_id": "T1", "status": "done"})
        );
        let summary = extract(Dialect::Flexible, &raw).unwrap();
        assert_eq!(summary.status(), Some("in_progress"));
    }

    #[test]
    fn lines_are_not_text_scanned() {
        let raw = format!(
            "{}\n{}\n",
            json!({"type": "start"}),
            json!({"content": "{\"status\":\"done\"}"})
        );
        assert!(extract(Dialect::Flexible, &raw).is_none());
    }
}
