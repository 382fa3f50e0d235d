use std::str::Lines;

use serde_json::Value;

use crate::config::ExtractLimits;
use crate::error::SkipReason;

#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    /// 1-based line number in the raw output.
    pub line_number: usize,
    pub outcome: Result<Value, SkipReason>,
}

/// Decodes each non-blank line of a captured output as one JSON event.
///
/// Blank lines produce no record; oversized and undecodable lines produce an
/// `Err` record so the caller can account for them.
pub struct JsonLines<'a> {
    lines: Lines<'a>,
    limits: ExtractLimits,
    line_number: usize,
}

impl<'a> JsonLines<'a> {
    pub fn new(raw: &'a str, limits: ExtractLimits) -> Self {
        Self {
            lines: raw.lines(),
            limits,
            line_number: 0,
        }
    }

    fn normalize_line(line: &str) -> &str {
        line.strip_suffix('\r').unwrap_or(line)
    }

    fn line_is_blank(line: &str) -> bool {
        line.chars().all(|ch| ch.is_whitespace())
    }

    fn too_long(&self, line: &str) -> bool {
        self.limits
            .max_line_bytes
            .is_some_and(|max| line.len() > max)
    }
}

impl Iterator for JsonLines<'_> {
    type Item = LineRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw_line = self.lines.next()?;
            self.line_number += 1;
            let line_number = self.line_number;

            let line = Self::normalize_line(raw_line);
            if Self::line_is_blank(line) {
                continue;
            }

            let outcome = if self.too_long(line) {
                Err(SkipReason::LineTooLong)
            } else {
                serde_json::from_str(line).map_err(|_| SkipReason::JsonParse)
            };
            return Some(LineRecord {
                line_number,
                outcome,
            });
        }
    }
}
