use std::fmt;

use thiserror::Error;

/// Why a line or candidate was passed over while scanning.
///
/// None of these are fatal: the extractor records the reason and moves on to
/// the next line or strategy tier.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SkipReason {
    JsonParse,
    NotAnObject,
    NoSummaryFields,
    /// Lacks `task_id` or `status`, so it cannot end a stream-json scan
    /// early. It may still be accepted as the fallback.
    MissingTaskKeys,
    EmptySummary,
    NoJsonBlock,
    LineTooLong,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::JsonParse => "json_parse",
            SkipReason::NotAnObject => "not_an_object",
            SkipReason::NoSummaryFields => "no_summary_fields",
            SkipReason::MissingTaskKeys => "missing_task_keys",
            SkipReason::EmptySummary => "empty_summary",
            SkipReason::NoJsonBlock => "no_json_block",
            SkipReason::LineTooLong => "line_too_long",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single skipped line or candidate. `line_number` is `None` for
/// whole-blob and fallback candidates.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SkipDetail {
    pub dialect: &'static str,
    pub line_number: Option<usize>,
    pub reason: SkipReason,
}

pub trait SkipSink: Send + 'static {
    fn on_skip(&mut self, detail: SkipDetail);
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ConfigError {
    #[error("builtin parser name required after `builtin:`")]
    MissingBuiltinName,
    #[error("unknown summary dialect `{0}`")]
    UnknownDialect(String),
    #[error("external parser scripts are not supported: `{0}`")]
    ExternalParser(String),
}

