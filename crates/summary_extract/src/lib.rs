#![forbid(unsafe_code)]
//! Summary extraction for captured coding-agent output.
//!
//! Agents are asked to finish a run by emitting a small JSON object
//! (`task_id`, `status`, `summary`, `files`, `blockers`). Where that object
//! ends up depends on the agent: inside a stream-json assistant message, in
//! an NDJSON event, in a markdown fence surrounded by prose, or double
//! encoded as a JSON string. This crate provides:
//! - a tolerant scanner that finds a JSON object in free text;
//! - a content normalizer for heterogeneous message shapes;
//! - the summary validator;
//! - one [`DialectParser`] per agent output format, driven by a shared
//!   [`SummaryExtractor`].
//!
//! Extraction is a pure function of the captured text: bad lines and
//! rejected candidates are skipped, never surfaced as errors.

mod config;
mod content;
mod dialect;
mod error;
mod extract;
mod lines;
mod scanner;
mod summary;

pub use config::{ExtractConfig, ExtractLimits};
pub use content::{extract_text, text_from_content};
pub use dialect::{
    Diagnostics, Dialect, DialectParser, FlexibleParser, LastMessageParser, NdjsonParser,
    SelectionPolicy, StreamJsonParser,
};
pub use error::{ConfigError, SkipDetail, SkipReason, SkipSink};
pub use extract::{extract, extract_with_config, SummaryExtractor};
pub use lines::{JsonLines, LineRecord};
pub use scanner::{
    decode_block, decode_json_string, extract_json_block, extract_json_block_unescaped,
};
pub use summary::{as_summary, validate, Rejection, Summary, TaskSummary, SUMMARY_FIELDS};
