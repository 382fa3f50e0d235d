//! Per-agent strategies for finding the summary in captured output.
//!
//! Every dialect is expressed over the same primitives (scanner, content
//! normalizer, validator); they differ only in which events they look at
//! and which candidate wins when several appear.

mod flexible;
mod last_message;
mod ndjson;
mod stream_json;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, SkipDetail, SkipReason, SkipSink};
use crate::scanner;
use crate::summary::{self, Summary};

pub use flexible::FlexibleParser;
pub use last_message::LastMessageParser;
pub use ndjson::NdjsonParser;
pub use stream_json::StreamJsonParser;

/// Which line candidate wins when more than one validates.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SelectionPolicy {
    /// Stop at the first accepted line.
    FirstWins,
    /// Keep scanning; a later accepted line replaces an earlier one.
    LastWins,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Dialect {
    /// Claude `stream-json` events.
    StreamJson,
    /// Codex `--json` NDJSON events.
    Ndjson,
    /// Best-effort scan of arbitrary output (OpenCode).
    Flexible,
    /// A single final assistant message, as written to a last-message file.
    LastMessage,
}

const BUNDLED_SCRIPTS: [(&str, Dialect); 3] = [
    ("claude_parser.py", Dialect::StreamJson),
    ("codex_parser.py", Dialect::Ndjson),
    ("opencode_parser.py", Dialect::Flexible),
];

const BUILTIN_PREFIX: &str = "builtin:";

impl Dialect {
    pub const ALL: [Dialect; 4] = [
        Dialect::StreamJson,
        Dialect::Ndjson,
        Dialect::Flexible,
        Dialect::LastMessage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::StreamJson => "stream-json",
            Dialect::Ndjson => "ndjson",
            Dialect::Flexible => "flexible",
            Dialect::LastMessage => "last-message",
        }
    }

    /// The agent whose output this dialect reads by default.
    pub fn agent(self) -> Option<&'static str> {
        match self {
            Dialect::StreamJson => Some("claude"),
            Dialect::Ndjson => Some("codex"),
            Dialect::Flexible => Some("opencode"),
            Dialect::LastMessage => None,
        }
    }

    pub fn policy(self) -> SelectionPolicy {
        match self {
            Dialect::Ndjson => SelectionPolicy::LastWins,
            Dialect::StreamJson | Dialect::Flexible | Dialect::LastMessage => {
                SelectionPolicy::FirstWins
            }
        }
    }

    pub fn parser(self) -> Box<dyn DialectParser + Send> {
        match self {
            Dialect::StreamJson => Box::new(StreamJsonParser::new()),
            Dialect::Ndjson => Box::new(NdjsonParser::new()),
            Dialect::Flexible => Box::new(FlexibleParser::new()),
            Dialect::LastMessage => Box::new(LastMessageParser::new()),
        }
    }

    /// Resolves an agent `parser` setting such as `builtin:claude`,
    /// `codex_parser.py` or a bare dialect name.
    pub fn from_parser_config(config: &str) -> Result<Self, ConfigError> {
        let config = config.trim();

        if let Some(name) = config.strip_prefix(BUILTIN_PREFIX) {
            if name.trim().is_empty() {
                return Err(ConfigError::MissingBuiltinName);
            }
            return name.parse();
        }

        if let Some((_, dialect)) = BUNDLED_SCRIPTS
            .iter()
            .find(|(script, _)| *script == config)
        {
            return Ok(*dialect);
        }

        if is_script_path(config) {
            return Err(ConfigError::ExternalParser(config.to_string()));
        }

        config.parse()
    }
}

fn is_script_path(config: &str) -> bool {
    config.contains('/') || config.ends_with(".py") || config.ends_with(".js")
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = ConfigError;

    /// Accepts dialect names and the agent names mapped onto them.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim().to_ascii_lowercase().replace('_', "-");
        match key.as_str() {
            "stream-json" | "claude" => Ok(Dialect::StreamJson),
            "ndjson" | "codex" => Ok(Dialect::Ndjson),
            "flexible" | "opencode" => Ok(Dialect::Flexible),
            "last-message" => Ok(Dialect::LastMessage),
            _ => Err(ConfigError::UnknownDialect(raw.trim().to_string())),
        }
    }
}

/// A dialect-specific strategy driven by [`crate::SummaryExtractor`].
///
/// The extractor calls `reset`, then `parse_blob` once with the whole
/// output, then (if `walks_lines`) `parse_line` for every decoded line, and
/// finally `finish` when no line produced a winner.
pub trait DialectParser {
    fn name(&self) -> &'static str;

    fn policy(&self) -> SelectionPolicy;

    fn walks_lines(&self) -> bool {
        true
    }

    fn reset(&mut self);

    fn parse_blob(&mut self, raw: &str, diag: &mut Diagnostics<'_>) -> Option<Summary> {
        let _ = (raw, diag);
        None
    }

    fn parse_line(
        &mut self,
        line_number: usize,
        event: Value,
        diag: &mut Diagnostics<'_>,
    ) -> Option<Summary>;

    fn finish(&mut self, diag: &mut Diagnostics<'_>) -> Option<Summary> {
        let _ = diag;
        None
    }
}

/// Records skipped candidates to `tracing` and the configured sink.
pub struct Diagnostics<'a> {
    dialect: &'static str,
    sink: Option<&'a mut (dyn SkipSink + 'static)>,
}

impl<'a> Diagnostics<'a> {
    pub fn new(dialect: &'static str, sink: Option<&'a mut (dyn SkipSink + 'static)>) -> Self {
        Self { dialect, sink }
    }

    pub fn skip(&mut self, line_number: Option<usize>, reason: SkipReason) {
        debug!(
            dialect = self.dialect,
            line_number,
            reason = %reason,
            "skipping summary candidate"
        );
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_skip(SkipDetail {
                dialect: self.dialect,
                line_number,
                reason,
            });
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum BlockScan {
    Plain,
    /// Try to undo a JSON string encoding before scanning.
    Unescaped,
}

pub(crate) fn decode_text_block(text: &str, scan: BlockScan) -> Result<Value, SkipReason> {
    let block = match scan {
        BlockScan::Plain => scanner::extract_json_block(text).map(Cow::Borrowed),
        BlockScan::Unescaped => scanner::extract_json_block_unescaped(text),
    }
    .ok_or(SkipReason::NoJsonBlock)?;
    scanner::decode_block(&block)
}

/// Scanner, then decoder, then validator.
pub(crate) fn summary_from_text(text: &str, scan: BlockScan) -> Result<Summary, SkipReason> {
    let value = decode_text_block(text, scan)?;
    Ok(summary::validate(value)?)
}

/// Validates the candidate, reporting a rejection to `diag`.
pub(crate) fn accept_or_skip(
    candidate: Result<Summary, SkipReason>,
    line_number: Option<usize>,
    diag: &mut Diagnostics<'_>,
) -> Option<Summary> {
    candidate
        .map_err(|reason| diag.skip(line_number, reason))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialects_resolve_from_names_and_agents() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>(), Ok(dialect));
            if let Some(agent) = dialect.agent() {
                assert_eq!(agent.parse::<Dialect>(), Ok(dialect));
            }
        }
        assert_eq!("Last_Message".parse::<Dialect>(), Ok(Dialect::LastMessage));
    }

    #[test]
    fn parser_config_accepts_builtin_and_bundled_names() {
        assert_eq!(
            Dialect::from_parser_config("builtin:claude"),
            Ok(Dialect::StreamJson)
        );
        assert_eq!(
            Dialect::from_parser_config("codex_parser.py"),
            Ok(Dialect::Ndjson)
        );
        assert_eq!(
            Dialect::from_parser_config(" opencode_parser.py "),
            Ok(Dialect::Flexible)
        );
        assert_eq!(
            Dialect::from_parser_config("builtin:"),
            Err(ConfigError::MissingBuiltinName)
        );
        assert_eq!(
            Dialect::from_parser_config("~/.looper/parsers/custom.js"),
            Err(ConfigError::ExternalParser(
                "~/.looper/parsers/custom.js".to_string()
            ))
        );
        assert_eq!(
            Dialect::from_parser_config("gemini"),
            Err(ConfigError::UnknownDialect("gemini".to_string()))
        );
    }

    #[test]
    fn policies_are_fixed_per_dialect() {
        assert_eq!(Dialect::StreamJson.policy(), SelectionPolicy::FirstWins);
        assert_eq!(Dialect::Ndjson.policy(), SelectionPolicy::LastWins);
        assert_eq!(Dialect::Flexible.policy(), SelectionPolicy::FirstWins);
        for dialect in Dialect::ALL {
            assert_eq!(dialect.parser().policy(), dialect.policy());
            assert_eq!(dialect.parser().name(), dialect.name());
        }
    }
}
