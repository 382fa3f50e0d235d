mod config;
mod error;

use std::{
    fs::File,
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{ArgAction, Parser};
use serde_json::{json, Value};
use summary_extract::{Dialect, ExtractConfig, ExtractLimits, Summary};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::AgentsConfig;
use crate::error::CliError;

const EXIT_MISSING: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "summary-extract")]
#[command(about = "Extract the task summary JSON from captured agent output")]
struct Cli {
    /// Output dialect: stream-json, ndjson, flexible, last-message, or an
    /// agent name (claude, codex, opencode). Defaults to stream-json.
    #[arg(long, conflicts_with_all = ["parser", "agent"])]
    dialect: Option<Dialect>,

    /// Parser setting such as `builtin:claude` or `codex_parser.py`.
    #[arg(long, conflicts_with = "agent")]
    parser: Option<String>,

    /// Agent whose configured parser selects the dialect.
    #[arg(long)]
    agent: Option<String>,

    /// TOML file with `[agents.<name>]` tables carrying a `parser` key.
    #[arg(long, requires = "agent")]
    config: Option<PathBuf>,

    /// Read the captured output from a file instead of stdin.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Refuse input larger than this many bytes.
    #[arg(long)]
    max_input_bytes: Option<usize>,

    /// Skip lines longer than this many bytes.
    #[arg(long)]
    max_line_bytes: Option<usize>,

    /// Print the fixed task_id/status/summary/files/blockers shape.
    #[arg(long)]
    typed: bool,

    #[arg(long)]
    pretty: bool,

    /// Log to stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            report(&json!({"error": "no summary found"}));
            ExitCode::from(EXIT_MISSING)
        }
        Err(err) => {
            debug!(error = ?err, "summary extraction failed");
            report(&json!({"error": err.to_string()}));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn report(payload: &Value) {
    let _ = writeln!(io::stderr().lock(), "{payload}");
}

/// Returns whether a summary was found and written to stdout.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let dialect = resolve_dialect(cli)?;
    let raw = read_input(cli.input.as_ref(), cli.max_input_bytes)?;
    debug!(%dialect, bytes = raw.len(), "extracting summary");

    let mut config = ExtractConfig {
        limits: ExtractLimits {
            max_line_bytes: cli.max_line_bytes,
        },
        ..ExtractConfig::default()
    };
    let Some(summary) = summary_extract::extract_with_config(dialect, &raw, &mut config) else {
        return Ok(false);
    };

    let rendered = render(summary, cli.typed, cli.pretty)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}").map_err(CliError::WriteOutput)?;
    stdout.flush().map_err(CliError::WriteOutput)?;
    Ok(true)
}

fn resolve_dialect(cli: &Cli) -> Result<Dialect, CliError> {
    if let Some(dialect) = cli.dialect {
        return Ok(dialect);
    }
    if let Some(parser) = &cli.parser {
        return Ok(Dialect::from_parser_config(parser)?);
    }
    if let Some(agent) = &cli.agent {
        let agents = match &cli.config {
            Some(path) => AgentsConfig::load(path)?,
            None => AgentsConfig::default(),
        };
        return agents.dialect_for(agent);
    }
    Ok(Dialect::StreamJson)
}

fn read_input(path: Option<&PathBuf>, limit: Option<usize>) -> Result<String, CliError> {
    let bytes = match path {
        Some(path) => File::open(path)
            .and_then(|file| read_capped(file, limit))
            .map_err(|source| CliError::ReadInput {
                path: path.clone(),
                source,
            })?,
        None => read_capped(io::stdin().lock(), limit).map_err(CliError::ReadStdin)?,
    };
    if let Some(limit) = limit {
        if bytes.len() > limit {
            return Err(CliError::InputTooLarge { limit });
        }
    }
    String::from_utf8(bytes).map_err(|_| CliError::InvalidUtf8)
}

/// Reads at most one byte past `limit`, enough to tell that it was exceeded.
fn read_capped<R: Read>(reader: R, limit: Option<usize>) -> io::Result<Vec<u8>> {
    let cap = limit.map_or(u64::MAX, |limit| (limit as u64).saturating_add(1));
    let mut bytes = Vec::new();
    reader.take(cap).read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn render(summary: Summary, typed: bool, pretty: bool) -> Result<String, CliError> {
    let value = if typed {
        serde_json::to_value(summary.to_task_summary())?
    } else {
        summary.into_value()
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_capped_stops_one_byte_past_the_limit() {
        let data = b"0123456789";
        assert_eq!(read_capped(&data[..], Some(4)).unwrap(), b"01234".to_vec());
        assert_eq!(read_capped(&data[..], Some(10)).unwrap().len(), 10);
        assert_eq!(read_capped(&data[..], None).unwrap().len(), 10);
    }

    #[test]
    fn typed_rendering_normalizes_the_shape() {
        let summary =
            summary_extract::validate(json!({"task_id": null, "status": "skipped", "extra": 1}))
                .unwrap();
        assert_eq!(
            render(summary, true, false).unwrap(),
            r#"{"task_id":"","status":"skipped","summary":""}"#
        );
    }

    #[test]
    fn cli_arguments_are_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
