use std::{io, path::PathBuf};

use summary_extract::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read input `{path}`: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read stdin: {0}")]
    ReadStdin(#[source] io::Error),
    #[error("input is not valid UTF-8")]
    InvalidUtf8,
    #[error("input exceeds the {limit} byte limit")]
    InputTooLarge { limit: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read config `{path}`: {source}")]
    LoadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no parser configured for agent `{0}`")]
    UnknownAgent(String),
    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write summary: {0}")]
    WriteOutput(#[source] io::Error),
}
