//! Agent to parser mapping.
//!
//! Reads the `[agents.<name>]` tables of an agent configuration file and
//! keeps only the `parser` setting; every other key is ignored. The legacy
//! `[agents.agents.<name>]` layout is read too.

use std::{collections::BTreeMap, fs, path::Path};

use serde::de::Error as _;
use serde::Deserialize;
use summary_extract::Dialect;
use toml::{value::Table as TomlTable, Value as TomlValue};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub parser: String,
}

#[derive(Debug, Clone, Default)]
pub struct AgentsConfig {
    agents: BTreeMap<String, AgentSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    agents: TomlTable,
}

impl AgentsConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::LoadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut agents = BTreeMap::new();
        collect_agents(&mut agents, raw.agents)?;
        Ok(Self { agents })
    }

    /// The configured parser, falling back to the built-in default for
    /// known agents. An empty `parser` counts as unset.
    pub fn parser_for(&self, agent: &str) -> Option<&str> {
        let key = normalize_agent_name(agent);
        self.agents
            .get(&key)
            .map(|settings| settings.parser.trim())
            .filter(|parser| !parser.is_empty())
            .or_else(|| default_parser(&key))
    }

    pub fn dialect_for(&self, agent: &str) -> Result<Dialect, CliError> {
        let parser = self
            .parser_for(agent)
            .ok_or_else(|| CliError::UnknownAgent(agent.trim().to_string()))?;
        Ok(Dialect::from_parser_config(parser)?)
    }
}

/// Non-table entries are skipped; a nested `agents` table is read as more
/// agent entries.
fn collect_agents(
    target: &mut BTreeMap<String, AgentSettings>,
    table: TomlTable,
) -> Result<(), toml::de::Error> {
    for (key, value) in table {
        if key == "agents" {
            let TomlValue::Table(nested) = value else {
                return Err(toml::de::Error::custom("agents.agents must be a table"));
            };
            collect_agents(target, nested)?;
            continue;
        }

        if !value.is_table() {
            continue;
        }
        let settings: AgentSettings = value
            .try_into()
            .map_err(|err: toml::de::Error| {
                toml::de::Error::custom(format!("agent {key}: {}", err.message()))
            })?;
        target.insert(normalize_agent_name(&key), settings);
    }
    Ok(())
}

fn default_parser(agent: &str) -> Option<&'static str> {
    match agent {
        "claude" => Some("claude_parser.py"),
        "codex" => Some("codex_parser.py"),
        "opencode" => Some("opencode_parser.py"),
        _ => None,
    }
}

fn normalize_agent_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
