use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillGraphError};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: ExecutionConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound on event nodes executed by one activation.
    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_chain_length: default_max_chain_length(),
        }
    }
}

/// Logging configuration for the host binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Name translation applied when importing authored content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Extra spellings for stat names, e.g. `HP = "Health"`.
    #[serde(default)]
    pub stat_aliases: HashMap<String, String>,
    /// Extra spellings for debuff names, e.g. `Stun = "Stunned"`.
    #[serde(default)]
    pub debuff_aliases: HashMap<String, String>,
}

impl ContentConfig {
    /// Resolve an alias, case-insensitively. Unknown names pass through.
    pub fn stat_name<'a>(&'a self, raw: &'a str) -> &'a str {
        lookup_alias(&self.stat_aliases, raw)
    }

    pub fn debuff_name<'a>(&'a self, raw: &'a str) -> &'a str {
        lookup_alias(&self.debuff_aliases, raw)
    }
}

fn lookup_alias<'a>(aliases: &'a HashMap<String, String>, raw: &'a str) -> &'a str {
    let trimmed = raw.trim();
    aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, target)| target.as_str())
        .unwrap_or(trimmed)
}

fn default_max_chain_length() -> usize { 256 }
fn default_log_filter() -> String { "skillgraph=info,warn".to_string() }

impl EngineConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| SkillGraphError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parse config from TOML text, with env var expansion.
    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| SkillGraphError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
