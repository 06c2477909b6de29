//! YAML configuration for fixture generation.
//!
//! ```yaml
//! database: app.duckdb
//! dialect: postgres
//! format: script
//! max_depth: 32
//! init:
//!   - schema/*.sql
//!   - data/seed.sql.gz
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use crate::closure::DEFAULT_MAX_DEPTH;
use crate::dialect::Dialect;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How generated statements are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One script, each statement ending with `;` (default)
    #[default]
    Script,
    /// One statement per line, no terminator
    List,
    /// JSON object with statements, rows and statistics
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "script" | "sql" => Ok(OutputFormat::Script),
            "list" => Ok(OutputFormat::List),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options: script, list, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Script => write!(f, "script"),
            OutputFormat::List => write!(f, "list"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureConfig {
    /// DuckDB database file; in-memory when absent
    pub database: Option<PathBuf>,
    /// Dialect of the generated literals
    pub dialect: Option<Dialect>,
    pub format: Option<OutputFormat>,
    /// Longest foreign-key chain followed from a seed row
    pub max_depth: Option<usize>,
    /// Scripts (or glob patterns) run before the statements, in order
    pub init: Vec<String>,
}

impl FixtureConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    pub fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }
}
