//! Configuration schema (sqlcheck.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::issue::{IssueType, Severity};

/// SQL dialect used to parse extracted segments and the schema file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// Generic SQL
    Generic,

    /// MySQL (accepts `LIMIT offset, count` and inline `KEY` definitions)
    MySql,

    /// PostgreSQL
    Postgres,

    /// SQLite
    Sqlite,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::MySql
    }
}

impl std::str::FromStr for DialectConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(Self::Generic),
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Invalid(format!("unknown dialect '{}'", other))),
        }
    }
}

/// Severity overrides for specific issue types
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of issue type identifier to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for an issue type, or the rule's default
    pub fn get_severity(&self, issue_type: IssueType, default: Severity) -> Severity {
        self.overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(issue_type.as_str()))
            .map(|(_, severity)| *severity)
            .unwrap_or(default)
    }

    /// Set severity override for an issue type
    pub fn set_override(&mut self, issue_type: IssueType, severity: Severity) {
        self.overrides.insert(issue_type.as_str().to_string(), severity);
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory to scan
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// DDL file describing the database schema
    #[serde(default)]
    pub schema: Option<PathBuf>,

    /// SQL dialect
    #[serde(default)]
    pub dialect: DialectConfig,

    /// File extensions to scan (without the leading dot)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// File or directory names to skip (exact name or glob)
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Number of concurrent extraction workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the walker -> worker path queue
    #[serde(default = "default_path_buffer")]
    pub path_buffer: usize,

    /// Files larger than this are not extracted
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// OFFSET values above this are reported as deep pagination
    #[serde(default = "default_pagination_threshold")]
    pub deep_pagination_threshold: u64,

    /// Rule names that should not run
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Severity overrides
    #[serde(default)]
    pub severity: SeverityThreshold,
}

fn default_source_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    ["go", "py", "cpp", "java", "js", "ts", "php", "rb", "sql"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_exclude() -> Vec<String> {
    [".git", "vendor", "node_modules", "*_test.go"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_workers() -> usize {
    10
}

fn default_path_buffer() -> usize {
    100
}

fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_pagination_threshold() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            schema: None,
            dialect: DialectConfig::default(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            workers: default_workers(),
            path_buffer: default_path_buffer(),
            max_file_bytes: default_max_file_bytes(),
            deep_pagination_threshold: default_pagination_threshold(),
            disabled_rules: Vec::new(),
            severity: SeverityThreshold::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    ///
    /// Relative `source_root` and `schema` paths are resolved against the
    /// directory containing the config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if config.source_root.is_relative() {
                config.source_root = parent.join(&config.source_root);
            }
            if let Some(schema) = config.schema.as_mut().filter(|s| s.is_relative()) {
                *schema = parent.join(&*schema);
            }
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and override keys
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.path_buffer == 0 {
            return Err(ConfigError::Invalid("path_buffer must be at least 1".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid("extensions must not be empty".into()));
        }
        if let Some(unknown) = self
            .severity
            .overrides
            .keys()
            .find(|k| IssueType::from_name(k).is_none())
        {
            return Err(ConfigError::Invalid(format!(
                "unknown issue type '{}' in severity overrides",
                unknown
            )));
        }
        Ok(())
    }

    /// Extensions lower-cased with any leading dot removed
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Whether a rule is switched off
    pub fn is_rule_disabled(&self, rule_name: &str) -> bool {
        self.disabled_rules
            .iter()
            .any(|r| r.eq_ignore_ascii_case(rule_name))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
