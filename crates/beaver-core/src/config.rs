//! Configuration loaded from `beaver.toml` and environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BeaverError, BeaverResult};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "beaver.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaverConfig {
    pub database: DatabaseConfig,
    pub graph: GraphConfig,
    pub sync: SyncConfig,
    pub migration: MigrationConfig,
}

/// Record store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("beaver.db"),
        }
    }
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "beaver_dev".to_string(),
            database: "neo4j".to_string(),
            max_connections: 4,
        }
    }
}

/// What a mutation does when the graph side of a dual write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicy {
    /// Keep the relational write, report a sync warning.
    #[default]
    BestEffort,
    /// Fail the mutation (the relational write is not rolled back).
    Strict,
}

impl FromStr for SyncPolicy {
    type Err = BeaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            _ => Err(BeaverError::invalid_enum("sync policy", s)),
        }
    }
}

/// How the repair routine reacts to a failing corrective action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// Record the failure and keep going.
    #[default]
    Continue,
    /// Abort the whole repair on the first failure.
    FailFast,
}

impl FromStr for RepairMode {
    type Err = BeaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "continue" => Ok(Self::Continue),
            "fail_fast" => Ok(Self::FailFast),
            _ => Err(BeaverError::invalid_enum("repair mode", s)),
        }
    }
}

/// Synchronization behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub policy: SyncPolicy,
    pub repair_mode: RepairMode,
    /// Upper bound for one top-level sync/validate/repair step.
    pub step_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            policy: SyncPolicy::default(),
            repair_mode: RepairMode::default(),
            step_timeout_secs: 300,
        }
    }
}

/// Migration runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub backup_dir: PathBuf,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            backup_dir: PathBuf::from("backups"),
        }
    }
}

impl BeaverConfig {
    /// Load from an explicit file, or `beaver.toml` if present, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> BeaverResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> BeaverResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> BeaverResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BEAVER_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("NEO4J_URI") {
            self.graph.uri = v;
        }
        if let Some(v) = lookup("NEO4J_USER") {
            self.graph.user = v;
        }
        if let Some(v) = lookup("NEO4J_PASSWORD") {
            self.graph.password = v;
        }
        if let Some(v) = lookup("BEAVER_SYNC_POLICY") {
            self.sync.policy = v.parse()?;
        }
        if let Some(v) = lookup("BEAVER_REPAIR_MODE") {
            self.sync.repair_mode = v.parse()?;
        }
        if let Some(v) = lookup("BEAVER_STEP_TIMEOUT_SECS") {
            self.sync.step_timeout_secs = v
                .parse()
                .map_err(|_| BeaverError::config(format!("BEAVER_STEP_TIMEOUT_SECS: '{}'", v)))?;
        }
        if let Some(v) = lookup("BEAVER_BACKUP_DIR") {
            self.migration.backup_dir = PathBuf::from(v);
        }
        Ok(())
    }
}
