//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::time::timeout;
use tracing::info;

use beaver_core::BeaverConfig;
use beaver_db::{DbPool, RecordStore};
use beaver_graph::{GraphClient, GraphStore};

pub mod hook;
pub mod integrity;
pub mod migrate;
pub mod status;
pub mod sync;

/// Beaver - architecture catalogue dual-store synchronization
#[derive(Parser)]
#[command(name = "beaver")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./beaver.toml when present)
    #[arg(short, long, global = true, env = "BEAVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push relational rows into the graph
    Sync(sync::SyncArgs),

    /// Compare both stores and report discrepancies
    Validate(integrity::ValidateArgs),

    /// Validate, fix discrepancies and validate again
    Repair(integrity::RepairArgs),

    /// Run the full migration onto the dual-store layout
    Migrate(migrate::MigrateArgs),

    /// Show row and node counts
    Status,

    /// Targeted sync of a single entity
    #[command(subcommand)]
    Hook(hook::HookCommands),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = BeaverConfig::load(self.config.as_deref()).context("Failed to load config")?;

        match self.command {
            Commands::Sync(args) => sync::execute(args, &config).await,
            Commands::Validate(args) => integrity::validate(args, &config).await,
            Commands::Repair(args) => integrity::repair(args, &config).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Status => status::execute(&config).await,
            Commands::Hook(cmd) => hook::execute(cmd, &config).await,
        }
    }
}

/// Both stores, opened from config.
pub struct Stores {
    pub db: Arc<DbPool>,
    pub graph: Arc<GraphClient>,
}

impl Stores {
    /// Open both stores with the relational schema brought up to date.
    pub async fn open(config: &BeaverConfig) -> Result<Self> {
        let db = beaver_db::init_pool(&config.database.path).with_context(|| {
            format!("Failed to open database {}", config.database.path.display())
        })?;
        Self::with_db(db, config).await
    }

    /// Open both stores without touching the relational schema, so the
    /// migration runner can back up the database before applying it.
    pub async fn open_unmigrated(config: &BeaverConfig) -> Result<Self> {
        let db = DbPool::open(&config.database.path).with_context(|| {
            format!("Failed to open database {}", config.database.path.display())
        })?;
        Self::with_db(db, config).await
    }

    async fn with_db(db: DbPool, config: &BeaverConfig) -> Result<Self> {
        // Neo4j hangs on connect when unreachable; fail fast instead.
        let graph = timeout(Duration::from_secs(10), GraphClient::connect(&config.graph))
            .await
            .map_err(|_| anyhow::anyhow!("Timed out connecting to Neo4j at {}", config.graph.uri))??;
        info!(uri = %config.graph.uri, "Connected to Neo4j");

        Ok(Self {
            db: Arc::new(db),
            graph: Arc::new(graph),
        })
    }

    pub fn records(&self) -> Arc<dyn RecordStore> {
        self.db.clone()
    }

    pub fn graph_store(&self) -> Arc<dyn GraphStore> {
        self.graph.clone()
    }
}

pub fn step_timeout(config: &BeaverConfig) -> Duration {
    Duration::from_secs(config.sync.step_timeout_secs)
}
