//! `beaver migrate`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use beaver_core::BeaverConfig;
use beaver_graph::MigrationRunner;

use super::{step_timeout, Stores};
use crate::output;

#[derive(Args)]
pub struct MigrateArgs {
    /// Directory for the pre-migration backup (overrides config)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: MigrateArgs, config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open_unmigrated(config).await?;
    let backup_dir = args
        .backup_dir
        .unwrap_or_else(|| config.migration.backup_dir.clone());

    if !args.json {
        println!("{}", "Running migration...".bold());
    }

    let runner = MigrationRunner::new(
        stores.records(),
        stores.graph_store(),
        backup_dir,
        step_timeout(config),
    );
    let report = runner.run().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_migration_report(&report);
    }
    Ok(())
}
