//! `beaver sync`

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use beaver_core::{BeaverConfig, EntityKind};
use beaver_graph::deadline::bounded;
use beaver_graph::Synchronizer;

use super::{step_timeout, Stores};
use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Sync only these entity kinds (e.g. environments, componentInstances)
    #[arg(short, long, value_delimiter = ',')]
    pub kind: Vec<EntityKind>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: SyncArgs, config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open(config).await?;
    let synchronizer = Synchronizer::new(stores.records(), stores.graph_store());

    if !args.json {
        println!("{}", "Syncing to graph store...".bold());
    }

    let result = if args.kind.is_empty() {
        bounded(step_timeout(config), "full sync", synchronizer.run_full_sync()).await?
    } else {
        // Keep dependency order regardless of argument order.
        let kinds: Vec<EntityKind> = EntityKind::ALL
            .into_iter()
            .filter(|k| args.kind.contains(k))
            .collect();
        bounded(step_timeout(config), "sync", synchronizer.sync_kinds(&kinds)).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_sync_result(&result);
    }
    Ok(())
}
