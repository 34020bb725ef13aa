//! `beaver hook` - targeted sync for writers outside this process.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use beaver_core::{BeaverConfig, EntityKind};
use beaver_graph::{EntityRef, SyncHooks};

use super::Stores;
use crate::output;

#[derive(Subcommand)]
pub enum HookCommands {
    /// Push a newly created row
    Created(EntityArgs),
    /// Push an updated row
    Updated(EntityArgs),
    /// Remove a deleted row from the graph
    Deleted(EntityArgs),
}

#[derive(Args)]
pub struct EntityArgs {
    /// Entity kind (e.g. components, adrParticipants)
    pub kind: EntityKind,
    /// Row id, or the ADR id for ADR associations
    pub id: i64,
    /// User, instance or component id for ADR associations
    pub other: Option<i64>,
}

impl EntityArgs {
    fn entity(&self) -> Result<EntityRef> {
        EntityRef::from_key(self.kind, self.id, self.other).ok_or_else(|| {
            if self.kind.is_relationship() {
                anyhow!("{} needs two ids: <adr id> <other id>", self.kind)
            } else {
                anyhow!("{} takes a single id", self.kind)
            }
        })
    }
}

pub async fn execute(cmd: HookCommands, config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open(config).await?;
    let hooks = SyncHooks::new(stores.records(), stores.graph_store());

    match cmd {
        HookCommands::Created(args) => {
            let result = hooks.on_entity_created(args.entity()?).await?;
            output::print_sync_result(&result);
        }
        HookCommands::Updated(args) => {
            let result = hooks.on_entity_updated(args.entity()?).await?;
            output::print_sync_result(&result);
        }
        HookCommands::Deleted(args) => {
            let entity = args.entity()?;
            if hooks.on_entity_deleted(entity).await? {
                println!("{} {}", "Removed".green(), entity);
            } else {
                println!("{} {}", "Not in graph:".dimmed(), entity);
            }
        }
    }
    Ok(())
}
