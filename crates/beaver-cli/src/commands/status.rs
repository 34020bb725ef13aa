//! `beaver status`

use anyhow::Result;
use colored::Colorize;

use beaver_core::{BeaverConfig, EntityKind};
use beaver_db::RecordStore;

use super::Stores;

/// Show row counts and graph totals.
pub async fn execute(config: &BeaverConfig) -> Result<()> {
    let stores = Stores::open(config).await?;

    println!("{}", "Record Store".bold());
    println!("{}", "─".repeat(40));
    println!("  Database:      {}", config.database.path.display().to_string().cyan());
    for kind in EntityKind::ALL {
        let count = stores.db.count(kind).await?;
        println!("  {:<22} {}", kind.as_str(), count.to_string().cyan());
    }

    let counts = stores.graph.get_counts().await?;
    println!();
    println!("{}", "Graph Store".bold());
    println!("{}", "─".repeat(40));
    println!("  URI:           {}", config.graph.uri.cyan());
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());
    println!("  Sync policy:   {:?}", config.sync.policy);
    println!("{}", "─".repeat(40));

    Ok(())
}
