//! Team synchronization.
//!
//! Creates nodes and relationships:
//! - (:Team)
//! - (:Component)-[:MANAGED_BY]->(:Team) for every component with a team

use anyhow::{Context, Result};
use tracing::debug;

use beaver_core::model::{Component, Team};

use super::{mapping, SyncResult, Synchronizer};
use crate::store::{Endpoint, GraphSession, RelType};

impl Synchronizer {
    /// Sync all teams, then link managed components.
    pub async fn sync_teams(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let teams = self.records.list_teams().await.context("Failed to list teams")?;

        let mut result = SyncResult::default();
        for team in &teams {
            result.merge(&push_team(session.as_mut(), team).await?);
        }

        let components = self
            .records
            .list_components()
            .await
            .context("Failed to list components")?;
        for component in &components {
            result.merge(&push_managed_by(session.as_mut(), component).await?);
        }

        debug!(
            teams = teams.len(),
            managed = result.relationships_merged,
            "Teams pushed"
        );
        Ok(result)
    }
}

pub(crate) async fn push_team(session: &mut dyn GraphSession, team: &Team) -> Result<SyncResult> {
    session.upsert_node(&mapping::team_node(team)).await?;
    Ok(SyncResult::node())
}

/// Point MANAGED_BY at the component's current team, dropping any other
/// MANAGED_BY it has. A component without a team ends up with none.
pub(crate) async fn push_managed_by(
    session: &mut dyn GraphSession,
    component: &Component,
) -> Result<SyncResult> {
    let mut result = SyncResult {
        relationships_removed: session
            .retain_relationship(
                RelType::ManagedBy,
                Endpoint::Start,
                component.id,
                component.team_id,
            )
            .await?,
        ..SyncResult::default()
    };
    if let Some(team_id) = component.team_id {
        let linked = session
            .merge_relationship(&mapping::managed_by(component.id, team_id))
            .await?;
        result.link(linked);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use beaver_core::model::{ComponentInput, TeamInput};
    use beaver_db::RecordStore;

    use crate::fixtures::{seed_catalog, Fixture};
    use crate::store::{NodeLabel, RelType};

    #[tokio::test]
    async fn test_managed_by_links_components_with_team() {
        let fx = Fixture::new();
        let team = fx.db.create_team(&TeamInput::named("payments")).await.unwrap();
        let managed = fx
            .db
            .create_component(&ComponentInput::named("ledger").managed_by(team.id))
            .await
            .unwrap();
        fx.db.create_component(&ComponentInput::named("orphan-ui")).await.unwrap();

        fx.sync.sync_components().await.unwrap();
        let result = fx.sync.sync_teams().await.unwrap();

        assert_eq!(result.nodes_upserted, 1);
        assert_eq!(result.relationships_merged, 1);
        assert!(fx.graph.relationship(RelType::ManagedBy, managed.id, team.id).is_some());
        assert_eq!(fx.graph.relationship_count(RelType::ManagedBy), 1);
    }

    #[tokio::test]
    async fn test_team_change_moves_managed_by() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();

        let platform = fx.db.create_team(&TeamInput::named("platform")).await.unwrap();
        let moved = ComponentInput::named("ledger").managed_by(platform.id);
        fx.db.update_component(cat.component, &moved).await.unwrap();
        fx.sync.run_full_sync().await.unwrap();

        assert_eq!(fx.graph.relationship_count(RelType::ManagedBy), 1);
        assert!(fx
            .graph
            .relationship(RelType::ManagedBy, cat.component, platform.id)
            .is_some());

        fx.db
            .update_component(cat.component, &ComponentInput::named("ledger"))
            .await
            .unwrap();
        let result = fx.sync.run_full_sync().await.unwrap();

        assert_eq!(result.relationships_removed, 1);
        assert_eq!(fx.graph.relationship_count(RelType::ManagedBy), 0);
    }

    #[tokio::test]
    async fn test_missing_component_node_is_skipped() {
        let fx = Fixture::new();
        let team = fx.db.create_team(&TeamInput::named("payments")).await.unwrap();
        fx.db
            .create_component(&ComponentInput::named("ledger").managed_by(team.id))
            .await
            .unwrap();

        // Components not synced yet: nothing to link.
        let result = fx.sync.sync_teams().await.unwrap();

        assert_eq!(result.relationships_merged, 0);
        assert_eq!(result.relationships_skipped, 1);
        assert_eq!(fx.graph.node_ids(NodeLabel::Team), vec![team.id]);
    }
}
