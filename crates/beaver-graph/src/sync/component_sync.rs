//! Component and component instance synchronization.
//!
//! Creates nodes and relationships:
//! - (:Component)
//! - (:ComponentInstance)
//! - (:Component)-[:INSTANTIATES]->(:ComponentInstance)
//! - (:ComponentInstance)-[:DEPLOYED_IN]->(:Environment)

use anyhow::{Context, Result};
use tracing::debug;

use beaver_core::model::{Component, ComponentInstance};

use super::{mapping, SyncResult, Synchronizer};
use crate::store::{Endpoint, GraphSession, RelType};

impl Synchronizer {
    /// Sync all components. MANAGED_BY is derived by the team routine.
    pub async fn sync_components(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let components = self
            .records
            .list_components()
            .await
            .context("Failed to list components")?;

        let mut result = SyncResult::default();
        for component in &components {
            result.merge(&push_component(session.as_mut(), component).await?);
        }

        debug!(count = components.len(), "Components pushed");
        Ok(result)
    }

    /// Sync all component instances with their INSTANTIATES and DEPLOYED_IN
    /// relationships.
    pub async fn sync_component_instances(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let instances = self
            .records
            .list_component_instances()
            .await
            .context("Failed to list component instances")?;

        let mut result = SyncResult::default();
        for instance in &instances {
            result.merge(&push_instance(session.as_mut(), instance).await?);
        }

        debug!(
            count = instances.len(),
            skipped = result.relationships_skipped,
            "Component instances pushed"
        );
        Ok(result)
    }
}

pub(crate) async fn push_component(
    session: &mut dyn GraphSession,
    component: &Component,
) -> Result<SyncResult> {
    session.upsert_node(&mapping::component_node(component)).await?;
    Ok(SyncResult::node())
}

/// Upsert the instance and point INSTANTIATES and DEPLOYED_IN at its current
/// component and environment, dropping any other such link.
pub(crate) async fn push_instance(
    session: &mut dyn GraphSession,
    instance: &ComponentInstance,
) -> Result<SyncResult> {
    session.upsert_node(&mapping::instance_node(instance)).await?;

    let mut result = SyncResult::node();
    result.relationships_removed += session
        .retain_relationship(
            RelType::Instantiates,
            Endpoint::End,
            instance.id,
            Some(instance.component_id),
        )
        .await?;
    result.relationships_removed += session
        .retain_relationship(
            RelType::DeployedIn,
            Endpoint::Start,
            instance.id,
            Some(instance.environment_id),
        )
        .await?;
    result.link(session.merge_relationship(&mapping::instantiates(instance)).await?);
    result.link(session.merge_relationship(&mapping::deployed_in(instance)).await?);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use beaver_core::model::{ComponentInput, ComponentInstanceInput, ComponentStatus};
    use beaver_db::RecordStore;

    use crate::fixtures::{seed_catalog, Fixture};
    use crate::store::{NodeLabel, PropValue, RelType};

    #[tokio::test]
    async fn test_instances_link_component_and_environment() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;

        fx.sync.sync_environments().await.unwrap();
        fx.sync.sync_components().await.unwrap();
        let result = fx.sync.sync_component_instances().await.unwrap();

        assert_eq!(result.nodes_upserted, 1);
        assert_eq!(result.relationships_merged, 2);
        assert!(fx
            .graph
            .relationship(RelType::Instantiates, cat.component, cat.instance)
            .is_some());
        assert!(fx
            .graph
            .relationship(RelType::DeployedIn, cat.instance, cat.production)
            .is_some());
    }

    #[tokio::test]
    async fn test_instance_before_endpoints_leaves_orphan_node() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;

        let result = fx.sync.sync_component_instances().await.unwrap();

        assert_eq!(result.relationships_merged, 0);
        assert_eq!(result.relationships_skipped, 2);
        assert!(fx.graph.node(NodeLabel::ComponentInstance, cat.instance).is_some());
    }

    #[tokio::test]
    async fn test_component_status_and_team_follow_updates() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.sync_components().await.unwrap();

        let mut input = ComponentInput::named("ledger");
        input.status = ComponentStatus::Deprecated;
        fx.db.update_component(cat.component, &input).await.unwrap();
        fx.sync.sync_components().await.unwrap();

        let props = fx.graph.node(NodeLabel::Component, cat.component).unwrap();
        assert_eq!(props["status"], PropValue::Str("DEPRECATED".into()));
        assert_eq!(props["team_id"], PropValue::Null);
    }

    #[tokio::test]
    async fn test_moved_instance_keeps_one_placement() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();

        let gateway = fx.db.create_component(&ComponentInput::named("gateway")).await.unwrap();
        fx.db
            .update_component_instance(
                cat.instance,
                &ComponentInstanceInput::new(gateway.id, cat.development),
            )
            .await
            .unwrap();
        let result = fx.sync.run_full_sync().await.unwrap();

        assert_eq!(result.relationships_removed, 2);
        assert_eq!(fx.graph.relationship_count(RelType::Instantiates), 1);
        assert_eq!(fx.graph.relationship_count(RelType::DeployedIn), 1);
        assert!(fx
            .graph
            .relationship(RelType::Instantiates, gateway.id, cat.instance)
            .is_some());
        assert!(fx
            .graph
            .relationship(RelType::DeployedIn, cat.instance, cat.development)
            .is_some());
    }

    #[tokio::test]
    async fn test_second_instance_in_other_environment() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.db
            .create_component_instance(&ComponentInstanceInput::new(cat.component, cat.development))
            .await
            .unwrap();

        fx.sync.run_full_sync().await.unwrap();

        assert_eq!(fx.graph.relationship_count(RelType::Instantiates), 2);
        assert_eq!(fx.graph.relationship_count(RelType::DeployedIn), 2);
    }
}
