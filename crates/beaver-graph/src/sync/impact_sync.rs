//! ADR impact synchronization.
//!
//! Creates relationships:
//! - (:ADR)-[:AFFECTS_INSTANCE {impact_level, notes}]->(:ComponentInstance)
//! - (:ADR)-[:AFFECTS]->(:Component)
//!
//! An impact on an instance implies an impact on its component: the
//! ADRComponent row is derived relationally when missing.

use anyhow::{Context, Result};
use tracing::{debug, info};

use beaver_core::model::{AdrComponent, AdrComponentInstance};
use beaver_db::{DbError, RecordStore};

use super::{mapping, SyncResult, Synchronizer};
use crate::store::GraphSession;

impl Synchronizer {
    /// Sync every ADR instance impact, deriving ADR component impacts.
    pub async fn sync_adr_component_instances(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let impacts = self
            .records
            .list_adr_component_instances()
            .await
            .context("Failed to list ADR component instances")?;

        let mut result = SyncResult::default();
        for impact in &impacts {
            result.merge(&push_impact(self.records.as_ref(), session.as_mut(), impact).await?);
        }

        debug!(
            count = impacts.len(),
            derived = result.derived_rows_created,
            "ADR component instances pushed"
        );
        Ok(result)
    }

    pub async fn sync_adr_components(&self) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let links = self
            .records
            .list_adr_components()
            .await
            .context("Failed to list ADR components")?;

        let mut result = SyncResult::default();
        for link in &links {
            result.merge(&push_adr_component(session.as_mut(), link).await?);
        }

        debug!(count = links.len(), "ADR components pushed");
        Ok(result)
    }
}

pub(crate) async fn push_adr_component(
    session: &mut dyn GraphSession,
    link: &AdrComponent,
) -> Result<SyncResult> {
    let mut result = SyncResult::default();
    result.link(session.merge_relationship(&mapping::affects(link)).await?);
    Ok(result)
}

pub(crate) async fn push_impact(
    records: &dyn RecordStore,
    session: &mut dyn GraphSession,
    impact: &AdrComponentInstance,
) -> Result<SyncResult> {
    let mut result = SyncResult::default();
    result.link(
        session
            .merge_relationship(&mapping::affects_instance(impact))
            .await?,
    );

    let Some(instance) = records
        .get_component_instance(impact.instance_id)
        .await
        .context("Failed to load impacted instance")?
    else {
        return Ok(result);
    };

    let link = AdrComponent {
        adr_id: impact.adr_id,
        component_id: instance.component_id,
    };
    if derive_adr_component(records, &link).await? {
        result.derived_rows_created += 1;
    }
    result.merge(&push_adr_component(session, &link).await?);
    Ok(result)
}

/// Insert the ADRComponent row unless it exists. A concurrent insert that
/// wins the race counts as existing.
async fn derive_adr_component(records: &dyn RecordStore, link: &AdrComponent) -> Result<bool> {
    if records
        .find_adr_component(link.adr_id, link.component_id)
        .await
        .context("Failed to look up ADR component")?
        .is_some()
    {
        return Ok(false);
    }

    match records
        .create_adr_component(link.adr_id, link.component_id)
        .await
    {
        Ok(_) => {
            info!(
                adr_id = link.adr_id,
                component_id = link.component_id,
                "Derived ADR component impact"
            );
            Ok(true)
        }
        Err(DbError::UniqueViolation(_)) => Ok(false),
        Err(e) => Err(e).context("Failed to derive ADR component"),
    }
}

#[cfg(test)]
mod tests {
    use beaver_core::model::{ComponentInput, ComponentInstanceInput, AdrComponentInstanceInput};
    use beaver_db::RecordStore;

    use crate::fixtures::{seed_catalog, Fixture};
    use crate::store::{PropValue, RelType};

    #[tokio::test]
    async fn test_impact_derives_adr_component_once() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        assert!(fx.db.list_adr_components().await.unwrap().is_empty());

        let first = fx.sync.run_full_sync().await.unwrap();
        let second = fx.sync.run_full_sync().await.unwrap();

        assert_eq!(first.derived_rows_created, 1);
        assert_eq!(second.derived_rows_created, 0);
        let rows = fx.db.list_adr_components().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].adr_id, rows[0].component_id), (cat.adr, cat.component));
        assert_eq!(fx.graph.relationship_count(RelType::Affects), 1);
        assert!(fx.graph.relationship(RelType::Affects, cat.adr, cat.component).is_some());
    }

    #[tokio::test]
    async fn test_existing_adr_component_is_reused() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.db.create_adr_component(cat.adr, cat.component).await.unwrap();

        let result = fx.sync.run_full_sync().await.unwrap();

        assert_eq!(result.derived_rows_created, 0);
        assert_eq!(fx.db.list_adr_components().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_two_instances_of_one_component_derive_one_row() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        let staging = fx
            .db
            .create_component_instance(&ComponentInstanceInput::new(cat.component, cat.development))
            .await
            .unwrap();
        fx.db
            .create_adr_component_instance(&AdrComponentInstanceInput::new(cat.adr, staging.id))
            .await
            .unwrap();

        let result = fx.sync.run_full_sync().await.unwrap();

        assert_eq!(result.derived_rows_created, 1);
        assert_eq!(fx.graph.relationship_count(RelType::AffectsInstance), 2);
        assert_eq!(fx.graph.relationship_count(RelType::Affects), 1);
    }

    #[tokio::test]
    async fn test_impact_carries_level_and_notes() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        let other = fx.db.create_component(&ComponentInput::named("gateway")).await.unwrap();
        let instance = fx
            .db
            .create_component_instance(&ComponentInstanceInput::new(other.id, cat.production))
            .await
            .unwrap();
        let mut input = AdrComponentInstanceInput::new(cat.adr, instance.id);
        input.impact_level = beaver_core::model::ImpactLevel::High;
        input.notes = Some("needs TLS 1.3".to_string());
        fx.db.create_adr_component_instance(&input).await.unwrap();

        fx.sync.run_full_sync().await.unwrap();

        let rel = fx
            .graph
            .relationship(RelType::AffectsInstance, cat.adr, instance.id)
            .unwrap();
        assert_eq!(rel["impact_level"], PropValue::Str("HIGH".into()));
        assert_eq!(rel["notes"], PropValue::Str("needs TLS 1.3".into()));
        assert!(fx.graph.relationship(RelType::Affects, cat.adr, other.id).is_some());
    }
}
