//! Orphan healing and stale-entry pruning.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{debug, info};

use beaver_core::EntityKind;
use beaver_db::RecordStore;

use crate::store::{GraphSession, GraphShape, NodeLabel};
use crate::sync;

/// Re-link orphaned or mislinked instance nodes whose row still exists;
/// delete the rest.
pub(crate) async fn fix_instances(
    records: &dyn RecordStore,
    session: &mut dyn GraphSession,
    ids: &[i64],
) -> Result<usize> {
    let mut affected = 0;
    for &id in ids {
        let Some(instance) = records
            .get_component_instance(id)
            .await
            .context("Failed to load component instance")?
        else {
            if session.delete_node(NodeLabel::ComponentInstance, id).await? {
                info!(instance_id = id, "Deleted instance node without row");
                affected += 1;
            }
            continue;
        };

        if let Some(component) = records
            .get_component(instance.component_id)
            .await
            .context("Failed to load component")?
        {
            sync::push_component(session, &component).await?;
        }
        if let Some(env) = records
            .get_environment(instance.environment_id)
            .await
            .context("Failed to load environment")?
        {
            sync::push_environment(session, &env).await?;
        }
        sync::push_instance(session, &instance).await?;

        debug!(instance_id = id, "Re-linked instance");
        affected += 1;
    }
    Ok(affected)
}

/// Refresh component nodes and point MANAGED_BY at their current team; delete
/// nodes whose row is gone.
pub(crate) async fn fix_components(
    records: &dyn RecordStore,
    session: &mut dyn GraphSession,
    ids: &[i64],
) -> Result<usize> {
    let mut affected = 0;
    for &id in ids {
        let Some(component) = records
            .get_component(id)
            .await
            .context("Failed to load component")?
        else {
            if session.delete_node(NodeLabel::Component, id).await? {
                info!(component_id = id, "Deleted component node without row");
                affected += 1;
            }
            continue;
        };

        sync::push_component(session, &component).await?;
        if let Some(team_id) = component.team_id {
            if let Some(team) = records.get_team(team_id).await.context("Failed to load team")? {
                sync::push_team(session, &team).await?;
            }
        }
        sync::push_managed_by(session, &component).await?;

        debug!(component_id = id, "Re-linked component");
        affected += 1;
    }
    Ok(affected)
}

/// Delete graph nodes or relationships of `kind` with no relational
/// counterpart. Returns the number removed.
pub(crate) async fn prune_stale(
    records: &dyn RecordStore,
    session: &mut dyn GraphSession,
    kind: EntityKind,
) -> Result<usize> {
    let mut removed = 0;
    match GraphShape::of(kind) {
        GraphShape::Node(label) => {
            let live = relational_ids(records, kind).await?;
            for id in session.node_ids(label).await? {
                if !live.contains(&id) && session.delete_node(label, id).await? {
                    removed += 1;
                }
            }
        }
        GraphShape::Edge(rel) => {
            let live = relational_pairs(records, kind).await?;
            for (from, to) in session.relationship_pairs(rel).await? {
                if !live.contains(&(from, to)) && session.delete_relationship(rel, from, to).await? {
                    removed += 1;
                }
            }
        }
    }

    if removed > 0 {
        info!(entity = %kind, removed, "Pruned stale graph entries");
    }
    Ok(removed)
}

async fn relational_ids(records: &dyn RecordStore, kind: EntityKind) -> Result<BTreeSet<i64>> {
    let ids = match kind {
        EntityKind::Environments => records.list_environments().await?.iter().map(|r| r.id).collect(),
        EntityKind::Teams => records.list_teams().await?.iter().map(|r| r.id).collect(),
        EntityKind::Components => records.list_components().await?.iter().map(|r| r.id).collect(),
        EntityKind::ComponentInstances => records
            .list_component_instances()
            .await?
            .iter()
            .map(|r| r.id)
            .collect(),
        EntityKind::Users => records.list_users().await?.iter().map(|r| r.id).collect(),
        EntityKind::Adrs => records.list_adrs().await?.iter().map(|r| r.id).collect(),
        EntityKind::AdrParticipants
        | EntityKind::AdrComponentInstances
        | EntityKind::AdrComponents => BTreeSet::new(),
    };
    Ok(ids)
}

/// Relationship endpoints in graph direction (start id, end id).
async fn relational_pairs(
    records: &dyn RecordStore,
    kind: EntityKind,
) -> Result<BTreeSet<(i64, i64)>> {
    let pairs = match kind {
        EntityKind::AdrParticipants => records
            .list_adr_participants()
            .await?
            .iter()
            .map(|p| (p.user_id, p.adr_id))
            .collect(),
        EntityKind::AdrComponentInstances => records
            .list_adr_component_instances()
            .await?
            .iter()
            .map(|i| (i.adr_id, i.instance_id))
            .collect(),
        EntityKind::AdrComponents => records
            .list_adr_components()
            .await?
            .iter()
            .map(|c| (c.adr_id, c.component_id))
            .collect(),
        EntityKind::Environments
        | EntityKind::Teams
        | EntityKind::Components
        | EntityKind::ComponentInstances
        | EntityKind::Users
        | EntityKind::Adrs => BTreeSet::new(),
    };
    Ok(pairs)
}
