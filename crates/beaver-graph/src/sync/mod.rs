//! Record store to graph store synchronization.
//!
//! One routine per entity kind. Each routine acquires a single graph session,
//! scans its table and pushes every row with an idempotent merge. Routines
//! never delete nodes; stale entries are pruned by the repair pass. The
//! single-valued links (MANAGED_BY, INSTANTIATES, DEPLOYED_IN) are re-pointed
//! when the row's foreign key changes.

pub mod mapping;

mod adr_sync;
mod component_sync;
mod environment_sync;
mod impact_sync;
mod team_sync;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use beaver_core::EntityKind;
use beaver_db::RecordStore;

use crate::store::GraphStore;

pub(crate) use adr_sync::{push_adr, push_participant, push_user};
pub(crate) use component_sync::{push_component, push_instance};
pub(crate) use environment_sync::push_environment;
pub(crate) use impact_sync::{push_adr_component, push_impact};
pub(crate) use team_sync::{push_managed_by, push_team};

/// Result of a sync operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub nodes_upserted: usize,
    pub relationships_merged: usize,
    /// Relationship merges skipped because an endpoint node was missing.
    pub relationships_skipped: usize,
    /// Relational rows inserted as a side effect (ADRComponent derivation).
    pub derived_rows_created: usize,
    /// Single-valued links removed because the row now points elsewhere.
    pub relationships_removed: usize,
}

impl SyncResult {
    pub fn merge(&mut self, other: &SyncResult) {
        self.nodes_upserted += other.nodes_upserted;
        self.relationships_merged += other.relationships_merged;
        self.relationships_skipped += other.relationships_skipped;
        self.derived_rows_created += other.derived_rows_created;
        self.relationships_removed += other.relationships_removed;
    }

    pub(crate) fn node() -> Self {
        Self {
            nodes_upserted: 1,
            ..Self::default()
        }
    }

    pub(crate) fn link(&mut self, linked: bool) {
        if linked {
            self.relationships_merged += 1;
        } else {
            self.relationships_skipped += 1;
        }
    }
}

/// Pushes record store rows into the graph store.
#[derive(Clone)]
pub struct Synchronizer {
    records: Arc<dyn RecordStore>,
    graph: Arc<dyn GraphStore>,
}

impl Synchronizer {
    pub fn new(records: Arc<dyn RecordStore>, graph: Arc<dyn GraphStore>) -> Self {
        Self { records, graph }
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    /// Run the routine for one entity kind.
    pub async fn sync_kind(&self, kind: EntityKind) -> Result<SyncResult> {
        match kind {
            EntityKind::Environments => self.sync_environments().await,
            EntityKind::Components => self.sync_components().await,
            EntityKind::Teams => self.sync_teams().await,
            EntityKind::ComponentInstances => self.sync_component_instances().await,
            EntityKind::Users => self.sync_users().await,
            EntityKind::Adrs => self.sync_adrs().await,
            EntityKind::AdrParticipants => self.sync_adr_participants().await,
            EntityKind::AdrComponentInstances => self.sync_adr_component_instances().await,
            EntityKind::AdrComponents => self.sync_adr_components().await,
        }
    }

    /// Run the given routines in order, stopping at the first failure.
    pub async fn sync_kinds(&self, kinds: &[EntityKind]) -> Result<SyncResult> {
        let mut total = SyncResult::default();
        for &kind in kinds {
            let result = self
                .sync_kind(kind)
                .await
                .with_context(|| format!("Failed to sync {kind}"))?;
            info!(
                entity = %kind,
                nodes = result.nodes_upserted,
                rels = result.relationships_merged,
                skipped = result.relationships_skipped,
                "Synced"
            );
            total.merge(&result);
        }
        Ok(total)
    }

    /// Run every routine in dependency order.
    pub async fn run_full_sync(&self) -> Result<SyncResult> {
        info!("Starting full graph sync");
        let total = self.sync_kinds(&EntityKind::ALL).await?;
        info!(
            nodes = total.nodes_upserted,
            relationships = total.relationships_merged,
            skipped = total.relationships_skipped,
            derived = total.derived_rows_created,
            "Full sync complete"
        );
        Ok(total)
    }
}
