//! Cross-store count and orphan validation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use beaver_core::{EntityKind, OrphanKind};
use beaver_db::RecordStore;

use super::report::{Discrepancy, EntityCounts, ValidationReport};
use crate::store::{graph_count, GraphSession, GraphStore};

/// Read-only comparison of the record store and the graph store.
#[derive(Clone)]
pub struct IntegrityValidator {
    records: Arc<dyn RecordStore>,
    graph: Arc<dyn GraphStore>,
}

impl IntegrityValidator {
    pub fn new(records: Arc<dyn RecordStore>, graph: Arc<dyn GraphStore>) -> Self {
        Self { records, graph }
    }

    /// Compare per-kind counts and look for orphaned or mislinked graph nodes.
    ///
    /// Store errors abort validation; inconsistencies are reported as
    /// [`Discrepancy`] values.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let mut session = self.graph.session().await?;

        let mut discrepancies = Vec::new();
        let mut counts_relational = EntityCounts::new();
        let mut counts_graph = EntityCounts::new();

        for kind in EntityKind::ALL {
            let relational = self
                .records
                .count(kind)
                .await
                .with_context(|| format!("Failed to count {kind} rows"))?;
            let graph = graph_count(session.as_mut(), kind)
                .await
                .with_context(|| format!("Failed to count {kind} in graph"))?;

            counts_relational.insert(kind, relational);
            counts_graph.insert(kind, graph);
            if relational != graph {
                discrepancies.push(Discrepancy::count(kind, relational, graph));
            }
        }

        for kind in OrphanKind::ALL {
            let ids = find_orphans(session.as_mut(), kind).await?;
            if !ids.is_empty() {
                discrepancies.push(Discrepancy::orphans(kind, ids));
            }
        }

        let report = ValidationReport::new(discrepancies, counts_relational, counts_graph);
        if report.valid {
            info!("Stores are consistent");
        } else {
            for d in &report.discrepancies {
                warn!(subject = d.subject(), ?d, "Integrity discrepancy");
            }
        }
        Ok(report)
    }
}

pub(crate) async fn find_orphans(session: &mut dyn GraphSession, kind: OrphanKind) -> Result<Vec<i64>> {
    match kind {
        OrphanKind::Instances => session.orphaned_instances().await,
        OrphanKind::UnmanagedComponents => session.unmanaged_components().await,
        OrphanKind::MislinkedComponents => session.mislinked_components().await,
        OrphanKind::MislinkedInstances => session.mislinked_instances().await,
    }
}
