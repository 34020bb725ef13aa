//! Validation report types.

use std::collections::BTreeMap;

use serde::Serialize;

use beaver_core::{EntityKind, OrphanKind};

/// Per-kind counts for one store.
pub type EntityCounts = BTreeMap<EntityKind, i64>;

/// A single cross-store inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Discrepancy {
    /// Row and node/relationship counts disagree.
    #[serde(rename_all = "camelCase")]
    Count {
        entity: EntityKind,
        relational: i64,
        graph: i64,
        /// `relational - graph`: positive means rows are missing from the graph.
        difference: i64,
    },
    /// Graph nodes missing a required relationship or carrying a wrong one.
    #[serde(rename_all = "camelCase")]
    Orphans {
        kind: OrphanKind,
        count: usize,
        ids: Vec<i64>,
        description: String,
    },
}

impl Discrepancy {
    pub fn count(entity: EntityKind, relational: i64, graph: i64) -> Self {
        Self::Count {
            entity,
            relational,
            graph,
            difference: relational - graph,
        }
    }

    pub fn orphans(kind: OrphanKind, ids: Vec<i64>) -> Self {
        let description = match kind {
            OrphanKind::Instances => {
                "ComponentInstance nodes without INSTANTIATES or DEPLOYED_IN relationships"
            }
            OrphanKind::UnmanagedComponents => {
                "Component nodes with a team_id but no MANAGED_BY relationship"
            }
            OrphanKind::MislinkedComponents => {
                "Component nodes with more than one MANAGED_BY, or one to a team other than team_id"
            }
            OrphanKind::MislinkedInstances => {
                "ComponentInstance nodes with more than one INSTANTIATES or DEPLOYED_IN, \
                 or one to an endpoint other than component_id/environment_id"
            }
        };
        Self::Orphans {
            kind,
            count: ids.len(),
            ids,
            description: description.to_string(),
        }
    }

    /// Report name of the entity or orphan set.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Count { entity, .. } => entity.as_str(),
            Self::Orphans { kind, .. } => kind.as_str(),
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub discrepancies: Vec<Discrepancy>,
    pub counts_relational: EntityCounts,
    pub counts_graph: EntityCounts,
}

impl ValidationReport {
    pub fn new(
        discrepancies: Vec<Discrepancy>,
        counts_relational: EntityCounts,
        counts_graph: EntityCounts,
    ) -> Self {
        Self {
            valid: discrepancies.is_empty(),
            discrepancies,
            counts_relational,
            counts_graph,
        }
    }
}
