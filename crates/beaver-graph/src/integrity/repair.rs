//! Integrity repair: dispatch corrective actions for each discrepancy, then
//! re-validate.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use beaver_core::{EntityKind, OrphanKind, RepairMode};
use beaver_db::RecordStore;

use super::orphans;
use super::report::{Discrepancy, ValidationReport};
use super::validator::{find_orphans, IntegrityValidator};
use crate::store::GraphStore;
use crate::sync::Synchronizer;

/// What repair does about one discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectiveAction {
    /// Re-run the sync routine for the kind.
    Resync(EntityKind),
    /// Delete graph entries of the kind with no relational row.
    Prune(EntityKind),
    /// Run the orphan fixer.
    FixOrphans(OrphanKind),
}

impl CorrectiveAction {
    pub fn for_discrepancy(discrepancy: &Discrepancy) -> Vec<Self> {
        match discrepancy {
            Discrepancy::Count { entity, .. } => vec![Self::Resync(*entity), Self::Prune(*entity)],
            Discrepancy::Orphans { kind, .. } => vec![Self::FixOrphans(*kind)],
        }
    }

    pub fn action(&self) -> RepairAction {
        match self {
            Self::Resync(_) => RepairAction::Resync,
            Self::Prune(_) => RepairAction::Prune,
            Self::FixOrphans(_) => RepairAction::Fix,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Self::Resync(kind) | Self::Prune(kind) => kind.as_str(),
            Self::FixOrphans(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairAction {
    Resync,
    Prune,
    Fix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CorrectionStatus {
    Success,
    Failed { reason: String },
}

/// One attempted corrective action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub entity: String,
    pub action: RepairAction,
    #[serde(flatten)]
    pub status: CorrectionStatus,
    /// Nodes, relationships or rows touched by the action.
    pub affected: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Whether the post-repair validation found the stores consistent.
    pub fixed: bool,
    pub corrections: Vec<Correction>,
    /// Discrepancies still present after repair.
    pub remaining: Vec<Discrepancy>,
}

/// Validates, repairs what it can and validates again.
#[derive(Clone)]
pub struct IntegrityRepair {
    records: Arc<dyn RecordStore>,
    graph: Arc<dyn GraphStore>,
    validator: IntegrityValidator,
    synchronizer: Synchronizer,
    mode: RepairMode,
}

impl IntegrityRepair {
    pub fn new(records: Arc<dyn RecordStore>, graph: Arc<dyn GraphStore>, mode: RepairMode) -> Self {
        Self {
            validator: IntegrityValidator::new(records.clone(), graph.clone()),
            synchronizer: Synchronizer::new(records.clone(), graph.clone()),
            records,
            graph,
            mode,
        }
    }

    /// Repair every discrepancy found by validation.
    ///
    /// A consistent pair of stores is left untouched. In
    /// [`RepairMode::FailFast`] the first failing action aborts with its error;
    /// otherwise failures are recorded and the remaining actions still run.
    pub async fn repair(&self) -> Result<RepairReport> {
        let initial = self.validator.validate().await.context("Initial validation failed")?;
        if initial.valid {
            info!("Nothing to repair");
            return Ok(RepairReport {
                fixed: true,
                corrections: Vec::new(),
                remaining: Vec::new(),
            });
        }

        let mut corrections = Vec::new();
        for action in plan(&initial) {
            match self.apply(action).await {
                Ok(affected) => {
                    info!(entity = action.subject(), action = ?action.action(), affected, "Correction applied");
                    corrections.push(Correction {
                        entity: action.subject().to_string(),
                        action: action.action(),
                        status: CorrectionStatus::Success,
                        affected,
                    });
                }
                Err(e) if self.mode == RepairMode::FailFast => {
                    return Err(e.context(format!("Repair aborted at {action:?}")));
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(entity = action.subject(), error = %reason, "Correction failed");
                    corrections.push(Correction {
                        entity: action.subject().to_string(),
                        action: action.action(),
                        status: CorrectionStatus::Failed { reason },
                        affected: 0,
                    });
                }
            }
        }

        let last = self.validator.validate().await.context("Final validation failed")?;
        info!(fixed = last.valid, remaining = last.discrepancies.len(), "Repair complete");
        Ok(RepairReport {
            fixed: last.valid,
            corrections,
            remaining: last.discrepancies,
        })
    }

    async fn apply(&self, action: CorrectiveAction) -> Result<usize> {
        match action {
            CorrectiveAction::Resync(kind) => {
                let result = self.synchronizer.sync_kind(kind).await?;
                Ok(result.nodes_upserted
                    + result.relationships_merged
                    + result.relationships_removed
                    + result.derived_rows_created)
            }
            CorrectiveAction::Prune(kind) => {
                let mut session = self.graph.session().await?;
                orphans::prune_stale(self.records.as_ref(), session.as_mut(), kind).await
            }
            CorrectiveAction::FixOrphans(kind) => {
                let mut session = self.graph.session().await?;
                let ids = find_orphans(session.as_mut(), kind).await?;
                match kind {
                    OrphanKind::Instances | OrphanKind::MislinkedInstances => {
                        orphans::fix_instances(self.records.as_ref(), session.as_mut(), &ids).await
                    }
                    OrphanKind::UnmanagedComponents | OrphanKind::MislinkedComponents => {
                        orphans::fix_components(self.records.as_ref(), session.as_mut(), &ids).await
                    }
                }
            }
        }
    }
}

/// Actions for every discrepancy, in report order, without repeats.
fn plan(report: &ValidationReport) -> Vec<CorrectiveAction> {
    let mut actions: Vec<CorrectiveAction> = Vec::new();
    for action in report.discrepancies.iter().flat_map(CorrectiveAction::for_discrepancy) {
        if !actions.contains(&action) {
            actions.push(action);
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaver_core::model::{EnvironmentInput, TeamInput};

    use crate::fixtures::{seed_catalog, Fixture};
    use crate::store::{NodeLabel, Props, RelType};

    fn repairer(fx: &Fixture, mode: RepairMode) -> IntegrityRepair {
        IntegrityRepair::new(fx.db.clone(), Arc::new(fx.graph.clone()), mode)
    }

    #[test]
    fn test_count_discrepancy_maps_to_resync_then_prune() {
        let d = Discrepancy::count(EntityKind::Teams, 2, 1);
        assert_eq!(
            CorrectiveAction::for_discrepancy(&d),
            vec![
                CorrectiveAction::Resync(EntityKind::Teams),
                CorrectiveAction::Prune(EntityKind::Teams)
            ]
        );
        let d = Discrepancy::orphans(OrphanKind::Instances, vec![1]);
        assert_eq!(
            CorrectiveAction::for_discrepancy(&d),
            vec![CorrectiveAction::FixOrphans(OrphanKind::Instances)]
        );
    }

    #[tokio::test]
    async fn test_repair_of_consistent_stores_writes_nothing() {
        let fx = Fixture::new();
        seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        let graph_writes = fx.graph.writes();
        let db_changes = fx.db.total_changes().unwrap();

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed);
        assert!(report.corrections.is_empty());
        assert_eq!(fx.graph.writes(), graph_writes);
        assert_eq!(fx.db.total_changes().unwrap(), db_changes);
    }

    #[tokio::test]
    async fn test_missing_environments_are_resynced() {
        let fx = Fixture::new();
        for name in ["a", "b", "c", "d", "e"] {
            fx.db.create_environment(&EnvironmentInput::named(name)).await.unwrap();
        }
        fx.sync.sync_environments().await.unwrap();
        fx.graph.remove_node(NodeLabel::Environment, 1);
        fx.graph.remove_node(NodeLabel::Environment, 2);

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed);
        assert_eq!(report.corrections.len(), 2);
        assert_eq!(report.corrections[0].action, RepairAction::Resync);
        assert_eq!(report.corrections[0].entity, "environments");
        assert_eq!(report.corrections[1].action, RepairAction::Prune);
        assert_eq!(report.corrections[1].affected, 0);
        assert_eq!(fx.graph.node_ids(NodeLabel::Environment).len(), 5);
    }

    #[tokio::test]
    async fn test_stale_environments_are_pruned() {
        let fx = Fixture::new();
        for name in ["a", "b", "c"] {
            fx.db.create_environment(&EnvironmentInput::named(name)).await.unwrap();
        }
        fx.sync.sync_environments().await.unwrap();
        fx.graph.insert_node(NodeLabel::Environment, 40, Props::new());
        fx.graph.insert_node(NodeLabel::Environment, 41, Props::new());

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed);
        assert_eq!(report.corrections[1].affected, 2);
        assert_eq!(fx.graph.node_ids(NodeLabel::Environment).len(), 3);
    }

    #[tokio::test]
    async fn test_orphaned_instances_are_healed_or_deleted() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        fx.graph
            .remove_relationship(RelType::DeployedIn, cat.instance, cat.production);

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed, "{:?}", report.remaining);
        assert_eq!(report.corrections.len(), 1);
        assert_eq!(report.corrections[0].entity, "orphanedInstances");
        assert_eq!(report.corrections[0].action, RepairAction::Fix);
        assert!(fx
            .graph
            .relationship(RelType::DeployedIn, cat.instance, cat.production)
            .is_some());
    }

    #[tokio::test]
    async fn test_deleted_environment_is_pruned_with_its_instances() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        // Cascades to the instance and its ADR impact.
        fx.db.delete_environment(cat.production).await.unwrap();

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed, "{:?}", report.remaining);
        let pruned: Vec<_> = report
            .corrections
            .iter()
            .filter(|c| c.action == RepairAction::Prune && c.affected > 0)
            .map(|c| c.entity.as_str())
            .collect();
        assert_eq!(pruned, vec!["environments", "componentInstances"]);
        assert_eq!(fx.graph.node_ids(NodeLabel::Environment), vec![cat.development]);
        assert!(fx.graph.node_ids(NodeLabel::ComponentInstance).is_empty());
        assert_eq!(fx.graph.relationship_count(RelType::DeployedIn), 0);
        assert_eq!(fx.graph.relationship_count(RelType::AffectsInstance), 0);
    }

    #[tokio::test]
    async fn test_mislinked_edges_are_repointed() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        let platform = fx.db.create_team(&TeamInput::named("platform")).await.unwrap();
        fx.sync.run_full_sync().await.unwrap();
        fx.graph
            .insert_relationship(RelType::ManagedBy, cat.component, platform.id);
        fx.graph
            .insert_relationship(RelType::DeployedIn, cat.instance, cat.development);

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(report.fixed, "{:?}", report.remaining);
        let fixed: Vec<_> = report.corrections.iter().map(|c| c.entity.as_str()).collect();
        assert_eq!(fixed, vec!["mislinkedComponents", "mislinkedInstances"]);
        assert_eq!(fx.graph.relationship_count(RelType::ManagedBy), 1);
        assert!(fx
            .graph
            .relationship(RelType::ManagedBy, cat.component, cat.team)
            .is_some());
        assert_eq!(fx.graph.relationship_count(RelType::DeployedIn), 1);
        assert!(fx
            .graph
            .relationship(RelType::DeployedIn, cat.instance, cat.production)
            .is_some());
    }

    #[tokio::test]
    async fn test_failures_recorded_in_continue_mode() {
        let fx = Fixture::new();
        fx.db.create_environment(&EnvironmentInput::named("qa")).await.unwrap();
        fx.graph.fail_upserts_of(Some(NodeLabel::Environment));

        let report = repairer(&fx, RepairMode::Continue).repair().await.unwrap();

        assert!(!report.fixed);
        assert!(matches!(
            report.corrections[0].status,
            CorrectionStatus::Failed { .. }
        ));
        assert_eq!(report.corrections[1].status, CorrectionStatus::Success);
        assert_eq!(report.remaining.len(), 1);
        assert_eq!(fx.graph.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_first_failure() {
        let fx = Fixture::new();
        fx.db.create_environment(&EnvironmentInput::named("qa")).await.unwrap();
        fx.graph.fail_upserts_of(Some(NodeLabel::Environment));

        let err = repairer(&fx, RepairMode::FailFast).repair().await.unwrap_err();

        assert!(format!("{err:#}").contains("Repair aborted"));
        assert_eq!(fx.graph.open_sessions(), 0);
    }

    #[test]
    fn test_correction_serializes_flat_status() {
        let c = Correction {
            entity: "teams".to_string(),
            action: RepairAction::Resync,
            status: CorrectionStatus::Failed {
                reason: "timeout".to_string(),
            },
            affected: 0,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["action"], "resync");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "timeout");
    }
}
