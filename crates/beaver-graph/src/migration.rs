//! Ordered migration onto the dual-store layout.
//!
//! backup → schema → data → full sync → reference repair are fatal: the first
//! failure aborts the run. The closing extended sync is best-effort and only
//! produces a warning.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use beaver_core::{EntityKind, RepairMode};
use beaver_db::RecordStore;

use crate::deadline::bounded;
use crate::integrity::IntegrityRepair;
use crate::store::GraphStore;
use crate::sync::Synchronizer;

/// Kinds re-synced by the extended step.
const EXTENDED_KINDS: [EntityKind; 4] = [
    EntityKind::Components,
    EntityKind::Users,
    EntityKind::Adrs,
    EntityKind::AdrComponents,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStep {
    Backup,
    Schema,
    Data,
    FullSync,
    ReferenceRepair,
    ExtendedSync,
}

impl MigrationStep {
    pub const ALL: [MigrationStep; 6] = [
        MigrationStep::Backup,
        MigrationStep::Schema,
        MigrationStep::Data,
        MigrationStep::FullSync,
        MigrationStep::ReferenceRepair,
        MigrationStep::ExtendedSync,
    ];

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ExtendedSync)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Schema => "schema",
            Self::Data => "data",
            Self::FullSync => "full sync",
            Self::ReferenceRepair => "reference repair",
            Self::ExtendedSync => "extended sync",
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Warning { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: MigrationStep,
    #[serde(flatten)]
    pub status: StepStatus,
    pub detail: String,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub steps: Vec<StepReport>,
    pub backup_path: Option<PathBuf>,
}

impl MigrationReport {
    pub fn has_warnings(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Warning { .. }))
    }
}

pub struct MigrationRunner {
    records: Arc<dyn RecordStore>,
    graph: Arc<dyn GraphStore>,
    synchronizer: Synchronizer,
    backup_dir: PathBuf,
    step_timeout: Duration,
}

impl MigrationRunner {
    pub fn new(
        records: Arc<dyn RecordStore>,
        graph: Arc<dyn GraphStore>,
        backup_dir: PathBuf,
        step_timeout: Duration,
    ) -> Self {
        Self {
            synchronizer: Synchronizer::new(records.clone(), graph.clone()),
            records,
            graph,
            backup_dir,
            step_timeout,
        }
    }

    /// Run every step in order.
    pub async fn run(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        for step in MigrationStep::ALL {
            info!(%step, "Migration step started");
            let started = Instant::now();
            let outcome = bounded(self.step_timeout, step.as_str(), self.run_step(step, &mut report)).await;
            let elapsed_ms = started.elapsed().as_millis();

            let (status, detail) = match outcome {
                Ok(detail) => {
                    info!(%step, %detail, elapsed_ms, "Migration step completed");
                    (StepStatus::Completed, detail)
                }
                Err(e) if step.is_fatal() => {
                    return Err(e.context(format!("Migration step '{step}' failed")));
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(%step, error = %reason, "Best-effort migration step failed");
                    (StepStatus::Warning { reason }, String::new())
                }
            };
            report.steps.push(StepReport {
                step,
                status,
                detail,
                elapsed_ms,
            });
        }

        Ok(report)
    }

    async fn run_step(&self, step: MigrationStep, report: &mut MigrationReport) -> Result<String> {
        match step {
            MigrationStep::Backup => {
                let path = self
                    .records
                    .backup(&self.backup_dir)
                    .await
                    .context("Failed to back up record store")?;
                let detail = path.display().to_string();
                report.backup_path = Some(path);
                Ok(detail)
            }
            MigrationStep::Schema => {
                self.records
                    .apply_schema()
                    .await
                    .context("Failed to apply relational schema")?;
                self.graph
                    .initialize_schema()
                    .await
                    .context("Failed to initialize graph schema")?;
                Ok("relational and graph schema applied".to_string())
            }
            MigrationStep::Data => {
                let seeded = self.records.seed_environments().await?;
                let normalized = self.records.normalize_component_statuses().await?;
                Ok(format!(
                    "{seeded} environments seeded, {normalized} component statuses normalized"
                ))
            }
            MigrationStep::FullSync => {
                let result = self.synchronizer.run_full_sync().await?;
                Ok(format!(
                    "{} nodes, {} relationships",
                    result.nodes_upserted, result.relationships_merged
                ))
            }
            MigrationStep::ReferenceRepair => {
                let backfilled = self
                    .records
                    .backfill_adr_components()
                    .await
                    .context("Failed to backfill ADR components")?;
                let result = self.synchronizer.sync_adr_components().await?;
                Ok(format!(
                    "{} ADR component rows backfilled, {} AFFECTS relationships",
                    backfilled.len(),
                    result.relationships_merged
                ))
            }
            MigrationStep::ExtendedSync => {
                let result = self.synchronizer.sync_kinds(&EXTENDED_KINDS).await?;
                let repair = IntegrityRepair::new(
                    self.records.clone(),
                    self.graph.clone(),
                    RepairMode::Continue,
                )
                .repair()
                .await?;
                if !repair.fixed {
                    bail!(
                        "{} discrepancies remain after repair",
                        repair.remaining.len()
                    );
                }
                Ok(format!(
                    "{} nodes refreshed, {} corrections",
                    result.nodes_upserted,
                    repair.corrections.len()
                ))
            }
        }
    }
}
