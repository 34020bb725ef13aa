//! # Beaver Graph
//!
//! Keeps the Neo4j read-model in step with the relational record store.
//!
//! Provides the graph store boundary and its neo4rs client, per-entity sync
//! routines and hooks, integrity validation and repair, the catalogue
//! mutation service and the migration runner.

pub mod client;
pub mod cypher;
pub mod deadline;
pub mod hooks;
pub mod integrity;
pub mod migration;
pub mod schema;
pub mod service;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{GraphClient, GraphCounts};
pub use hooks::{EntityRef, SyncHooks};
pub use integrity::{
    Correction, CorrectionStatus, Discrepancy, IntegrityRepair, IntegrityValidator, RepairAction,
    RepairReport, ValidationReport,
};
pub use migration::{MigrationReport, MigrationRunner, MigrationStep, StepStatus};
pub use service::{CatalogService, MutationOutcome, ServiceError, ServiceResult};
pub use store::{GraphSession, GraphStore, NodeLabel, RelType};
pub use sync::{SyncResult, Synchronizer};
