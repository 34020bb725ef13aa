//! Beaver Core Library
//!
//! Domain models, entity kinds, configuration and error types shared by the
//! record store, the graph synchronizer and the CLI.

pub mod config;
pub mod error;
pub mod kind;
pub mod model;

pub use config::{
    BeaverConfig, DatabaseConfig, GraphConfig, MigrationConfig, RepairMode, SyncConfig, SyncPolicy,
};
pub use error::{BeaverError, BeaverResult};
pub use kind::{EntityKind, OrphanKind};
