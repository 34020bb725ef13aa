//! Cross-store integrity: validation, orphan handling and repair.

mod orphans;
pub mod repair;
pub mod report;
pub mod validator;

pub use repair::{
    Correction, CorrectionStatus, CorrectiveAction, IntegrityRepair, RepairAction, RepairReport,
};
pub use report::{Discrepancy, EntityCounts, ValidationReport};
pub use validator::IntegrityValidator;
