//! Catalogue domain models.
//!
//! Rows mirror the relational tables; `*Input` structs carry the writable
//! fields for create and update.

pub mod adr;
pub mod catalog;

pub use adr::{
    Adr, AdrComponent, AdrComponentInstance, AdrComponentInstanceInput, AdrInput, AdrParticipant,
    AdrParticipantInput, AdrStatus, ImpactLevel, ParticipantRole, User, UserInput,
};
pub use catalog::{
    Category, Component, ComponentInput, ComponentInstance, ComponentInstanceInput,
    ComponentStatus, Environment, EnvironmentInput, Team, TeamInput, SEEDED_ENVIRONMENTS,
};
