//! The record store boundary consumed by the synchronizer.
//!
//! Every operation is an independent round trip; nothing here spans more
//! than one call except the transactions the SQLite queries open internally.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use beaver_core::model::*;
use beaver_core::EntityKind;

use crate::migrations;
use crate::pool::{DbPool, DbResult};
use crate::queries::{self, adrs, components, environments, impacts, instances, participants, teams, users};

/// Typed CRUD access to the relational source of truth.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ========================================================================
    // Environments
    // ========================================================================

    async fn list_environments(&self) -> DbResult<Vec<Environment>>;
    async fn get_environment(&self, id: i64) -> DbResult<Option<Environment>>;
    async fn create_environment(&self, input: &EnvironmentInput) -> DbResult<Environment>;
    async fn update_environment(&self, id: i64, input: &EnvironmentInput) -> DbResult<Environment>;
    async fn delete_environment(&self, id: i64) -> DbResult<bool>;

    // ========================================================================
    // Teams
    // ========================================================================

    async fn list_teams(&self) -> DbResult<Vec<Team>>;
    async fn get_team(&self, id: i64) -> DbResult<Option<Team>>;
    async fn create_team(&self, input: &TeamInput) -> DbResult<Team>;
    async fn update_team(&self, id: i64, input: &TeamInput) -> DbResult<Team>;
    async fn delete_team(&self, id: i64) -> DbResult<bool>;

    // ========================================================================
    // Components
    // ========================================================================

    async fn create_category(&self, name: &str) -> DbResult<Category>;
    async fn list_components(&self) -> DbResult<Vec<Component>>;
    async fn get_component(&self, id: i64) -> DbResult<Option<Component>>;
    async fn create_component(&self, input: &ComponentInput) -> DbResult<Component>;
    async fn update_component(&self, id: i64, input: &ComponentInput) -> DbResult<Component>;
    async fn delete_component(&self, id: i64) -> DbResult<bool>;

    // ========================================================================
    // Component instances
    // ========================================================================

    async fn list_component_instances(&self) -> DbResult<Vec<ComponentInstance>>;
    async fn get_component_instance(&self, id: i64) -> DbResult<Option<ComponentInstance>>;
    async fn create_component_instance(
        &self,
        input: &ComponentInstanceInput,
    ) -> DbResult<ComponentInstance>;
    async fn update_component_instance(
        &self,
        id: i64,
        input: &ComponentInstanceInput,
    ) -> DbResult<ComponentInstance>;
    async fn delete_component_instance(&self, id: i64) -> DbResult<bool>;

    // ========================================================================
    // Users and ADRs
    // ========================================================================

    async fn list_users(&self) -> DbResult<Vec<User>>;
    async fn get_user(&self, id: i64) -> DbResult<Option<User>>;
    async fn create_user(&self, input: &UserInput) -> DbResult<User>;
    async fn delete_user(&self, id: i64) -> DbResult<bool>;

    async fn list_adrs(&self) -> DbResult<Vec<Adr>>;
    async fn get_adr(&self, id: i64) -> DbResult<Option<Adr>>;
    /// Creates the ADR and its first OWNER participant atomically.
    async fn create_adr(&self, input: &AdrInput, owner_user_id: i64) -> DbResult<Adr>;
    async fn update_adr(&self, id: i64, input: &AdrInput) -> DbResult<Adr>;
    async fn delete_adr(&self, id: i64) -> DbResult<bool>;

    // ========================================================================
    // ADR associations
    // ========================================================================

    async fn list_adr_participants(&self) -> DbResult<Vec<AdrParticipant>>;
    async fn get_adr_participant(&self, id: i64) -> DbResult<Option<AdrParticipant>>;
    async fn find_adr_participant(
        &self,
        adr_id: i64,
        user_id: i64,
    ) -> DbResult<Option<AdrParticipant>>;
    async fn add_adr_participant(&self, input: &AdrParticipantInput) -> DbResult<AdrParticipant>;
    /// Rejects demoting the ADR's last OWNER.
    async fn update_participant_role(
        &self,
        id: i64,
        role: ParticipantRole,
    ) -> DbResult<AdrParticipant>;
    /// Rejects removing the ADR's last OWNER.
    async fn remove_adr_participant(&self, id: i64) -> DbResult<AdrParticipant>;

    async fn list_adr_component_instances(&self) -> DbResult<Vec<AdrComponentInstance>>;
    async fn get_adr_component_instance(&self, id: i64)
        -> DbResult<Option<AdrComponentInstance>>;
    async fn find_adr_component_instance(
        &self,
        adr_id: i64,
        instance_id: i64,
    ) -> DbResult<Option<AdrComponentInstance>>;
    async fn create_adr_component_instance(
        &self,
        input: &AdrComponentInstanceInput,
    ) -> DbResult<AdrComponentInstance>;
    async fn update_adr_component_instance(
        &self,
        id: i64,
        input: &AdrComponentInstanceInput,
    ) -> DbResult<AdrComponentInstance>;
    async fn delete_adr_component_instance(&self, id: i64) -> DbResult<bool>;

    async fn list_adr_components(&self) -> DbResult<Vec<AdrComponent>>;
    async fn find_adr_component(
        &self,
        adr_id: i64,
        component_id: i64,
    ) -> DbResult<Option<AdrComponent>>;
    async fn create_adr_component(&self, adr_id: i64, component_id: i64) -> DbResult<AdrComponent>;
    async fn delete_adr_component(&self, adr_id: i64, component_id: i64) -> DbResult<bool>;

    // ========================================================================
    // Aggregates and maintenance
    // ========================================================================

    /// Row count for an entity kind.
    async fn count(&self, kind: EntityKind) -> DbResult<i64>;

    async fn apply_schema(&self) -> DbResult<()>;
    async fn backup(&self, dir: &Path) -> DbResult<PathBuf>;
    async fn seed_environments(&self) -> DbResult<usize>;
    async fn normalize_component_statuses(&self) -> DbResult<usize>;
    async fn backfill_adr_components(&self) -> DbResult<Vec<AdrComponent>>;
}

#[async_trait]
impl RecordStore for DbPool {
    async fn list_environments(&self) -> DbResult<Vec<Environment>> {
        environments::list_environments(self)
    }

    async fn get_environment(&self, id: i64) -> DbResult<Option<Environment>> {
        environments::get_environment(self, id)
    }

    async fn create_environment(&self, input: &EnvironmentInput) -> DbResult<Environment> {
        environments::create_environment(self, input)
    }

    async fn update_environment(&self, id: i64, input: &EnvironmentInput) -> DbResult<Environment> {
        environments::update_environment(self, id, input)
    }

    async fn delete_environment(&self, id: i64) -> DbResult<bool> {
        environments::delete_environment(self, id)
    }

    async fn list_teams(&self) -> DbResult<Vec<Team>> {
        teams::list_teams(self)
    }

    async fn get_team(&self, id: i64) -> DbResult<Option<Team>> {
        teams::get_team(self, id)
    }

    async fn create_team(&self, input: &TeamInput) -> DbResult<Team> {
        teams::create_team(self, input)
    }

    async fn update_team(&self, id: i64, input: &TeamInput) -> DbResult<Team> {
        teams::update_team(self, id, input)
    }

    async fn delete_team(&self, id: i64) -> DbResult<bool> {
        teams::delete_team(self, id)
    }

    async fn create_category(&self, name: &str) -> DbResult<Category> {
        components::create_category(self, name)
    }

    async fn list_components(&self) -> DbResult<Vec<Component>> {
        components::list_components(self)
    }

    async fn get_component(&self, id: i64) -> DbResult<Option<Component>> {
        components::get_component(self, id)
    }

    async fn create_component(&self, input: &ComponentInput) -> DbResult<Component> {
        components::create_component(self, input)
    }

    async fn update_component(&self, id: i64, input: &ComponentInput) -> DbResult<Component> {
        components::update_component(self, id, input)
    }

    async fn delete_component(&self, id: i64) -> DbResult<bool> {
        components::delete_component(self, id)
    }

    async fn list_component_instances(&self) -> DbResult<Vec<ComponentInstance>> {
        instances::list_component_instances(self)
    }

    async fn get_component_instance(&self, id: i64) -> DbResult<Option<ComponentInstance>> {
        instances::get_component_instance(self, id)
    }

    async fn create_component_instance(
        &self,
        input: &ComponentInstanceInput,
    ) -> DbResult<ComponentInstance> {
        instances::create_component_instance(self, input)
    }

    async fn update_component_instance(
        &self,
        id: i64,
        input: &ComponentInstanceInput,
    ) -> DbResult<ComponentInstance> {
        instances::update_component_instance(self, id, input)
    }

    async fn delete_component_instance(&self, id: i64) -> DbResult<bool> {
        instances::delete_component_instance(self, id)
    }

    async fn list_users(&self) -> DbResult<Vec<User>> {
        users::list_users(self)
    }

    async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        users::get_user(self, id)
    }

    async fn create_user(&self, input: &UserInput) -> DbResult<User> {
        users::create_user(self, input)
    }

    async fn delete_user(&self, id: i64) -> DbResult<bool> {
        users::delete_user(self, id)
    }

    async fn list_adrs(&self) -> DbResult<Vec<Adr>> {
        adrs::list_adrs(self)
    }

    async fn get_adr(&self, id: i64) -> DbResult<Option<Adr>> {
        adrs::get_adr(self, id)
    }

    async fn create_adr(&self, input: &AdrInput, owner_user_id: i64) -> DbResult<Adr> {
        adrs::create_adr(self, input, owner_user_id)
    }

    async fn update_adr(&self, id: i64, input: &AdrInput) -> DbResult<Adr> {
        adrs::update_adr(self, id, input)
    }

    async fn delete_adr(&self, id: i64) -> DbResult<bool> {
        adrs::delete_adr(self, id)
    }

    async fn list_adr_participants(&self) -> DbResult<Vec<AdrParticipant>> {
        participants::list_adr_participants(self)
    }

    async fn get_adr_participant(&self, id: i64) -> DbResult<Option<AdrParticipant>> {
        participants::get_adr_participant(self, id)
    }

    async fn find_adr_participant(
        &self,
        adr_id: i64,
        user_id: i64,
    ) -> DbResult<Option<AdrParticipant>> {
        participants::find_adr_participant(self, adr_id, user_id)
    }

    async fn add_adr_participant(&self, input: &AdrParticipantInput) -> DbResult<AdrParticipant> {
        participants::add_adr_participant(self, input)
    }

    async fn update_participant_role(
        &self,
        id: i64,
        role: ParticipantRole,
    ) -> DbResult<AdrParticipant> {
        participants::update_participant_role(self, id, role)
    }

    async fn remove_adr_participant(&self, id: i64) -> DbResult<AdrParticipant> {
        participants::remove_adr_participant(self, id)
    }

    async fn list_adr_component_instances(&self) -> DbResult<Vec<AdrComponentInstance>> {
        impacts::list_adr_component_instances(self)
    }

    async fn get_adr_component_instance(
        &self,
        id: i64,
    ) -> DbResult<Option<AdrComponentInstance>> {
        impacts::get_adr_component_instance(self, id)
    }

    async fn find_adr_component_instance(
        &self,
        adr_id: i64,
        instance_id: i64,
    ) -> DbResult<Option<AdrComponentInstance>> {
        impacts::find_adr_component_instance(self, adr_id, instance_id)
    }

    async fn create_adr_component_instance(
        &self,
        input: &AdrComponentInstanceInput,
    ) -> DbResult<AdrComponentInstance> {
        impacts::create_adr_component_instance(self, input)
    }

    async fn update_adr_component_instance(
        &self,
        id: i64,
        input: &AdrComponentInstanceInput,
    ) -> DbResult<AdrComponentInstance> {
        impacts::update_adr_component_instance(self, id, input)
    }

    async fn delete_adr_component_instance(&self, id: i64) -> DbResult<bool> {
        impacts::delete_adr_component_instance(self, id)
    }

    async fn list_adr_components(&self) -> DbResult<Vec<AdrComponent>> {
        impacts::list_adr_components(self)
    }

    async fn find_adr_component(
        &self,
        adr_id: i64,
        component_id: i64,
    ) -> DbResult<Option<AdrComponent>> {
        impacts::find_adr_component(self, adr_id, component_id)
    }

    async fn create_adr_component(&self, adr_id: i64, component_id: i64) -> DbResult<AdrComponent> {
        impacts::create_adr_component(self, adr_id, component_id)
    }

    async fn delete_adr_component(&self, adr_id: i64, component_id: i64) -> DbResult<bool> {
        impacts::delete_adr_component(self, adr_id, component_id)
    }

    async fn count(&self, kind: EntityKind) -> DbResult<i64> {
        queries::count(self, kind)
    }

    async fn apply_schema(&self) -> DbResult<()> {
        migrations::run_migrations(self)
    }

    async fn backup(&self, dir: &Path) -> DbResult<PathBuf> {
        migrations::backup(self, dir)
    }

    async fn seed_environments(&self) -> DbResult<usize> {
        migrations::data::seed_environments(self)
    }

    async fn normalize_component_statuses(&self) -> DbResult<usize> {
        migrations::data::normalize_component_statuses(self)
    }

    async fn backfill_adr_components(&self) -> DbResult<Vec<AdrComponent>> {
        migrations::data::backfill_adr_components(self)
    }
}
