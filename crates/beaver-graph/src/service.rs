//! Catalogue mutations with graph follow-up.
//!
//! Every mutation commits relationally first, then runs the matching sync
//! hook. A failed hook never rolls the relational write back; the
//! [`SyncPolicy`] decides whether it surfaces as a warning or an error.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use beaver_core::model::*;
use beaver_core::SyncPolicy;
use beaver_db::{DbError, RecordStore};

use crate::hooks::{EntityRef, SyncHooks};
use crate::store::GraphStore;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Record(#[from] DbError),

    #[error("Graph sync failed for {entity}: {reason}")]
    Sync { entity: String, reason: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// Both stores were updated.
    Synced(T),
    /// The relational write succeeded but the graph follow-up did not.
    SyncWarning { value: T, reason: String },
}

impl<T> MutationOutcome<T> {
    pub fn sync_failed(&self) -> bool {
        matches!(self, Self::SyncWarning { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Synced(value) | Self::SyncWarning { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Synced(value) | Self::SyncWarning { value, .. } => value,
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    records: Arc<dyn RecordStore>,
    hooks: SyncHooks,
    policy: SyncPolicy,
}

impl CatalogService {
    pub fn new(records: Arc<dyn RecordStore>, graph: Arc<dyn GraphStore>, policy: SyncPolicy) -> Self {
        Self {
            hooks: SyncHooks::new(records.clone(), graph),
            records,
            policy,
        }
    }

    fn settle<T, S>(
        &self,
        value: T,
        entity: EntityRef,
        sync: anyhow::Result<S>,
    ) -> ServiceResult<MutationOutcome<T>> {
        let Err(e) = sync else {
            return Ok(MutationOutcome::Synced(value));
        };
        let reason = format!("{e:#}");
        match self.policy {
            SyncPolicy::BestEffort => {
                warn!(%entity, error = %reason, "Graph sync failed, relational write kept");
                Ok(MutationOutcome::SyncWarning { value, reason })
            }
            SyncPolicy::Strict => Err(ServiceError::Sync {
                entity: entity.to_string(),
                reason,
            }),
        }
    }

    async fn created<T>(&self, value: T, entity: EntityRef) -> ServiceResult<MutationOutcome<T>> {
        let sync = self.hooks.on_entity_created(entity).await;
        self.settle(value, entity, sync)
    }

    async fn updated<T>(&self, value: T, entity: EntityRef) -> ServiceResult<MutationOutcome<T>> {
        let sync = self.hooks.on_entity_updated(entity).await;
        self.settle(value, entity, sync)
    }

    async fn deleted(&self, existed: bool, entity: EntityRef) -> ServiceResult<MutationOutcome<()>> {
        if !existed {
            return Err(DbError::NotFound(entity.to_string()).into());
        }
        let sync = self.hooks.on_entity_deleted(entity).await;
        self.settle((), entity, sync)
    }

    // ========================================================================
    // Environments and teams
    // ========================================================================

    pub async fn create_environment(
        &self,
        input: &EnvironmentInput,
    ) -> ServiceResult<MutationOutcome<Environment>> {
        let env = self.records.create_environment(input).await?;
        let entity = EntityRef::Environment(env.id);
        self.created(env, entity).await
    }

    pub async fn update_environment(
        &self,
        id: i64,
        input: &EnvironmentInput,
    ) -> ServiceResult<MutationOutcome<Environment>> {
        let env = self.records.update_environment(id, input).await?;
        self.updated(env, EntityRef::Environment(id)).await
    }

    /// Deletes the environment and, through the cascade, its instances.
    pub async fn delete_environment(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let instances: Vec<i64> = self
            .records
            .list_component_instances()
            .await?
            .into_iter()
            .filter(|i| i.environment_id == id)
            .map(|i| i.id)
            .collect();
        let existed = self.records.delete_environment(id).await?;
        self.cascade(existed, EntityRef::Environment(id), &instances).await
    }

    pub async fn create_team(&self, input: &TeamInput) -> ServiceResult<MutationOutcome<Team>> {
        let team = self.records.create_team(input).await?;
        let entity = EntityRef::Team(team.id);
        self.created(team, entity).await
    }

    pub async fn update_team(&self, id: i64, input: &TeamInput) -> ServiceResult<MutationOutcome<Team>> {
        let team = self.records.update_team(id, input).await?;
        self.updated(team, EntityRef::Team(id)).await
    }

    /// Deletes the team; its components become unmanaged and are refreshed.
    pub async fn delete_team(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let managed: Vec<i64> = self
            .records
            .list_components()
            .await?
            .into_iter()
            .filter(|c| c.team_id == Some(id))
            .map(|c| c.id)
            .collect();
        let existed = self.records.delete_team(id).await?;
        let outcome = self.deleted(existed, EntityRef::Team(id)).await?;

        let mut failures = Vec::new();
        for component_id in managed {
            if let Err(e) = self
                .hooks
                .on_entity_updated(EntityRef::Component(component_id))
                .await
            {
                failures.push(e);
            }
        }
        self.follow_up(outcome, EntityRef::Team(id), failures)
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub async fn create_component(
        &self,
        input: &ComponentInput,
    ) -> ServiceResult<MutationOutcome<Component>> {
        let component = self.records.create_component(input).await?;
        let entity = EntityRef::Component(component.id);
        self.created(component, entity).await
    }

    pub async fn update_component(
        &self,
        id: i64,
        input: &ComponentInput,
    ) -> ServiceResult<MutationOutcome<Component>> {
        let component = self.records.update_component(id, input).await?;
        self.updated(component, EntityRef::Component(id)).await
    }

    /// Deletes the component and, through the cascade, its instances.
    pub async fn delete_component(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let instances: Vec<i64> = self
            .records
            .list_component_instances()
            .await?
            .into_iter()
            .filter(|i| i.component_id == id)
            .map(|i| i.id)
            .collect();
        let existed = self.records.delete_component(id).await?;
        self.cascade(existed, EntityRef::Component(id), &instances).await
    }

    pub async fn create_component_instance(
        &self,
        input: &ComponentInstanceInput,
    ) -> ServiceResult<MutationOutcome<ComponentInstance>> {
        let instance = self.records.create_component_instance(input).await?;
        let entity = EntityRef::ComponentInstance(instance.id);
        self.created(instance, entity).await
    }

    pub async fn update_component_instance(
        &self,
        id: i64,
        input: &ComponentInstanceInput,
    ) -> ServiceResult<MutationOutcome<ComponentInstance>> {
        let instance = self.records.update_component_instance(id, input).await?;
        self.updated(instance, EntityRef::ComponentInstance(id)).await
    }

    pub async fn delete_component_instance(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let existed = self.records.delete_component_instance(id).await?;
        self.deleted(existed, EntityRef::ComponentInstance(id)).await
    }

    // ========================================================================
    // Users and ADRs
    // ========================================================================

    pub async fn create_user(&self, input: &UserInput) -> ServiceResult<MutationOutcome<User>> {
        let user = self.records.create_user(input).await?;
        let entity = EntityRef::User(user.id);
        self.created(user, entity).await
    }

    pub async fn delete_user(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let existed = self.records.delete_user(id).await?;
        self.deleted(existed, EntityRef::User(id)).await
    }

    /// Creates the ADR with `owner_user_id` as its first OWNER and pushes
    /// both the node and the owner's participation.
    pub async fn create_adr(
        &self,
        input: &AdrInput,
        owner_user_id: i64,
    ) -> ServiceResult<MutationOutcome<Adr>> {
        let adr = self.records.create_adr(input, owner_user_id).await?;
        let entity = EntityRef::Adr(adr.id);
        let mut sync = self.hooks.on_entity_created(entity).await;
        if sync.is_ok() {
            sync = self
                .hooks
                .on_entity_created(EntityRef::AdrParticipant {
                    adr_id: adr.id,
                    user_id: owner_user_id,
                })
                .await;
        }
        self.settle(adr, entity, sync)
    }

    pub async fn update_adr(&self, id: i64, input: &AdrInput) -> ServiceResult<MutationOutcome<Adr>> {
        let adr = self.records.update_adr(id, input).await?;
        self.updated(adr, EntityRef::Adr(id)).await
    }

    pub async fn delete_adr(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let existed = self.records.delete_adr(id).await?;
        self.deleted(existed, EntityRef::Adr(id)).await
    }

    // ========================================================================
    // ADR associations
    // ========================================================================

    pub async fn add_adr_participant(
        &self,
        input: &AdrParticipantInput,
    ) -> ServiceResult<MutationOutcome<AdrParticipant>> {
        let participant = self.records.add_adr_participant(input).await?;
        let entity = participant_ref(&participant);
        self.created(participant, entity).await
    }

    pub async fn update_participant_role(
        &self,
        id: i64,
        role: ParticipantRole,
    ) -> ServiceResult<MutationOutcome<AdrParticipant>> {
        let participant = self.records.update_participant_role(id, role).await?;
        let entity = participant_ref(&participant);
        self.updated(participant, entity).await
    }

    pub async fn remove_adr_participant(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let participant = self.records.remove_adr_participant(id).await?;
        self.deleted(true, participant_ref(&participant)).await
    }

    /// Records an instance impact; the hook derives the ADR component impact.
    pub async fn create_adr_component_instance(
        &self,
        input: &AdrComponentInstanceInput,
    ) -> ServiceResult<MutationOutcome<AdrComponentInstance>> {
        let impact = self.records.create_adr_component_instance(input).await?;
        let entity = impact_ref(&impact);
        self.created(impact, entity).await
    }

    pub async fn update_adr_component_instance(
        &self,
        id: i64,
        input: &AdrComponentInstanceInput,
    ) -> ServiceResult<MutationOutcome<AdrComponentInstance>> {
        let impact = self.records.update_adr_component_instance(id, input).await?;
        let entity = impact_ref(&impact);
        self.updated(impact, entity).await
    }

    pub async fn delete_adr_component_instance(&self, id: i64) -> ServiceResult<MutationOutcome<()>> {
        let impact = self
            .records
            .get_adr_component_instance(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("ADR component instance: {id}")))?;
        let existed = self.records.delete_adr_component_instance(id).await?;
        self.deleted(existed, impact_ref(&impact)).await
    }

    pub async fn create_adr_component(
        &self,
        adr_id: i64,
        component_id: i64,
    ) -> ServiceResult<MutationOutcome<AdrComponent>> {
        let link = self.records.create_adr_component(adr_id, component_id).await?;
        self.created(link, EntityRef::AdrComponent { adr_id, component_id }).await
    }

    pub async fn delete_adr_component(
        &self,
        adr_id: i64,
        component_id: i64,
    ) -> ServiceResult<MutationOutcome<()>> {
        let existed = self.records.delete_adr_component(adr_id, component_id).await?;
        self.deleted(existed, EntityRef::AdrComponent { adr_id, component_id })
            .await
    }

    /// Delete hook for a parent plus the instances removed by the cascade.
    async fn cascade(
        &self,
        existed: bool,
        parent: EntityRef,
        instances: &[i64],
    ) -> ServiceResult<MutationOutcome<()>> {
        let outcome = self.deleted(existed, parent).await?;
        let mut failures = Vec::new();
        for &id in instances {
            if let Err(e) = self.hooks.on_entity_deleted(EntityRef::ComponentInstance(id)).await {
                failures.push(e);
            }
        }
        self.follow_up(outcome, parent, failures)
    }

    fn follow_up(
        &self,
        outcome: MutationOutcome<()>,
        entity: EntityRef,
        mut failures: Vec<anyhow::Error>,
    ) -> ServiceResult<MutationOutcome<()>> {
        if outcome.sync_failed() || failures.is_empty() {
            return Ok(outcome);
        }
        self.settle((), entity, Err::<(), _>(failures.remove(0)))
    }
}

fn participant_ref(p: &AdrParticipant) -> EntityRef {
    EntityRef::AdrParticipant {
        adr_id: p.adr_id,
        user_id: p.user_id,
    }
}

fn impact_ref(i: &AdrComponentInstance) -> EntityRef {
    EntityRef::AdrComponentInstance {
        adr_id: i.adr_id,
        instance_id: i.instance_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fixtures::{seed_catalog, Fixture};
    use crate::store::{NodeLabel, RelType};

    fn service(fx: &Fixture, policy: SyncPolicy) -> CatalogService {
        CatalogService::new(fx.db.clone(), Arc::new(fx.graph.clone()), policy)
    }

    #[tokio::test]
    async fn test_create_syncs_both_stores() {
        let fx = Fixture::new();
        let svc = service(&fx, SyncPolicy::BestEffort);

        let outcome = svc
            .create_environment(&EnvironmentInput::named("staging"))
            .await
            .unwrap();

        assert!(!outcome.sync_failed());
        let env = outcome.into_value();
        assert!(fx.graph.node(NodeLabel::Environment, env.id).is_some());
    }

    #[tokio::test]
    async fn test_best_effort_keeps_relational_write() {
        let fx = Fixture::new();
        fx.graph.fail_sessions(true);
        let svc = service(&fx, SyncPolicy::BestEffort);

        let outcome = svc.create_team(&TeamInput::named("sre")).await.unwrap();

        assert!(outcome.sync_failed());
        match &outcome {
            MutationOutcome::SyncWarning { reason, .. } => assert!(reason.contains("unavailable")),
            MutationOutcome::Synced(_) => panic!("expected a sync warning"),
        }
        assert!(fx.db.get_team(outcome.value().id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_strict_policy_surfaces_sync_error() {
        let fx = Fixture::new();
        fx.graph.fail_sessions(true);
        let svc = service(&fx, SyncPolicy::Strict);

        let err = svc.create_team(&TeamInput::named("sre")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Sync { .. }));
        // Not rolled back.
        assert_eq!(fx.db.list_teams().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_errors_pass_through() {
        let fx = Fixture::new();
        let svc = service(&fx, SyncPolicy::BestEffort);
        svc.create_team(&TeamInput::named("sre")).await.unwrap();

        let err = svc.create_team(&TeamInput::named("sre")).await.unwrap_err();

        assert!(matches!(err, ServiceError::Record(DbError::UniqueViolation(_))));
        assert!(matches!(
            svc.delete_team(999).await.unwrap_err(),
            ServiceError::Record(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_component_removes_cascaded_instances() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        let svc = service(&fx, SyncPolicy::BestEffort);

        let outcome = svc.delete_component(cat.component).await.unwrap();

        assert!(!outcome.sync_failed());
        assert!(fx.graph.node(NodeLabel::Component, cat.component).is_none());
        assert!(fx.graph.node(NodeLabel::ComponentInstance, cat.instance).is_none());
    }

    #[tokio::test]
    async fn test_create_adr_pushes_owner_participation() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        let svc = service(&fx, SyncPolicy::BestEffort);

        let adr = svc
            .create_adr(&AdrInput::titled("Retire the monolith"), cat.owner)
            .await
            .unwrap()
            .into_value();

        assert!(fx
            .graph
            .relationship(RelType::ParticipatesIn, cat.owner, adr.id)
            .is_some());
    }

    #[tokio::test]
    async fn test_removing_last_owner_is_rejected() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        let svc = service(&fx, SyncPolicy::BestEffort);
        let owner = fx
            .db
            .find_adr_participant(cat.adr, cat.owner)
            .await
            .unwrap()
            .unwrap();

        let err = svc.remove_adr_participant(owner.id).await.unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Record(DbError::OwnerInvariant { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleting_team_unlinks_components() {
        let fx = Fixture::new();
        let cat = seed_catalog(&fx).await;
        fx.sync.run_full_sync().await.unwrap();
        let svc = service(&fx, SyncPolicy::BestEffort);

        svc.delete_team(cat.team).await.unwrap();

        let props = fx.graph.node(NodeLabel::Component, cat.component).unwrap();
        assert_eq!(props["team_id"], crate::store::PropValue::Null);
        assert_eq!(fx.graph.relationship_count(RelType::ManagedBy), 0);
    }
}
