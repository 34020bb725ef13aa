//! Targeted sync hooks.
//!
//! Called after a single relational write, they push or remove exactly the
//! affected node or relationship instead of rescanning a table.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use beaver_core::EntityKind;
use beaver_db::RecordStore;

use crate::store::{GraphSession, GraphShape, GraphStore};
use crate::sync::{self, SyncResult};

/// Identifies one relational row. Association rows are addressed by their
/// natural key, which is also the key of their graph relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Environment(i64),
    Team(i64),
    Component(i64),
    ComponentInstance(i64),
    User(i64),
    Adr(i64),
    AdrParticipant { adr_id: i64, user_id: i64 },
    AdrComponentInstance { adr_id: i64, instance_id: i64 },
    AdrComponent { adr_id: i64, component_id: i64 },
}

impl EntityRef {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Environment(_) => EntityKind::Environments,
            Self::Team(_) => EntityKind::Teams,
            Self::Component(_) => EntityKind::Components,
            Self::ComponentInstance(_) => EntityKind::ComponentInstances,
            Self::User(_) => EntityKind::Users,
            Self::Adr(_) => EntityKind::Adrs,
            Self::AdrParticipant { .. } => EntityKind::AdrParticipants,
            Self::AdrComponentInstance { .. } => EntityKind::AdrComponentInstances,
            Self::AdrComponent { .. } => EntityKind::AdrComponents,
        }
    }

    /// Build a reference from a kind and its key: one id for node kinds, two
    /// for association kinds (ADR id first).
    pub fn from_key(kind: EntityKind, id: i64, other: Option<i64>) -> Option<Self> {
        let node = |f: fn(i64) -> Self| Some(f(id));
        match (kind, other) {
            (EntityKind::Environments, None) => node(Self::Environment),
            (EntityKind::Teams, None) => node(Self::Team),
            (EntityKind::Components, None) => node(Self::Component),
            (EntityKind::ComponentInstances, None) => node(Self::ComponentInstance),
            (EntityKind::Users, None) => node(Self::User),
            (EntityKind::Adrs, None) => node(Self::Adr),
            (EntityKind::AdrParticipants, Some(user_id)) => Some(Self::AdrParticipant {
                adr_id: id,
                user_id,
            }),
            (EntityKind::AdrComponentInstances, Some(instance_id)) => {
                Some(Self::AdrComponentInstance {
                    adr_id: id,
                    instance_id,
                })
            }
            (EntityKind::AdrComponents, Some(component_id)) => Some(Self::AdrComponent {
                adr_id: id,
                component_id,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment(id)
            | Self::Team(id)
            | Self::Component(id)
            | Self::ComponentInstance(id)
            | Self::User(id)
            | Self::Adr(id) => write!(f, "{} {}", self.kind(), id),
            Self::AdrParticipant { adr_id, user_id } => {
                write!(f, "{} (adr {adr_id}, user {user_id})", self.kind())
            }
            Self::AdrComponentInstance {
                adr_id,
                instance_id,
            } => write!(f, "{} (adr {adr_id}, instance {instance_id})", self.kind()),
            Self::AdrComponent {
                adr_id,
                component_id,
            } => write!(f, "{} (adr {adr_id}, component {component_id})", self.kind()),
        }
    }
}

/// Per-entity sync entry points for mutation handlers.
#[derive(Clone)]
pub struct SyncHooks {
    records: Arc<dyn RecordStore>,
    graph: Arc<dyn GraphStore>,
}

impl SyncHooks {
    pub fn new(records: Arc<dyn RecordStore>, graph: Arc<dyn GraphStore>) -> Self {
        Self { records, graph }
    }

    pub async fn on_entity_created(&self, entity: EntityRef) -> Result<SyncResult> {
        debug!(%entity, "Entity created");
        self.push(entity).await
    }

    /// Single-valued derived relationships (MANAGED_BY, INSTANTIATES,
    /// DEPLOYED_IN) are replaced, so a moved component or instance does not
    /// keep its old link.
    pub async fn on_entity_updated(&self, entity: EntityRef) -> Result<SyncResult> {
        debug!(%entity, "Entity updated");
        self.push(entity).await
    }

    /// Remove the node (detached) or relationship. Returns whether anything
    /// was removed.
    pub async fn on_entity_deleted(&self, entity: EntityRef) -> Result<bool> {
        debug!(%entity, "Entity deleted");
        let mut session = self.graph.session().await?;
        remove(session.as_mut(), entity).await
    }

    async fn push(&self, entity: EntityRef) -> Result<SyncResult> {
        let mut session = self.graph.session().await?;
        let records = self.records.as_ref();
        let session = session.as_mut();

        let pushed = match entity {
            EntityRef::Environment(id) => match records.get_environment(id).await? {
                Some(env) => Some(sync::push_environment(session, &env).await?),
                None => None,
            },
            EntityRef::Team(id) => match records.get_team(id).await? {
                Some(team) => Some(sync::push_team(session, &team).await?),
                None => None,
            },
            EntityRef::Component(id) => match records.get_component(id).await? {
                Some(component) => {
                    let mut result = sync::push_component(session, &component).await?;
                    result.merge(&sync::push_managed_by(session, &component).await?);
                    Some(result)
                }
                None => None,
            },
            EntityRef::ComponentInstance(id) => match records.get_component_instance(id).await? {
                Some(instance) => Some(sync::push_instance(session, &instance).await?),
                None => None,
            },
            EntityRef::User(id) => match records.get_user(id).await? {
                Some(user) => Some(sync::push_user(session, &user).await?),
                None => None,
            },
            EntityRef::Adr(id) => match records.get_adr(id).await? {
                Some(adr) => Some(sync::push_adr(session, &adr).await?),
                None => None,
            },
            EntityRef::AdrParticipant { adr_id, user_id } => {
                match records.find_adr_participant(adr_id, user_id).await? {
                    Some(p) => Some(sync::push_participant(session, &p).await?),
                    None => None,
                }
            }
            EntityRef::AdrComponentInstance {
                adr_id,
                instance_id,
            } => match records.find_adr_component_instance(adr_id, instance_id).await? {
                Some(impact) => Some(sync::push_impact(records, session, &impact).await?),
                None => None,
            },
            EntityRef::AdrComponent {
                adr_id,
                component_id,
            } => match records.find_adr_component(adr_id, component_id).await? {
                Some(link) => Some(sync::push_adr_component(session, &link).await?),
                None => None,
            },
        };

        match pushed {
            Some(result) => Ok(result),
            None => {
                debug!(%entity, "Row is gone, removing from graph");
                remove(session, entity)
                    .await
                    .with_context(|| format!("Failed to remove {entity}"))?;
                Ok(SyncResult::default())
            }
        }
    }
}

async fn remove(session: &mut dyn GraphSession, entity: EntityRef) -> Result<bool> {
    let (from, to) = match entity {
        EntityRef::Environment(id)
        | EntityRef::Team(id)
        | EntityRef::Component(id)
        | EntityRef::ComponentInstance(id)
        | EntityRef::User(id)
        | EntityRef::Adr(id) => (id, None),
        EntityRef::AdrParticipant { adr_id, user_id } => (user_id, Some(adr_id)),
        EntityRef::AdrComponentInstance {
            adr_id,
            instance_id,
        } => (adr_id, Some(instance_id)),
        EntityRef::AdrComponent {
            adr_id,
            component_id,
        } => (adr_id, Some(component_id)),
    };

    match (GraphShape::of(entity.kind()), to) {
        (GraphShape::Node(label), _) => session.delete_node(label, from).await,
        (GraphShape::Edge(rel), Some(to)) => session.delete_relationship(rel, from, to).await,
        (GraphShape::Edge(rel), None) => {
            anyhow::bail!("{rel} relationship needs both endpoints")
        }
    }
}
