//! Graph store boundary.
//!
//! The synchronizer never writes Cypher directly; it talks to a
//! [`GraphSession`] through typed primitives (node upsert, relationship
//! merge, counts, orphan queries). [`crate::GraphClient`] implements them on
//! Neo4j.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use beaver_core::EntityKind;

/// Node labels mirrored from relational tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Environment,
    Team,
    Component,
    ComponentInstance,
    User,
    Adr,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "Environment",
            Self::Team => "Team",
            Self::Component => "Component",
            Self::ComponentInstance => "ComponentInstance",
            Self::User => "User",
            Self::Adr => "ADR",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types maintained by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelType {
    /// (:Component)-[:INSTANTIATES]->(:ComponentInstance)
    Instantiates,
    /// (:ComponentInstance)-[:DEPLOYED_IN]->(:Environment)
    DeployedIn,
    /// (:Component)-[:MANAGED_BY]->(:Team)
    ManagedBy,
    /// (:User)-[:PARTICIPATES_IN {role}]->(:ADR)
    ParticipatesIn,
    /// (:ADR)-[:AFFECTS_INSTANCE {impact_level, notes}]->(:ComponentInstance)
    AffectsInstance,
    /// (:ADR)-[:AFFECTS]->(:Component)
    Affects,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instantiates => "INSTANTIATES",
            Self::DeployedIn => "DEPLOYED_IN",
            Self::ManagedBy => "MANAGED_BY",
            Self::ParticipatesIn => "PARTICIPATES_IN",
            Self::AffectsInstance => "AFFECTS_INSTANCE",
            Self::Affects => "AFFECTS",
        }
    }

    /// (start label, end label).
    pub fn endpoints(&self) -> (NodeLabel, NodeLabel) {
        match self {
            Self::Instantiates => (NodeLabel::Component, NodeLabel::ComponentInstance),
            Self::DeployedIn => (NodeLabel::ComponentInstance, NodeLabel::Environment),
            Self::ManagedBy => (NodeLabel::Component, NodeLabel::Team),
            Self::ParticipatesIn => (NodeLabel::User, NodeLabel::Adr),
            Self::AffectsInstance => (NodeLabel::Adr, NodeLabel::ComponentInstance),
            Self::Affects => (NodeLabel::Adr, NodeLabel::Component),
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an entity kind is represented in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphShape {
    Node(NodeLabel),
    Edge(RelType),
}

impl GraphShape {
    pub fn of(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Environments => Self::Node(NodeLabel::Environment),
            EntityKind::Teams => Self::Node(NodeLabel::Team),
            EntityKind::Components => Self::Node(NodeLabel::Component),
            EntityKind::ComponentInstances => Self::Node(NodeLabel::ComponentInstance),
            EntityKind::Users => Self::Node(NodeLabel::User),
            EntityKind::Adrs => Self::Node(NodeLabel::Adr),
            EntityKind::AdrParticipants => Self::Edge(RelType::ParticipatesIn),
            EntityKind::AdrComponentInstances => Self::Edge(RelType::AffectsInstance),
            EntityKind::AdrComponents => Self::Edge(RelType::Affects),
        }
    }
}

/// Which side of a relationship a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

/// A scalar graph property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Null,
    Int(i64),
    Str(String),
    Bool(bool),
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Property map keyed by property name.
pub type Props = BTreeMap<&'static str, PropValue>;

/// Merge-on-id node upsert.
///
/// `on_create` properties are written only when the node is created;
/// `properties` are written on create and on match.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpsert {
    pub label: NodeLabel,
    pub id: i64,
    pub on_create: Props,
    pub properties: Props,
}

impl NodeUpsert {
    pub fn new(label: NodeLabel, id: i64) -> Self {
        Self {
            label,
            id,
            on_create: Props::new(),
            properties: Props::new(),
        }
    }

    pub fn set(mut self, key: &'static str, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key, value.into());
        self
    }

    pub fn set_on_create(mut self, key: &'static str, value: impl Into<PropValue>) -> Self {
        self.on_create.insert(key, value.into());
        self
    }
}

/// Merge-on-pattern relationship upsert between two existing nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipUpsert {
    pub rel: RelType,
    pub from: i64,
    pub to: i64,
    pub properties: Props,
}

impl RelationshipUpsert {
    pub fn new(rel: RelType, from: i64, to: i64) -> Self {
        Self {
            rel,
            from,
            to,
            properties: Props::new(),
        }
    }

    pub fn set(mut self, key: &'static str, value: impl Into<PropValue>) -> Self {
        self.properties.insert(key, value.into());
        self
    }
}

/// A graph session scoped to one routine invocation.
///
/// Implementations release their underlying handle when dropped, so a
/// routine that bails out with `?` still gives the session back.
#[async_trait]
pub trait GraphSession: Send {
    /// Idempotent merge on `{id}`.
    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<()>;

    /// Idempotent merge of the relationship. Returns `false` when either
    /// endpoint does not exist (nothing is written).
    async fn merge_relationship(&mut self, rel: &RelationshipUpsert) -> Result<bool>;

    /// Detach-delete a node. Returns `false` when it did not exist.
    async fn delete_node(&mut self, label: NodeLabel, id: i64) -> Result<bool>;

    /// Delete one relationship between two nodes.
    async fn delete_relationship(&mut self, rel: RelType, from: i64, to: i64) -> Result<bool>;

    /// Delete every `rel` relationship attached to node `id` on `side` whose
    /// other endpoint is not `keep`. With `keep == None` all of them go.
    async fn retain_relationship(
        &mut self,
        rel: RelType,
        side: Endpoint,
        id: i64,
        keep: Option<i64>,
    ) -> Result<usize>;

    async fn count_nodes(&mut self, label: NodeLabel) -> Result<i64>;
    async fn count_relationships(&mut self, rel: RelType) -> Result<i64>;

    /// Ids of every node with the label.
    async fn node_ids(&mut self, label: NodeLabel) -> Result<Vec<i64>>;

    /// (start id, end id) of every relationship of the type.
    async fn relationship_pairs(&mut self, rel: RelType) -> Result<Vec<(i64, i64)>>;

    /// ComponentInstance nodes missing an inbound INSTANTIATES or an outbound
    /// DEPLOYED_IN.
    async fn orphaned_instances(&mut self) -> Result<Vec<i64>>;

    /// Component nodes with a `team_id` property but no MANAGED_BY edge.
    async fn unmanaged_components(&mut self) -> Result<Vec<i64>>;

    /// Component nodes with more than one MANAGED_BY, or one pointing at a
    /// team other than their `team_id`.
    async fn mislinked_components(&mut self) -> Result<Vec<i64>>;

    /// ComponentInstance nodes with more than one INSTANTIATES or DEPLOYED_IN,
    /// or one whose endpoint differs from `component_id`/`environment_id`.
    async fn mislinked_instances(&mut self) -> Result<Vec<i64>>;
}

/// Factory for graph sessions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn session(&self) -> Result<Box<dyn GraphSession>>;

    /// Create constraints and indexes. Safe to repeat.
    async fn initialize_schema(&self) -> Result<()>;
}

/// Count of `kind` in the graph: nodes for node kinds, relationships for
/// association kinds.
pub async fn graph_count(session: &mut dyn GraphSession, kind: EntityKind) -> Result<i64> {
    match GraphShape::of(kind) {
        GraphShape::Node(label) => session.count_nodes(label).await,
        GraphShape::Edge(rel) => session.count_relationships(rel).await,
    }
}
