//! In-memory mock implementation of GraphStore for testing.
//!
//! Nodes are keyed by (label, id) and relationships by (type, start, end).
//! Every write primitive bumps a counter, and sessions are tracked so tests
//! can assert they are released.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::store::{
    Endpoint, GraphSession, GraphStore, NodeLabel, NodeUpsert, PropValue, Props, RelType,
    RelationshipUpsert,
};

#[derive(Default)]
struct MockState {
    nodes: BTreeMap<(NodeLabel, i64), Props>,
    rels: BTreeMap<(RelType, i64, i64), Props>,
    fail_label: Option<NodeLabel>,
    /// Upserts of `fail_label` still allowed before failures start.
    fail_after: Option<usize>,
    fail_sessions: bool,
}

#[derive(Default)]
struct Shared {
    state: Mutex<MockState>,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
    writes: AtomicUsize,
}

/// In-memory graph store.
#[derive(Clone, Default)]
pub struct MockGraphStore {
    shared: Arc<Shared>,
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }

    /// Upserts of `label` fail until cleared.
    pub fn fail_upserts_of(&self, label: Option<NodeLabel>) {
        let mut state = self.state();
        state.fail_label = label;
        state.fail_after = None;
    }

    /// Let `allowed` upserts of `label` through, then fail the rest.
    pub fn fail_upserts_of_after(&self, label: NodeLabel, allowed: usize) {
        let mut state = self.state();
        state.fail_label = Some(label);
        state.fail_after = Some(allowed);
    }

    /// `session()` fails until cleared.
    pub fn fail_sessions(&self, fail: bool) {
        self.state().fail_sessions = fail;
    }

    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.shared.sessions_opened.load(Ordering::SeqCst)
    }

    /// Number of write primitive calls so far.
    pub fn writes(&self) -> usize {
        self.shared.writes.load(Ordering::SeqCst)
    }

    pub fn node(&self, label: NodeLabel, id: i64) -> Option<Props> {
        self.state().nodes.get(&(label, id)).cloned()
    }

    pub fn node_ids(&self, label: NodeLabel) -> Vec<i64> {
        self.state()
            .nodes
            .keys()
            .filter(|(l, _)| *l == label)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn relationship(&self, rel: RelType, from: i64, to: i64) -> Option<Props> {
        self.state().rels.get(&(rel, from, to)).cloned()
    }

    pub fn relationship_count(&self, rel: RelType) -> usize {
        self.state().rels.keys().filter(|(r, _, _)| *r == rel).count()
    }

    /// Insert a node without going through a session (simulates drift).
    pub fn insert_node(&self, label: NodeLabel, id: i64, props: Props) {
        self.state().nodes.insert((label, id), props);
    }

    /// Insert a relationship without checking endpoints (simulates drift).
    pub fn insert_relationship(&self, rel: RelType, from: i64, to: i64) {
        self.state().rels.insert((rel, from, to), Props::new());
    }

    /// Remove a relationship without going through a session.
    pub fn remove_relationship(&self, rel: RelType, from: i64, to: i64) {
        self.state().rels.remove(&(rel, from, to));
    }

    /// Remove a node and its relationships without going through a session.
    pub fn remove_node(&self, label: NodeLabel, id: i64) {
        let mut state = self.state();
        state.nodes.remove(&(label, id));
        detach(&mut state, label, id);
    }
}

fn lock(shared: &Shared) -> MutexGuard<'_, MockState> {
    shared
        .state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Integer property of a node, `None` when absent or null.
fn int_prop(state: &MockState, label: NodeLabel, id: i64, key: &str) -> Option<i64> {
    match state.nodes.get(&(label, id)).and_then(|props| props.get(key)) {
        Some(PropValue::Int(v)) => Some(*v),
        _ => None,
    }
}

/// Other endpoints of every `rel` attached to `id` on `side`.
fn linked(state: &MockState, rel: RelType, side: Endpoint, id: i64) -> Vec<i64> {
    state
        .rels
        .keys()
        .filter(|(r, _, _)| *r == rel)
        .filter_map(|(_, from, to)| match side {
            Endpoint::Start if *from == id => Some(*to),
            Endpoint::End if *to == id => Some(*from),
            _ => None,
        })
        .collect()
}

/// More than one link, or a link to anything but `expected`.
fn mislinked(links: &[i64], expected: Option<i64>) -> bool {
    links.len() > 1 || links.iter().any(|l| Some(*l) != expected)
}

fn detach(state: &mut MockState, label: NodeLabel, id: i64) -> usize {
    let before = state.rels.len();
    state.rels.retain(|(rel, from, to), _| {
        let (start, end) = rel.endpoints();
        !((start == label && *from == id) || (end == label && *to == id))
    });
    before - state.rels.len()
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn session(&self) -> Result<Box<dyn GraphSession>> {
        if self.state().fail_sessions {
            bail!("mock: graph store unavailable");
        }
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.shared.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            shared: Arc::clone(&self.shared),
        }))
    }

    async fn initialize_schema(&self) -> Result<()> {
        Ok(())
    }
}

struct MockSession {
    shared: Arc<Shared>,
}

impl MockSession {
    fn write(&self) -> MutexGuard<'_, MockState> {
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.shared)
    }

    fn read(&self) -> MutexGuard<'_, MockState> {
        lock(&self.shared)
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphSession for MockSession {
    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<()> {
        let mut state = self.write();
        if state.fail_label == Some(node.label) {
            match state.fail_after {
                Some(allowed) if allowed > 0 => state.fail_after = Some(allowed - 1),
                _ => bail!("mock: upsert of {} {} failed", node.label, node.id),
            }
        }
        match state.nodes.get_mut(&(node.label, node.id)) {
            Some(props) => {
                for (k, v) in &node.properties {
                    props.insert(k, v.clone());
                }
            }
            None => {
                let mut props = node.on_create.clone();
                props.extend(node.properties.iter().map(|(k, v)| (*k, v.clone())));
                state.nodes.insert((node.label, node.id), props);
            }
        }
        Ok(())
    }

    async fn merge_relationship(&mut self, rel: &RelationshipUpsert) -> Result<bool> {
        let mut state = self.write();
        let (start, end) = rel.rel.endpoints();
        if !state.nodes.contains_key(&(start, rel.from)) || !state.nodes.contains_key(&(end, rel.to))
        {
            return Ok(false);
        }
        let props = state.rels.entry((rel.rel, rel.from, rel.to)).or_default();
        for (k, v) in &rel.properties {
            props.insert(k, v.clone());
        }
        Ok(true)
    }

    async fn delete_node(&mut self, label: NodeLabel, id: i64) -> Result<bool> {
        let mut state = self.write();
        let existed = state.nodes.remove(&(label, id)).is_some();
        detach(&mut state, label, id);
        Ok(existed)
    }

    async fn delete_relationship(&mut self, rel: RelType, from: i64, to: i64) -> Result<bool> {
        Ok(self.write().rels.remove(&(rel, from, to)).is_some())
    }

    async fn retain_relationship(
        &mut self,
        rel: RelType,
        side: Endpoint,
        id: i64,
        keep: Option<i64>,
    ) -> Result<usize> {
        let mut state = self.write();
        let before = state.rels.len();
        state.rels.retain(|(r, from, to), _| {
            let other = match side {
                Endpoint::Start if *from == id => Some(*to),
                Endpoint::End if *to == id => Some(*from),
                _ => None,
            };
            !(*r == rel && other.is_some() && other != keep)
        });
        Ok(before - state.rels.len())
    }

    async fn count_nodes(&mut self, label: NodeLabel) -> Result<i64> {
        Ok(self.read().nodes.keys().filter(|(l, _)| *l == label).count() as i64)
    }

    async fn count_relationships(&mut self, rel: RelType) -> Result<i64> {
        Ok(self.read().rels.keys().filter(|(r, _, _)| *r == rel).count() as i64)
    }

    async fn node_ids(&mut self, label: NodeLabel) -> Result<Vec<i64>> {
        Ok(self
            .read()
            .nodes
            .keys()
            .filter(|(l, _)| *l == label)
            .map(|(_, id)| *id)
            .collect())
    }

    async fn relationship_pairs(&mut self, rel: RelType) -> Result<Vec<(i64, i64)>> {
        Ok(self
            .read()
            .rels
            .keys()
            .filter(|(r, _, _)| *r == rel)
            .map(|(_, from, to)| (*from, *to))
            .collect())
    }

    async fn orphaned_instances(&mut self) -> Result<Vec<i64>> {
        let state = self.read();
        Ok(state
            .nodes
            .keys()
            .filter(|(l, _)| *l == NodeLabel::ComponentInstance)
            .map(|(_, id)| *id)
            .filter(|id| {
                let instantiated = state
                    .rels
                    .keys()
                    .any(|(r, _, to)| *r == RelType::Instantiates && to == id);
                let deployed = state
                    .rels
                    .keys()
                    .any(|(r, from, _)| *r == RelType::DeployedIn && from == id);
                !(instantiated && deployed)
            })
            .collect())
    }

    async fn unmanaged_components(&mut self) -> Result<Vec<i64>> {
        let state = self.read();
        Ok(state
            .nodes
            .iter()
            .filter(|((l, _), props)| {
                *l == NodeLabel::Component
                    && props
                        .get("team_id")
                        .is_some_and(|v| *v != PropValue::Null)
            })
            .map(|((_, id), _)| *id)
            .filter(|id| {
                !state
                    .rels
                    .keys()
                    .any(|(r, from, _)| *r == RelType::ManagedBy && from == id)
            })
            .collect())
    }

    async fn mislinked_components(&mut self) -> Result<Vec<i64>> {
        let state = self.read();
        Ok(state
            .nodes
            .keys()
            .filter(|(l, _)| *l == NodeLabel::Component)
            .map(|(_, id)| *id)
            .filter(|id| {
                let teams = linked(&state, RelType::ManagedBy, Endpoint::Start, *id);
                mislinked(&teams, int_prop(&state, NodeLabel::Component, *id, "team_id"))
            })
            .collect())
    }

    async fn mislinked_instances(&mut self) -> Result<Vec<i64>> {
        let state = self.read();
        let label = NodeLabel::ComponentInstance;
        Ok(state
            .nodes
            .keys()
            .filter(|(l, _)| *l == label)
            .map(|(_, id)| *id)
            .filter(|id| {
                let components = linked(&state, RelType::Instantiates, Endpoint::End, *id);
                let environments = linked(&state, RelType::DeployedIn, Endpoint::Start, *id);
                mislinked(&components, int_prop(&state, label, *id, "component_id"))
                    || mislinked(&environments, int_prop(&state, label, *id, "environment_id"))
            })
            .collect())
    }
}
