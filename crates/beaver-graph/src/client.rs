//! Neo4j connection client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Row};
use serde::de::DeserializeOwned;
use tracing::debug;

use beaver_core::GraphConfig;

use crate::cypher::{self, CypherStatement};
use crate::schema;
use crate::store::{
    Endpoint, GraphSession, GraphStore, NodeLabel, NodeUpsert, RelType, RelationshipUpsert,
};

/// Client for the Neo4j graph store.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// neo4rs builds its pool lazily, so a `RETURN 1` ping runs immediately to
    /// surface an unreachable server here instead of on the first sync write.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(200)
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = Graph::connect(neo4j_config)
            .await
            .context("Failed to create Neo4j connection pool")?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .context("Neo4j is not responding to queries")?;

        Ok(Self { graph })
    }

    /// Execute a Cypher query that returns no results.
    pub async fn execute(&self, query: Query) -> Result<()> {
        self.graph.run(query).await.context("Neo4j query execution failed")?;
        Ok(())
    }

    /// Execute a Cypher query and return results as rows.
    pub async fn query(&self, query: Query) -> Result<Vec<Row>> {
        collect_rows(&self.graph, query).await
    }

    /// Execute a Cypher query and return a single scalar value.
    pub async fn query_scalar<T: DeserializeOwned>(
        &self,
        query: Query,
        field: &str,
    ) -> Result<Option<T>> {
        first_scalar(self.query(query).await?, field)
    }

    /// Total node and relationship counts for status display.
    pub async fn get_counts(&self) -> Result<GraphCounts> {
        let node_query = Query::new("MATCH (n) RETURN count(n) as count".to_string());
        let rel_query = Query::new("MATCH ()-[r]->() RETURN count(r) as count".to_string());

        let nodes: i64 = self.query_scalar(node_query, "count").await?.unwrap_or(0);
        let relationships: i64 = self.query_scalar(rel_query, "count").await?.unwrap_or(0);

        Ok(GraphCounts {
            nodes,
            relationships,
        })
    }
}

/// Node and relationship counts.
#[derive(Debug, Clone, Copy)]
pub struct GraphCounts {
    pub nodes: i64,
    pub relationships: i64,
}

async fn collect_rows(graph: &Graph, query: Query) -> Result<Vec<Row>> {
    let mut result = graph.execute(query).await.context("Neo4j query failed")?;

    let mut rows = Vec::new();
    while let Some(row) = result.next().await.context("Failed to read Neo4j result row")? {
        rows.push(row);
    }
    Ok(rows)
}

fn first_scalar<T: DeserializeOwned>(rows: Vec<Row>, field: &str) -> Result<Option<T>> {
    match rows.into_iter().next() {
        Some(row) => {
            let val: T = row
                .get(field)
                .map_err(|e| anyhow::anyhow!("Failed to get field '{}': {:?}", field, e))?;
            Ok(Some(val))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn session(&self) -> Result<Box<dyn GraphSession>> {
        debug!("Graph session acquired");
        Ok(Box::new(Neo4jSession {
            graph: self.graph.clone(),
        }))
    }

    async fn initialize_schema(&self) -> Result<()> {
        schema::initialize_schema(self).await
    }
}

/// Session handed to one sync or validation routine.
pub struct Neo4jSession {
    graph: Graph,
}

impl Neo4jSession {
    async fn rows(&self, stmt: CypherStatement) -> Result<Vec<Row>> {
        collect_rows(&self.graph, stmt.into_query()).await
    }

    async fn scalar(&self, stmt: CypherStatement, field: &str) -> Result<i64> {
        Ok(first_scalar(self.rows(stmt).await?, field)?.unwrap_or(0))
    }

    async fn ids(&self, stmt: CypherStatement) -> Result<Vec<i64>> {
        self.rows(stmt)
            .await?
            .into_iter()
            .map(|row| {
                row.get::<i64>("id")
                    .map_err(|e| anyhow::anyhow!("Failed to get field 'id': {:?}", e))
            })
            .collect()
    }
}

impl Drop for Neo4jSession {
    fn drop(&mut self) {
        debug!("Graph session released");
    }
}

#[async_trait]
impl GraphSession for Neo4jSession {
    async fn upsert_node(&mut self, node: &NodeUpsert) -> Result<()> {
        self.graph
            .run(cypher::upsert_node(node).into_query())
            .await
            .with_context(|| format!("Failed to upsert {} {}", node.label, node.id))
    }

    async fn merge_relationship(&mut self, rel: &RelationshipUpsert) -> Result<bool> {
        let linked = self
            .scalar(cypher::merge_relationship(rel), "linked")
            .await
            .with_context(|| format!("Failed to merge {} {}->{}", rel.rel, rel.from, rel.to))?;
        Ok(linked > 0)
    }

    async fn delete_node(&mut self, label: NodeLabel, id: i64) -> Result<bool> {
        let deleted = self
            .scalar(cypher::delete_node(label, id), "deleted")
            .await
            .with_context(|| format!("Failed to delete {label} {id}"))?;
        Ok(deleted > 0)
    }

    async fn delete_relationship(&mut self, rel: RelType, from: i64, to: i64) -> Result<bool> {
        let deleted = self
            .scalar(cypher::delete_relationship(rel, from, to), "deleted")
            .await
            .with_context(|| format!("Failed to delete {rel} {from}->{to}"))?;
        Ok(deleted > 0)
    }

    async fn retain_relationship(
        &mut self,
        rel: RelType,
        side: Endpoint,
        id: i64,
        keep: Option<i64>,
    ) -> Result<usize> {
        let deleted = self
            .scalar(cypher::retain_relationship(rel, side, id, keep), "deleted")
            .await
            .with_context(|| format!("Failed to prune {rel} of {id}"))?;
        Ok(deleted as usize)
    }

    async fn count_nodes(&mut self, label: NodeLabel) -> Result<i64> {
        self.scalar(cypher::count_nodes(label), "count")
            .await
            .with_context(|| format!("Failed to count {label} nodes"))
    }

    async fn count_relationships(&mut self, rel: RelType) -> Result<i64> {
        self.scalar(cypher::count_relationships(rel), "count")
            .await
            .with_context(|| format!("Failed to count {rel} relationships"))
    }

    async fn node_ids(&mut self, label: NodeLabel) -> Result<Vec<i64>> {
        self.ids(cypher::node_ids(label)).await
    }

    async fn relationship_pairs(&mut self, rel: RelType) -> Result<Vec<(i64, i64)>> {
        self.rows(cypher::relationship_pairs(rel))
            .await?
            .into_iter()
            .map(|row| {
                let from: i64 = row
                    .get("from_id")
                    .map_err(|e| anyhow::anyhow!("Failed to get field 'from_id': {:?}", e))?;
                let to: i64 = row
                    .get("to_id")
                    .map_err(|e| anyhow::anyhow!("Failed to get field 'to_id': {:?}", e))?;
                Ok((from, to))
            })
            .collect()
    }

    async fn orphaned_instances(&mut self) -> Result<Vec<i64>> {
        self.ids(cypher::orphaned_instances())
            .await
            .context("Failed to query orphaned instances")
    }

    async fn unmanaged_components(&mut self) -> Result<Vec<i64>> {
        self.ids(cypher::unmanaged_components())
            .await
            .context("Failed to query unmanaged components")
    }

    async fn mislinked_components(&mut self) -> Result<Vec<i64>> {
        self.ids(cypher::mislinked_components())
            .await
            .context("Failed to query mislinked components")
    }

    async fn mislinked_instances(&mut self) -> Result<Vec<i64>> {
        self.ids(cypher::mislinked_instances())
            .await
            .context("Failed to query mislinked instances")
    }
}
