//! Cypher text for the graph session primitives.
//!
//! Statements are built as plain [`CypherStatement`] values so the text and
//! parameters can be checked without a server; [`CypherStatement::into_query`]
//! turns them into a neo4rs [`Query`].

use neo4rs::Query;

use crate::store::{Endpoint, NodeLabel, NodeUpsert, PropValue, Props, RelType, RelationshipUpsert};

#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub text: String,
    pub params: Vec<(String, PropValue)>,
}

impl CypherStatement {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Vec::new(),
        }
    }

    fn param(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn into_query(self) -> Query {
        let mut query = Query::new(self.text);
        for (key, value) in self.params {
            query = match value {
                PropValue::Int(v) => query.param(&key, v),
                PropValue::Str(v) => query.param(&key, v),
                PropValue::Bool(v) => query.param(&key, v),
                // Nulls are inlined as literals by the builders below.
                PropValue::Null => query,
            };
        }
        query
    }
}

/// Renders `alias.key = $prefix_key` assignments, inlining `null`.
fn assignments(
    alias: &str,
    prefix: &str,
    props: &Props,
    params: &mut Vec<(String, PropValue)>,
) -> Vec<String> {
    props
        .iter()
        .map(|(key, value)| {
            if *value == PropValue::Null {
                format!("{alias}.{key} = null")
            } else {
                let name = format!("{prefix}_{key}");
                params.push((name.clone(), value.clone()));
                format!("{alias}.{key} = ${name}")
            }
        })
        .collect()
}

pub fn upsert_node(node: &NodeUpsert) -> CypherStatement {
    let mut params = vec![("id".to_string(), PropValue::Int(node.id))];
    let mut text = format!("MERGE (n:{} {{id: $id}})", node.label);

    let mut on_create = assignments("n", "c", &node.on_create, &mut params);
    let on_match = assignments("n", "p", &node.properties, &mut params);
    on_create.extend(on_match.iter().cloned());

    if !on_create.is_empty() {
        text.push_str(&format!("\nON CREATE SET {}", on_create.join(", ")));
    }
    if !on_match.is_empty() {
        text.push_str(&format!("\nON MATCH SET {}", on_match.join(", ")));
    }

    CypherStatement { text, params }
}

pub fn merge_relationship(rel: &RelationshipUpsert) -> CypherStatement {
    let (start, end) = rel.rel.endpoints();
    let mut params = vec![
        ("from".to_string(), PropValue::Int(rel.from)),
        ("to".to_string(), PropValue::Int(rel.to)),
    ];
    let mut text = format!(
        "MATCH (a:{start} {{id: $from}})\nMATCH (b:{end} {{id: $to}})\nMERGE (a)-[r:{}]->(b)",
        rel.rel
    );
    let set = assignments("r", "p", &rel.properties, &mut params);
    if !set.is_empty() {
        text.push_str(&format!("\nSET {}", set.join(", ")));
    }
    text.push_str("\nRETURN count(r) AS linked");

    CypherStatement { text, params }
}

pub fn delete_node(label: NodeLabel, id: i64) -> CypherStatement {
    CypherStatement::new(format!(
        "MATCH (n:{label} {{id: $id}})\nDETACH DELETE n\nRETURN count(*) AS deleted"
    ))
    .param("id", id)
}

pub fn delete_relationship(rel: RelType, from: i64, to: i64) -> CypherStatement {
    let (start, end) = rel.endpoints();
    CypherStatement::new(format!(
        "MATCH (:{start} {{id: $from}})-[r:{rel}]->(:{end} {{id: $to}})\nDELETE r\nRETURN count(*) AS deleted"
    ))
    .param("from", from)
    .param("to", to)
}

pub fn retain_relationship(
    rel: RelType,
    side: Endpoint,
    id: i64,
    keep: Option<i64>,
) -> CypherStatement {
    let (start, end) = rel.endpoints();
    let pattern = match side {
        Endpoint::Start => format!("(:{start} {{id: $id}})-[r:{rel}]->(other:{end})"),
        Endpoint::End => format!("(other:{start})-[r:{rel}]->(:{end} {{id: $id}})"),
    };
    let mut stmt = CypherStatement::new(format!("MATCH {pattern}")).param("id", id);
    if let Some(keep) = keep {
        stmt.text.push_str("\nWHERE other.id <> $keep");
        stmt = stmt.param("keep", keep);
    }
    stmt.text.push_str("\nDELETE r\nRETURN count(*) AS deleted");
    stmt
}

pub fn count_nodes(label: NodeLabel) -> CypherStatement {
    CypherStatement::new(format!("MATCH (n:{label}) RETURN count(n) AS count"))
}

pub fn count_relationships(rel: RelType) -> CypherStatement {
    let (start, end) = rel.endpoints();
    CypherStatement::new(format!(
        "MATCH (:{start})-[r:{rel}]->(:{end}) RETURN count(r) AS count"
    ))
}

pub fn node_ids(label: NodeLabel) -> CypherStatement {
    CypherStatement::new(format!("MATCH (n:{label}) RETURN n.id AS id ORDER BY id"))
}

pub fn relationship_pairs(rel: RelType) -> CypherStatement {
    let (start, end) = rel.endpoints();
    CypherStatement::new(format!(
        "MATCH (a:{start})-[:{rel}]->(b:{end})\nRETURN a.id AS from_id, b.id AS to_id\nORDER BY from_id, to_id"
    ))
}

pub fn orphaned_instances() -> CypherStatement {
    CypherStatement::new(
        "MATCH (i:ComponentInstance)
WHERE NOT EXISTS { MATCH (:Component)-[:INSTANTIATES]->(i) }
   OR NOT EXISTS { MATCH (i)-[:DEPLOYED_IN]->(:Environment) }
RETURN i.id AS id ORDER BY id",
    )
}

pub fn unmanaged_components() -> CypherStatement {
    CypherStatement::new(
        "MATCH (c:Component)
WHERE c.team_id IS NOT NULL
  AND NOT EXISTS { MATCH (c)-[:MANAGED_BY]->(:Team) }
RETURN c.id AS id ORDER BY id",
    )
}

pub fn mislinked_components() -> CypherStatement {
    CypherStatement::new(
        "MATCH (c:Component)-[:MANAGED_BY]->(t:Team)
WITH c, collect(t.id) AS teams
WHERE size(teams) > 1
   OR any(team IN teams WHERE c.team_id IS NULL OR team <> c.team_id)
RETURN c.id AS id ORDER BY id",
    )
}

pub fn mislinked_instances() -> CypherStatement {
    CypherStatement::new(
        "MATCH (i:ComponentInstance)
OPTIONAL MATCH (c:Component)-[:INSTANTIATES]->(i)
WITH i, collect(c.id) AS components
OPTIONAL MATCH (i)-[:DEPLOYED_IN]->(e:Environment)
WITH i, components, collect(e.id) AS environments
WHERE size(components) > 1
   OR size(environments) > 1
   OR any(cid IN components WHERE cid <> i.component_id)
   OR any(eid IN environments WHERE eid <> i.environment_id)
RETURN i.id AS id ORDER BY id",
    )
}
