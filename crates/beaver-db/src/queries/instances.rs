//! Component instance queries.

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{ComponentInstance, ComponentInstanceInput};

use super::now;
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, component_id, environment_id, hostname, specs, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ComponentInstance> {
    let specs: Option<String> = row.get(4)?;
    let specs = specs
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(ComponentInstance {
        id: row.get(0)?,
        component_id: row.get(1)?,
        environment_id: row.get(2)?,
        hostname: row.get(3)?,
        specs,
        created_at: row.get(5)?,
    })
}

fn specs_text(input: &ComponentInstanceInput) -> DbResult<Option<String>> {
    Ok(input.specs.as_ref().map(serde_json::to_string).transpose()?)
}

pub fn create_component_instance(
    pool: &DbPool,
    input: &ComponentInstanceInput,
) -> DbResult<ComponentInstance> {
    let specs = specs_text(input)?;
    let id = pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO component_instances
                 (component_id, environment_id, hostname, specs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                input.component_id,
                input.environment_id,
                input.hostname,
                specs,
                now()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_component_instance(pool, id)?
        .ok_or_else(|| DbError::NotFound(format!("ComponentInstance: {}", id)))
}

pub fn get_component_instance(pool: &DbPool, id: i64) -> DbResult<Option<ComponentInstance>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM component_instances WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn list_component_instances(pool: &DbPool) -> DbResult<Vec<ComponentInstance>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM component_instances ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn update_component_instance(
    pool: &DbPool,
    id: i64,
    input: &ComponentInstanceInput,
) -> DbResult<ComponentInstance> {
    let specs = specs_text(input)?;
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE component_instances
             SET component_id = ?1, environment_id = ?2, hostname = ?3, specs = ?4
             WHERE id = ?5",
            params![
                input.component_id,
                input.environment_id,
                input.hostname,
                specs,
                id
            ],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("ComponentInstance: {}", id)));
    }
    get_component_instance(pool, id)?
        .ok_or_else(|| DbError::NotFound(format!("ComponentInstance: {}", id)))
}

pub fn delete_component_instance(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute("DELETE FROM component_instances WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
