//! Environment queries.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{Environment, EnvironmentInput};

use super::now;
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, name, description, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Environment> {
    Ok(Environment {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn create_environment(pool: &DbPool, input: &EnvironmentInput) -> DbResult<Environment> {
    let id = pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO environments (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![input.name, input.description, now()],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_environment(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Environment: {}", id)))
}

pub fn get_environment(pool: &DbPool, id: i64) -> DbResult<Option<Environment>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM environments WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn list_environments(pool: &DbPool) -> DbResult<Vec<Environment>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM environments ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn update_environment(
    pool: &DbPool,
    id: i64,
    input: &EnvironmentInput,
) -> DbResult<Environment> {
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE environments SET name = ?1, description = ?2 WHERE id = ?3",
            params![input.name, input.description, id],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("Environment: {}", id)));
    }
    get_environment(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Environment: {}", id)))
}

/// Returns `false` when no row had that id.
pub fn delete_environment(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute("DELETE FROM environments WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
