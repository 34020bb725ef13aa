//! Component and category queries.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{Category, Component, ComponentInput};

use super::{now, parse_column};
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, name, description, status, category_id, team_id, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: parse_column(3, row.get(3)?)?,
        category_id: row.get(4)?,
        team_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn create_category(pool: &DbPool, name: &str) -> DbResult<Category> {
    pool.with_conn(|conn| {
        conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    })
}

pub fn create_component(pool: &DbPool, input: &ComponentInput) -> DbResult<Component> {
    let id = pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO components (name, description, status, category_id, team_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.name,
                input.description,
                input.status.as_str(),
                input.category_id,
                input.team_id,
                now()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_component(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Component: {}", id)))
}

pub fn get_component(pool: &DbPool, id: i64) -> DbResult<Option<Component>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM components WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn list_components(pool: &DbPool) -> DbResult<Vec<Component>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM components ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn update_component(pool: &DbPool, id: i64, input: &ComponentInput) -> DbResult<Component> {
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE components
             SET name = ?1, description = ?2, status = ?3, category_id = ?4, team_id = ?5
             WHERE id = ?6",
            params![
                input.name,
                input.description,
                input.status.as_str(),
                input.category_id,
                input.team_id,
                id
            ],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("Component: {}", id)));
    }
    get_component(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Component: {}", id)))
}

/// Deleting a component cascades to its instances relationally only.
pub fn delete_component(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute("DELETE FROM components WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
