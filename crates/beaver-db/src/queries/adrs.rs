//! ADR queries.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{Adr, AdrInput, ParticipantRole};

use super::{now, parse_column};
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, title, description, status, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Adr> {
    Ok(Adr {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_column(3, row.get(3)?)?,
        created_at: row.get(4)?,
    })
}

/// Create an ADR together with its first OWNER participant.
pub fn create_adr(pool: &DbPool, input: &AdrInput, owner_user_id: i64) -> DbResult<Adr> {
    let id = pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO adrs (title, description, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![input.title, input.description, input.status.as_str(), now()],
        )?;
        let adr_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO adr_participants (adr_id, user_id, role) VALUES (?1, ?2, ?3)",
            params![adr_id, owner_user_id, ParticipantRole::Owner.as_str()],
        )?;
        tx.commit()?;
        Ok(adr_id)
    })?;
    get_adr(pool, id)?.ok_or_else(|| DbError::NotFound(format!("ADR: {}", id)))
}

pub fn get_adr(pool: &DbPool, id: i64) -> DbResult<Option<Adr>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adrs WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn list_adrs(pool: &DbPool) -> DbResult<Vec<Adr>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adrs ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn update_adr(pool: &DbPool, id: i64, input: &AdrInput) -> DbResult<Adr> {
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE adrs SET title = ?1, description = ?2, status = ?3 WHERE id = ?4",
            params![input.title, input.description, input.status.as_str(), id],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("ADR: {}", id)));
    }
    get_adr(pool, id)?.ok_or_else(|| DbError::NotFound(format!("ADR: {}", id)))
}

/// Deletes the ADR and, relationally, all of its associations.
pub fn delete_adr(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute("DELETE FROM adrs WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
