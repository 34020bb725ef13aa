//! User queries.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{User, UserInput};

use crate::pool::{DbError, DbPool, DbResult};

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

pub fn create_user(pool: &DbPool, input: &UserInput) -> DbResult<User> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![input.name, input.email],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            email: input.email.clone(),
        })
    })
}

pub fn get_user(pool: &DbPool, id: i64) -> DbResult<Option<User>> {
    pool.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

pub fn list_users(pool: &DbPool) -> DbResult<Vec<User>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY id")?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

/// Deleting a user removes its participations; an ADR left without an
/// OWNER is rejected.
pub fn delete_user(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let orphaned: Option<i64> = tx
            .query_row(
                "SELECT p.adr_id FROM adr_participants p
                 WHERE p.user_id = ?1 AND p.role = 'OWNER'
                   AND (SELECT COUNT(*) FROM adr_participants o
                        WHERE o.adr_id = p.adr_id AND o.role = 'OWNER') = 1
                 LIMIT 1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(adr_id) = orphaned {
            return Err(DbError::OwnerInvariant { adr_id });
        }
        let n = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(n > 0)
    })
}
