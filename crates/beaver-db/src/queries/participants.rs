//! ADR participant queries.
//!
//! Role changes and removals run inside a transaction that re-counts the
//! ADR's owners, so the last OWNER can never be demoted or removed.

use rusqlite::{params, OptionalExtension, Row, Transaction};

use beaver_core::model::{AdrParticipant, AdrParticipantInput, ParticipantRole};

use super::parse_column;
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, adr_id, user_id, role";

fn from_row(row: &Row<'_>) -> rusqlite::Result<AdrParticipant> {
    Ok(AdrParticipant {
        id: row.get(0)?,
        adr_id: row.get(1)?,
        user_id: row.get(2)?,
        role: parse_column(3, row.get(3)?)?,
    })
}

pub fn add_adr_participant(pool: &DbPool, input: &AdrParticipantInput) -> DbResult<AdrParticipant> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO adr_participants (adr_id, user_id, role) VALUES (?1, ?2, ?3)",
            params![input.adr_id, input.user_id, input.role.as_str()],
        )?;
        Ok(AdrParticipant {
            id: conn.last_insert_rowid(),
            adr_id: input.adr_id,
            user_id: input.user_id,
            role: input.role,
        })
    })
}

pub fn get_adr_participant(pool: &DbPool, id: i64) -> DbResult<Option<AdrParticipant>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adr_participants WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn find_adr_participant(
    pool: &DbPool,
    adr_id: i64,
    user_id: i64,
) -> DbResult<Option<AdrParticipant>> {
    pool.with_conn(|conn| {
        let sql = format!(
            "SELECT {} FROM adr_participants WHERE adr_id = ?1 AND user_id = ?2",
            COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![adr_id, user_id], from_row)
            .optional()?)
    })
}

pub fn list_adr_participants(pool: &DbPool) -> DbResult<Vec<AdrParticipant>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adr_participants ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

fn load_for_update(tx: &Transaction<'_>, id: i64) -> DbResult<AdrParticipant> {
    let sql = format!("SELECT {} FROM adr_participants WHERE id = ?1", COLUMNS);
    tx.query_row(&sql, params![id], from_row)
        .optional()?
        .ok_or_else(|| DbError::NotFound(format!("ADRParticipant: {}", id)))
}

fn owner_count(tx: &Transaction<'_>, adr_id: i64) -> DbResult<i64> {
    let n: i64 = tx.query_row(
        "SELECT COUNT(*) FROM adr_participants WHERE adr_id = ?1 AND role = 'OWNER'",
        params![adr_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Reject the change when it would take away the ADR's last OWNER.
fn guard_last_owner(tx: &Transaction<'_>, participant: &AdrParticipant) -> DbResult<()> {
    if participant.role == ParticipantRole::Owner && owner_count(tx, participant.adr_id)? <= 1 {
        return Err(DbError::OwnerInvariant {
            adr_id: participant.adr_id,
        });
    }
    Ok(())
}

pub fn update_participant_role(
    pool: &DbPool,
    id: i64,
    role: ParticipantRole,
) -> DbResult<AdrParticipant> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let mut participant = load_for_update(&tx, id)?;
        if role != ParticipantRole::Owner {
            guard_last_owner(&tx, &participant)?;
        }
        tx.execute(
            "UPDATE adr_participants SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        tx.commit()?;
        participant.role = role;
        Ok(participant)
    })
}

/// Returns the removed participant.
pub fn remove_adr_participant(pool: &DbPool, id: i64) -> DbResult<AdrParticipant> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let participant = load_for_update(&tx, id)?;
        guard_last_owner(&tx, &participant)?;
        tx.execute("DELETE FROM adr_participants WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(participant)
    })
}
