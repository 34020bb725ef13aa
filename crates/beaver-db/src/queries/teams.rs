//! Team queries.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{Team, TeamInput};

use super::now;
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, name, description, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn create_team(pool: &DbPool, input: &TeamInput) -> DbResult<Team> {
    let id = pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO teams (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![input.name, input.description, now()],
        )?;
        Ok(conn.last_insert_rowid())
    })?;
    get_team(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Team: {}", id)))
}

pub fn get_team(pool: &DbPool, id: i64) -> DbResult<Option<Team>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM teams WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn list_teams(pool: &DbPool) -> DbResult<Vec<Team>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM teams ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn update_team(
    pool: &DbPool,
    id: i64,
    input: &TeamInput,
) -> DbResult<Team> {
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE teams SET name = ?1, description = ?2 WHERE id = ?3",
            params![input.name, input.description, id],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("Team: {}", id)));
    }
    get_team(pool, id)?.ok_or_else(|| DbError::NotFound(format!("Team: {}", id)))
}

/// Returns `false` when no row had that id.
pub fn delete_team(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute("DELETE FROM teams WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::components;
    use beaver_core::model::ComponentInput;

    #[test]
    fn test_list_in_id_order() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        create_team(&pool, &TeamInput::named("platform")).unwrap();
        create_team(&pool, &TeamInput::named("payments")).unwrap();
        let names: Vec<_> = list_teams(&pool).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["platform", "payments"]);
    }

    #[test]
    fn test_delete_detaches_components() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        let team = create_team(&pool, &TeamInput::named("platform")).unwrap();
        let comp =
            components::create_component(&pool, &ComponentInput::named("gateway").managed_by(team.id))
                .unwrap();
        assert_eq!(comp.team_id, Some(team.id));

        assert!(delete_team(&pool, team.id).unwrap());
        let comp = components::get_component(&pool, comp.id).unwrap().unwrap();
        assert_eq!(comp.team_id, None);
    }
}
