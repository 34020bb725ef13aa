//! ADR impact queries: ADR→instance rows and derived ADR→component links.

use rusqlite::{params, OptionalExtension, Row};

use beaver_core::model::{AdrComponent, AdrComponentInstance, AdrComponentInstanceInput};

use super::parse_column;
use crate::pool::{DbError, DbPool, DbResult};

const COLUMNS: &str = "id, adr_id, instance_id, impact_level, notes";

fn from_row(row: &Row<'_>) -> rusqlite::Result<AdrComponentInstance> {
    Ok(AdrComponentInstance {
        id: row.get(0)?,
        adr_id: row.get(1)?,
        instance_id: row.get(2)?,
        impact_level: parse_column(3, row.get(3)?)?,
        notes: row.get(4)?,
    })
}

pub fn create_adr_component_instance(
    pool: &DbPool,
    input: &AdrComponentInstanceInput,
) -> DbResult<AdrComponentInstance> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO adr_component_instances (adr_id, instance_id, impact_level, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                input.adr_id,
                input.instance_id,
                input.impact_level.as_str(),
                input.notes
            ],
        )?;
        Ok(AdrComponentInstance {
            id: conn.last_insert_rowid(),
            adr_id: input.adr_id,
            instance_id: input.instance_id,
            impact_level: input.impact_level,
            notes: input.notes.clone(),
        })
    })
}

pub fn get_adr_component_instance(
    pool: &DbPool,
    id: i64,
) -> DbResult<Option<AdrComponentInstance>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adr_component_instances WHERE id = ?1", COLUMNS);
        Ok(conn.query_row(&sql, params![id], from_row).optional()?)
    })
}

pub fn find_adr_component_instance(
    pool: &DbPool,
    adr_id: i64,
    instance_id: i64,
) -> DbResult<Option<AdrComponentInstance>> {
    pool.with_conn(|conn| {
        let sql = format!(
            "SELECT {} FROM adr_component_instances WHERE adr_id = ?1 AND instance_id = ?2",
            COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![adr_id, instance_id], from_row)
            .optional()?)
    })
}

pub fn list_adr_component_instances(pool: &DbPool) -> DbResult<Vec<AdrComponentInstance>> {
    pool.with_conn(|conn| {
        let sql = format!("SELECT {} FROM adr_component_instances ORDER BY id", COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

/// Only impact level and notes are mutable; the (adr, instance) pair is the
/// row's identity.
pub fn update_adr_component_instance(
    pool: &DbPool,
    id: i64,
    input: &AdrComponentInstanceInput,
) -> DbResult<AdrComponentInstance> {
    let changed = pool.with_conn(|conn| {
        Ok(conn.execute(
            "UPDATE adr_component_instances SET impact_level = ?1, notes = ?2 WHERE id = ?3",
            params![input.impact_level.as_str(), input.notes, id],
        )?)
    })?;
    if changed == 0 {
        return Err(DbError::NotFound(format!("ADRComponentInstance: {}", id)));
    }
    get_adr_component_instance(pool, id)?
        .ok_or_else(|| DbError::NotFound(format!("ADRComponentInstance: {}", id)))
}

pub fn delete_adr_component_instance(pool: &DbPool, id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM adr_component_instances WHERE id = ?1",
            params![id],
        )?;
        Ok(n > 0)
    })
}

pub fn list_adr_components(pool: &DbPool) -> DbResult<Vec<AdrComponent>> {
    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT adr_id, component_id FROM adr_components ORDER BY adr_id, component_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AdrComponent {
                adr_id: row.get(0)?,
                component_id: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    })
}

pub fn find_adr_component(
    pool: &DbPool,
    adr_id: i64,
    component_id: i64,
) -> DbResult<Option<AdrComponent>> {
    pool.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT adr_id, component_id FROM adr_components
                 WHERE adr_id = ?1 AND component_id = ?2",
                params![adr_id, component_id],
                |row| {
                    Ok(AdrComponent {
                        adr_id: row.get(0)?,
                        component_id: row.get(1)?,
                    })
                },
            )
            .optional()?)
    })
}

/// Fails with [`DbError::UniqueViolation`] when the link already exists.
pub fn create_adr_component(
    pool: &DbPool,
    adr_id: i64,
    component_id: i64,
) -> DbResult<AdrComponent> {
    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO adr_components (adr_id, component_id) VALUES (?1, ?2)",
            params![adr_id, component_id],
        )?;
        Ok(AdrComponent {
            adr_id,
            component_id,
        })
    })
}

pub fn delete_adr_component(pool: &DbPool, adr_id: i64, component_id: i64) -> DbResult<bool> {
    pool.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM adr_components WHERE adr_id = ?1 AND component_id = ?2",
            params![adr_id, component_id],
        )?;
        Ok(n > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::{adrs, components, users};
    use beaver_core::model::{AdrInput, ComponentInput, ImpactLevel, UserInput};

    #[test]
    fn test_duplicate_adr_component_is_unique_violation() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        let user = users::create_user(
            &pool,
            &UserInput {
                name: "Cy".into(),
                email: "cy@example.com".into(),
            },
        )
        .unwrap();
        let adr = adrs::create_adr(&pool, &AdrInput::titled("Cache tier"), user.id).unwrap();
        let comp = components::create_component(&pool, &ComponentInput::named("cache")).unwrap();

        create_adr_component(&pool, adr.id, comp.id).unwrap();
        let err = create_adr_component(&pool, adr.id, comp.id).unwrap_err();
        assert!(err.is_unique_violation());
        assert!(find_adr_component(&pool, adr.id, comp.id).unwrap().is_some());
        assert!(find_adr_component(&pool, adr.id, comp.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_update_impact_keeps_identity() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        let err = update_adr_component_instance(
            &pool,
            1,
            &AdrComponentInstanceInput {
                adr_id: 1,
                instance_id: 1,
                impact_level: ImpactLevel::High,
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
