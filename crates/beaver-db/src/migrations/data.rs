//! Data migrations applied after the schema is current.

use rusqlite::params;
use tracing::info;

use beaver_core::model::{AdrComponent, SEEDED_ENVIRONMENTS};

use crate::pool::{DbPool, DbResult};
use crate::queries::now;

/// Insert the standard environments that do not exist yet.
///
/// Returns how many were inserted.
pub fn seed_environments(pool: &DbPool) -> DbResult<usize> {
    pool.with_conn(|conn| {
        let mut inserted = 0;
        for (name, description) in SEEDED_ENVIRONMENTS {
            inserted += conn.execute(
                "INSERT OR IGNORE INTO environments (name, description, created_at)
                 VALUES (?1, ?2, ?3)",
                params![name, description, now()],
            )?;
        }
        if inserted > 0 {
            info!(inserted, "Seeded environments");
        }
        Ok(inserted)
    })
}

/// Rewrite legacy component statuses (`INACTIVE`) to `DEPRECATED`.
pub fn normalize_component_statuses(pool: &DbPool) -> DbResult<usize> {
    pool.with_conn(|conn| {
        let updated = conn.execute(
            "UPDATE components SET status = 'DEPRECATED' WHERE UPPER(status) = 'INACTIVE'",
            [],
        )?;
        let uppercased = conn.execute(
            "UPDATE components SET status = UPPER(status) WHERE status <> UPPER(status)",
            [],
        )?;
        if updated + uppercased > 0 {
            info!(updated, uppercased, "Normalized component statuses");
        }
        Ok(updated + uppercased)
    })
}

/// Create the ADR→component links implied by ADR→instance rows.
///
/// Returns the links that were missing and have been inserted.
pub fn backfill_adr_components(pool: &DbPool) -> DbResult<Vec<AdrComponent>> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let missing = {
            let mut stmt = tx.prepare(
                "SELECT DISTINCT aci.adr_id, ci.component_id
                 FROM adr_component_instances aci
                 JOIN component_instances ci ON ci.id = aci.instance_id
                 LEFT JOIN adr_components ac
                   ON ac.adr_id = aci.adr_id AND ac.component_id = ci.component_id
                 WHERE ac.adr_id IS NULL
                 ORDER BY aci.adr_id, ci.component_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(AdrComponent {
                    adr_id: row.get(0)?,
                    component_id: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        for link in &missing {
            tx.execute(
                "INSERT INTO adr_components (adr_id, component_id) VALUES (?1, ?2)",
                params![link.adr_id, link.component_id],
            )?;
        }
        tx.commit()?;

        if !missing.is_empty() {
            info!(created = missing.len(), "Backfilled ADR component links");
        }
        Ok(missing)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::{adrs, components, environments, impacts, instances, users};
    use beaver_core::model::*;

    fn pool() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn test_seed_environments_is_idempotent() {
        let pool = pool();
        assert_eq!(seed_environments(&pool).unwrap(), 3);
        assert_eq!(seed_environments(&pool).unwrap(), 0);
        let names: Vec<_> = environments::list_environments(&pool)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["development", "homologation", "production"]);
    }

    #[test]
    fn test_normalize_legacy_status() {
        let pool = pool();
        let c = components::create_component(&pool, &ComponentInput::named("billing")).unwrap();
        pool.with_conn(|conn| {
            conn.execute(
                "UPDATE components SET status = 'inactive' WHERE id = ?1",
                params![c.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert_eq!(normalize_component_statuses(&pool).unwrap(), 1);
        let c = components::get_component(&pool, c.id).unwrap().unwrap();
        assert_eq!(c.status, ComponentStatus::Deprecated);
    }

    #[test]
    fn test_backfill_adr_components() {
        let pool = pool();
        let env = environments::create_environment(&pool, &EnvironmentInput::named("dev")).unwrap();
        let comp = components::create_component(&pool, &ComponentInput::named("api")).unwrap();
        let inst =
            instances::create_component_instance(&pool, &ComponentInstanceInput::new(comp.id, env.id))
                .unwrap();
        let user = users::create_user(
            &pool,
            &UserInput {
                name: "Ana".into(),
                email: "ana@example.com".into(),
            },
        )
        .unwrap();
        let adr = adrs::create_adr(&pool, &AdrInput::titled("Use Neo4j"), user.id).unwrap();
        impacts::create_adr_component_instance(&pool, &AdrComponentInstanceInput::new(adr.id, inst.id))
            .unwrap();

        let created = backfill_adr_components(&pool).unwrap();
        assert_eq!(
            created,
            vec![AdrComponent {
                adr_id: adr.id,
                component_id: comp.id
            }]
        );
        assert!(backfill_adr_components(&pool).unwrap().is_empty());
    }
}
