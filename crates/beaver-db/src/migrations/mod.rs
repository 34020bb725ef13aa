//! Database migrations: schema, data fixes and backups.

pub mod data;

use std::path::{Path, PathBuf};

use rusqlite::params;
use rusqlite_migration::{Migrations, M};
use tracing::info;

use crate::pool::{DbError, DbPool, DbResult};

/// SQL schema definition.
const SCHEMA: &str = include_str!("schema.sql");

/// Run all schema migrations.
pub fn run_migrations(pool: &DbPool) -> DbResult<()> {
    let migrations = Migrations::new(vec![M::up(SCHEMA)]);

    pool.with_conn_mut(|conn| {
        migrations
            .to_latest(conn)
            .map_err(|e| DbError::Migration(e.to_string()))
    })
}

/// Write a consistent copy of the database into `dir`.
///
/// Returns the path of the backup file.
pub fn backup(pool: &DbPool, dir: &Path) -> DbResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DbError::Backup(e.to_string()))?;

    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let target = dir.join(format!("beaver-{}.db", stamp));
    let target_str = target
        .to_str()
        .ok_or_else(|| DbError::Backup(format!("non UTF-8 path: {}", target.display())))?
        .to_string();

    pool.with_conn(|conn| {
        conn.execute("VACUUM INTO ?1", params![target_str])
            .map_err(|e| DbError::Backup(e.to_string()))?;
        Ok(())
    })?;

    info!(path = %target.display(), "Database backup written");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();

        pool.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='component_instances'",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_migrations_are_repeatable() {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();
    }

    #[test]
    fn test_backup_writes_a_readable_copy() {
        let dir = tempfile::tempdir().unwrap();
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        crate::queries::environments::create_environment(
            &pool,
            &beaver_core::model::EnvironmentInput::named("development"),
        )
        .unwrap();

        let path = backup(&pool, dir.path()).unwrap();
        assert!(path.exists());

        let copy = DbPool::open(&path).unwrap();
        let envs = crate::queries::environments::list_environments(&copy).unwrap();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].name, "development");
    }
}
