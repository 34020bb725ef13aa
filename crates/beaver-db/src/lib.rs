//! Beaver Database Layer
//!
//! The relational record store is the source of truth for the catalogue.
//! It is consumed through the [`RecordStore`] trait; [`DbPool`] implements it
//! on top of SQLite.

pub mod migrations;
pub mod pool;
pub mod queries;
pub mod store;

pub use pool::{DbError, DbPool, DbResult};
pub use store::RecordStore;

/// Open a database file and bring its schema up to date.
pub fn init_pool(path: &std::path::Path) -> DbResult<DbPool> {
    let pool = DbPool::open(path)?;
    migrations::run_migrations(&pool)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_table(pool: &DbPool, name: &str) -> bool {
        pool.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
        .unwrap()
    }

    #[test]
    fn test_open_leaves_schema_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beaver.db");

        let raw = DbPool::open(&path).unwrap();
        assert!(!has_table(&raw, "components"));
        drop(raw);

        let pool = init_pool(&path).unwrap();
        assert!(has_table(&pool, "components"));
    }
}
