//! SQLite connection handle and error types.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

/// Record store error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Connection(rusqlite::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("ADR {adr_id} must keep at least one OWNER participant")]
    OwnerInvariant { adr_id: i64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for record store operations.
pub type DbResult<T> = Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
            if err.code == ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| err.to_string());
                match err.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return DbError::UniqueViolation(detail)
                    }
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return DbError::ForeignKeyViolation(detail)
                    }
                    _ => {}
                }
            }
        }
        DbError::Connection(e)
    }
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

/// Shared SQLite connection. Cheap to clone.
#[derive(Clone)]
pub struct DbPool {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl DbPool {
    /// Open (or create) a database file.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    fn configure(conn: &Connection) -> DbResult<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure with a shared connection reference.
    pub fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&Connection) -> DbResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DbError::OperationFailed("connection mutex poisoned".to_string()))?;
        f(&conn)
    }

    /// Run a closure with a mutable connection (transactions, migrations).
    pub fn with_conn_mut<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| DbError::OperationFailed("connection mutex poisoned".to_string()))?;
        f(&mut conn)
    }

    /// Rows modified since the connection was opened.
    pub fn total_changes(&self) -> DbResult<i64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT total_changes()", [], |row| row.get(0))?;
            Ok(n)
        })
    }
}
