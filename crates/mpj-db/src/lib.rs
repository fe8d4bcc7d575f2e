pub mod journal;
pub mod migrations;
pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    /// The request does not exist or belongs to another user.
    #[error("not found")]
    NotFound,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),
    /// The caller's deadline passed before the write could commit; nothing
    /// was persisted.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

pub type Result<T> = std::result::Result<T, DbError>;

/// The journal store. Constructed once by the process entry point and shared
/// by reference across handlers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Access is serialized by the mutex; WAL is for crash safety and
        // outside readers of the file.
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn, busy_timeout)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, Duration::from_secs(2))
    }

    fn init(conn: Connection, busy_timeout: Duration) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(busy_timeout)?;

        migrations::ensure_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DbError::LockPoisoned(e.to_string()))?;
        f(&mut conn)
    }
}
