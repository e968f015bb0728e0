use std::path::Path;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use rusqlite::Connection;
use crate::errors::AttestError;
use super::backend::StorageBackend;

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

/// Single-table key/value store in a SQLite database file.
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
    label: String,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self, AttestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AttestError::Persistence(format!("Failed to open database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| AttestError::Persistence(format!("Failed to set pragmas: {}", e)))?;

        Self::initialize(conn, format!("sqlite:{}", path.display()))
    }

    pub fn in_memory() -> Result<Self, AttestError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AttestError::Persistence(format!("Failed to open in-memory db: {}", e)))?;
        Self::initialize(conn, "sqlite::memory:".to_string())
    }

    fn initialize(conn: Connection, label: String) -> Result<Self, AttestError> {
        conn.execute_batch(CREATE_TABLES)
            .map_err(|e| AttestError::Persistence(format!("Failed to create tables: {}", e)))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)), label })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AttestError> {
        self.conn.lock()
            .map_err(|_| AttestError::Persistence("sqlite connection poisoned".into()))
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, AttestError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")
            .map_err(|e| AttestError::Persistence(format!("Query failed: {}", e)))?;

        match stmt.query_row(rusqlite::params![key], |row: &rusqlite::Row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AttestError::Persistence(format!("Query error: {}", e))),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AttestError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            rusqlite::params![key, value],
        ).map_err(|e| AttestError::Persistence(format!("Insert failed: {}", e)))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
