//! SQLite connection handling
//!
//! Every write that touches more than one row goes through
//! [`Database::write_transaction`], which takes the database write lock up
//! front (`BEGIN IMMEDIATE`). Two connections racing on the same book are
//! serialized by SQLite itself; the loser waits up to the busy timeout.

use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::config::Config;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};

/// How long a writer waits for another connection's lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owned SQLite connection with the schema initialized
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database file configured in `config`
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.database_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path).map_err(|source| StorageError::Open {
            path: path.clone(),
            source,
        })?;

        Self::configure(&conn)?;

        if needs_init(&conn) {
            tracing::info!("Initializing database schema at {:?}", path);
            init_schema(&conn).map_err(StorageError::Schema)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        init_schema(&conn).map_err(StorageError::Schema)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction that holds the write lock until commit
    pub fn write_transaction(&mut self) -> StorageResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().join("nested").join("data"),
            ..Config::default()
        }
    }

    #[test]
    fn test_open_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        let db = Database::open(&config).unwrap();
        assert!(config.database_path().exists());
        assert!(!needs_init(db.connection()));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let db = Database::open(&config).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO categories (id, name) VALUES ('c1', 'Romance')",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&config).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let result = db.connection().execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ('t', 'nobody', 0, 1)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_write_transaction_rolls_back_on_drop() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let tx = db.write_transaction().unwrap();
            tx.execute("INSERT INTO categories (id, name) VALUES ('c1', 'Poetry')", [])
                .unwrap();
        }

        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
