//! `SQLite`-backed key/value store

use rusqlite::{params, OptionalExtension};

use crate::db::Database;
use crate::error::Result;
use crate::registry::KeyValueStore;
use crate::util::unix_millis_now;

/// `SQLite` implementation of `KeyValueStore`
pub struct SqliteStore {
    db: Database,
    in_transaction: bool,
}

impl SqliteStore {
    pub const fn new(db: Database) -> Self {
        Self {
            db,
            in_transaction: false,
        }
    }

    /// Open (or create) the store file at `path`
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub const fn database(&self) -> &Database {
        &self.db
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .connection()
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.db.connection().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, unix_millis_now()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.db
            .connection()
            .execute("DELETE FROM kv WHERE key = ?", params![key])?;
        Ok(())
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`, so the write lock is held from the
    /// first read. Other handles on the same file wait on the busy timeout.
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.in_transaction {
            return f(self);
        }

        self.db.connection().execute_batch("BEGIN IMMEDIATE")?;
        self.in_transaction = true;
        let result = f(self);
        self.in_transaction = false;

        let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };
        if let Err(error) = self.db.connection().execute_batch(finish) {
            if result.is_ok() {
                self.db.connection().execute_batch("ROLLBACK").ok();
                return Err(error.into());
            }
            tracing::warn!("Rollback failed: {error}");
        }
        result
    }
}
