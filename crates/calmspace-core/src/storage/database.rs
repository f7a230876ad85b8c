//! SQLite-backed key-value storage.
//!
//! Holds the point balance and the per-activity daily records in a single
//! `kv` table at `~/.config/calmspace/calmspace.db`. Several processes may
//! open the same file; `update` takes SQLite's write lock up front so their
//! read-modify-write cycles never interleave.

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::{data_dir, KeyValueStore};
use crate::error::{classify_sqlite, Result, StorageError};

/// How long a connection waits for another writer before reporting `Locked`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database for durable key-value state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/calmspace.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory or the database cannot be
    /// opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("calmspace.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn, path)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(conn, Path::new(":memory:"))
    }

    fn from_connection(conn: Connection, path: &Path) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|source| StorageError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| StorageError::write("kv", e))?;
        Ok(())
    }
}

fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()
    .map_err(|e| classify_sqlite(key, e, false))
}

fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(|e| classify_sqlite(key, e, true))?;
    Ok(())
}

fn kv_remove(conn: &Connection, key: &str) -> Result<(), StorageError> {
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
        .map_err(|e| classify_sqlite(key, e, true))?;
    Ok(())
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        kv_get(&self.conn, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        kv_set(&self.conn, key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        kv_remove(&self.conn, key)
    }

    /// Writes every entry inside one transaction.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let first_key = entries.first().map(|(k, _)| *k).unwrap_or_default();
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| classify_sqlite(first_key, e, true))?;
        for (key, value) in entries {
            kv_set(&tx, key, value)?;
        }
        tx.commit().map_err(|e| classify_sqlite(first_key, e, true))?;
        Ok(())
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is held from the first read, so another connection's
    /// update waits (up to the busy timeout) instead of reading a value this
    /// one is about to replace. Rolled back when `f` fails.
    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| classify_sqlite("kv", e, true))?;
        f(&InTransaction { conn: &tx })?;
        tx.commit().map_err(|e| classify_sqlite("kv", e, true))?;
        Ok(())
    }
}

/// Store view over an open transaction, handed to `update` callbacks.
struct InTransaction<'a> {
    conn: &'a Connection,
}

impl KeyValueStore for InTransaction<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        kv_get(self.conn, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        kv_set(self.conn, key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        kv_remove(self.conn, key)
    }

    fn update(&self, f: &mut dyn FnMut(&dyn KeyValueStore) -> Result<()>) -> Result<()> {
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.get("test").unwrap().is_none());
        db.set("test", "hello").unwrap();
        assert_eq!(db.get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn set_many_writes_all_entries() {
        let db = Database::open_memory().unwrap();
        db.set_many(&[("points.total", "15"), ("points.game.daily", "{}")])
            .unwrap();
        assert_eq!(db.get("points.total").unwrap().as_deref(), Some("15"));
        assert_eq!(db.get("points.game.daily").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn remove_deletes_key() {
        let db = Database::open_memory().unwrap();
        db.set("k", "v").unwrap();
        db.remove("k").unwrap();
        assert!(db.get("k").unwrap().is_none());
        // Removing a missing key is not an error.
        db.remove("k").unwrap();
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calmspace.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.set("points.total", "42").unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.get("points.total").unwrap().as_deref(), Some("42"));
    }

    #[test]
    fn failed_update_rolls_back() {
        let db = Database::open_memory().unwrap();
        db.set("points.total", "10").unwrap();

        let result = db.update(&mut |store| {
            store.set("points.total", "99")?;
            Err(crate::CoreError::Custom("abort".into()))
        });

        assert!(result.is_err());
        assert_eq!(db.get("points.total").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn update_blocks_second_connection_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calmspace.db");
        let db = Database::open_at(&path).unwrap();
        let other = Database::open_at(&path).unwrap();
        other
            .conn
            .busy_timeout(Duration::from_millis(10))
            .unwrap();

        db.update(&mut |store| {
            store.set("points.total", "7")?;
            // Another writer cannot start while this update holds the lock.
            let err = other.set("points.total", "1").unwrap_err();
            assert!(matches!(err, StorageError::Locked));
            Ok(())
        })
        .unwrap();

        assert_eq!(other.get("points.total").unwrap().as_deref(), Some("7"));
    }
}
