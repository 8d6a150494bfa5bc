use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use crate::error::StoreError;

/// A string-keyed store of string values.
///
/// An absent key is a normal outcome of `read`, not an error. Callers are
/// expected to tolerate `write` failing.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Key-value table in a local SQLite database.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process store. Nothing outlives the value.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sqlite_tests {
        use super::*;

        fn setup_store() -> SqliteStore {
            SqliteStore::open_in_memory().expect("Failed to create in-memory store")
        }

        #[test]
        fn init_creates_table() {
            let store = setup_store();
            let exists: bool = store
                .conn
                .query_row(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='kv'",
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists);
        }

        #[test]
        fn init_is_idempotent() {
            let store = setup_store();
            store.write("k", "v").unwrap();
            store.init().unwrap();
            assert_eq!(store.read("k").unwrap(), Some("v".to_string()));
        }

        #[test]
        fn read_missing_is_none() {
            let store = setup_store();
            assert_eq!(store.read("missing").unwrap(), None);
        }

        #[test]
        fn write_then_read() {
            let store = setup_store();
            store.write("k", "hello").unwrap();
            assert_eq!(store.read("k").unwrap(), Some("hello".to_string()));
        }

        #[test]
        fn write_overwrites() {
            let store = setup_store();
            store.write("k", "one").unwrap();
            store.write("k", "two").unwrap();
            assert_eq!(store.read("k").unwrap(), Some("two".to_string()));

            let count: i64 = store
                .conn
                .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 1);
        }

        #[test]
        fn remove_deletes_key() {
            let store = setup_store();
            store.write("k", "v").unwrap();
            store.remove("k").unwrap();
            assert_eq!(store.read("k").unwrap(), None);
        }

        #[test]
        fn remove_missing_is_ok() {
            let store = setup_store();
            assert!(store.remove("missing").is_ok());
        }

        #[test]
        fn persists_across_reopen() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("stats.db");

            {
                let store = SqliteStore::open(&path).unwrap();
                store.write("k", "durable").unwrap();
            }

            let store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.read("k").unwrap(), Some("durable".to_string()));
        }
    }

    mod memory_tests {
        use super::*;

        #[test]
        fn round_trip_and_remove() {
            let store = MemoryStore::new();
            assert_eq!(store.read("k").unwrap(), None);
            store.write("k", "v").unwrap();
            assert_eq!(store.read("k").unwrap(), Some("v".to_string()));
            store.remove("k").unwrap();
            assert_eq!(store.read("k").unwrap(), None);
        }

        #[test]
        fn keys_are_independent() {
            let store = MemoryStore::new();
            store.write("a", "1").unwrap();
            store.write("b", "2").unwrap();
            store.remove("a").unwrap();
            assert_eq!(store.read("b").unwrap(), Some("2".to_string()));
        }

        #[test]
        fn works_through_reference() {
            let store = MemoryStore::new();
            let by_ref = &store;
            by_ref.write("k", "v").unwrap();
            assert_eq!(store.read("k").unwrap(), Some("v".to_string()));
        }
    }
}
