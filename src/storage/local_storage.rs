use rusqlite::{OptionalExtension, Result as SqlResult, params};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::database::Database;
use crate::network::TokenSource;

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "token";

/// Persistent key/value store, the desktop counterpart of browser local storage.
pub struct LocalStorage {
    db: Mutex<Database>,
}

impl LocalStorage {
    /// Open the store at a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        Self::from_database(Database::new(path)?)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::from_database(Database::in_memory()?)
    }

    fn from_database(db: Database) -> SqlResult<Self> {
        db.connection().execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    pub fn get_item(&self, key: &str) -> SqlResult<Option<String>> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.connection()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    /// Insert or replace a value
    pub fn set_item(&self, key: &str, value: &str) -> SqlResult<()> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.connection().execute(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> SqlResult<()> {
        let db = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        db.connection()
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl TokenSource for LocalStorage {
    fn token(&self) -> Option<String> {
        match self.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|value| !value.is_empty()),
            Err(err) => {
                log::warn!("Failed to read token from local storage: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_roundtrip() {
        let storage = LocalStorage::in_memory().unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);

        storage.set_item("a", "1").unwrap();
        storage.set_item("a", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("2"));

        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
    }

    #[test]
    fn token_is_read_on_every_call() {
        let storage = LocalStorage::in_memory().unwrap();
        assert_eq!(storage.token(), None);

        storage.set_item(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.token().as_deref(), Some("abc"));

        storage.set_item(TOKEN_KEY, "").unwrap();
        assert_eq!(storage.token(), None);
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.db");
        {
            let storage = LocalStorage::with_path(&path).unwrap();
            storage.set_item(TOKEN_KEY, "persisted").unwrap();
        }
        let storage = LocalStorage::with_path(&path).unwrap();
        assert_eq!(storage.token().as_deref(), Some("persisted"));
    }
}
