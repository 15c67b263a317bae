//! Key-value store backing offline mode.
//!
//! A single `kv` table of text keys and text values. Callers decide the
//! encoding; the session stores scalars as plain text and collections as JSON.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::default_data_dir;
use crate::error::Result;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Open the store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let path = default_data_dir()?.join("local.db");
        tracing::info!(path = %path.display(), "opening local storage");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Returns `true` if the key existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_overwrite_remove() {
        let store = LocalStorage::open_in_memory().unwrap();
        assert_eq!(store.get("offline_total_clicks").unwrap(), None);

        store.set("offline_total_clicks", "10").unwrap();
        store.set("offline_total_clicks", "11").unwrap();
        assert_eq!(store.get("offline_total_clicks").unwrap().as_deref(), Some("11"));

        assert!(store.remove("offline_total_clicks").unwrap());
        assert!(!store.remove("offline_total_clicks").unwrap());
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        LocalStorage::open_at(&path).unwrap().set("sheep_user_id", "abc").unwrap();
        let reopened = LocalStorage::open_at(&path).unwrap();
        assert_eq!(reopened.get("sheep_user_id").unwrap().as_deref(), Some("abc"));
    }
}
