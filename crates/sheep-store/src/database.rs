//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

/// Platform data directory for the application, created if missing.
///
/// - Linux:   `~/.local/share/sheepclicker`
/// - macOS:   `~/Library/Application Support/com.sheepclicker.sheepclicker`
/// - Windows: `{FOLDERID_RoamingAppData}\sheepclicker\sheepclicker\data`
pub fn default_data_dir() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "sheepclicker", "sheepclicker").ok_or(StoreError::NoDataDir)?;
    let data_dir = project_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;
    Ok(data_dir.to_path_buf())
}

impl Database {
    /// Open (or create) the default application database.
    pub fn open_default() -> Result<Self> {
        let db_path = default_data_dir()?.join("sheep.db");
        tracing::info!(path = %db_path.display(), "opening database");
        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Private in-memory database, gone when dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// In-memory database with no schema installed.
    pub fn open_in_memory_without_schema() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Column helpers shared by the CRUD modules
// ---------------------------------------------------------------------------

pub(crate) fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_opt_ts(idx: usize, s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_ts(idx, &s)).transpose()
}

pub(crate) fn parse_opt_date(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| s.parse::<NaiveDate>().map_err(|e| conversion_err(idx, e)))
        .transpose()
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| conversion_err(idx, e))
}

/// Counters are stored as SQLite INTEGER (i64).
pub(crate) fn to_sql_count(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

pub(crate) fn from_sql_count(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/// Map "no rows" to [`StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        drop(db);

        // Reopening runs no migration twice.
        let db = Database::open_at(&path).expect("should reopen");
        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, migrations::CURRENT_VERSION);
    }

    #[test]
    fn missing_schema_is_detected() {
        let db = Database::open_in_memory_without_schema().unwrap();
        let err = db.find_user(sheep_shared::UserId::new()).unwrap_err();
        assert!(err.is_schema_missing(), "{err}");

        let db = Database::open_in_memory().unwrap();
        assert!(db.find_user(sheep_shared::UserId::new()).unwrap().is_none());
    }
}
