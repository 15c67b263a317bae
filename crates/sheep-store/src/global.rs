//! The singleton global click counter.

use chrono::{DateTime, Utc};
use rusqlite::params;
use sheep_shared::constants::GLOBAL_STATS_ID;
use sheep_shared::GlobalStats;

use crate::database::{from_sql_count, not_found, parse_ts, to_sql_count, Database};
use crate::error::Result;

impl Database {
    pub fn get_global_stats(&self) -> Result<GlobalStats> {
        self.conn()
            .query_row(
                "SELECT total_sheep, updated_at FROM global_stats WHERE id = ?1",
                params![GLOBAL_STATS_ID],
                row_to_global,
            )
            .map_err(not_found)
    }

    /// Add `delta` to the global counter in a single statement and return
    /// the new value. Concurrent writers never lose each other's clicks.
    pub fn increment_global_stats(&self, delta: u64, now: DateTime<Utc>) -> Result<GlobalStats> {
        self.conn()
            .query_row(
                "INSERT INTO global_stats (id, total_sheep, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     total_sheep = total_sheep + excluded.total_sheep,
                     updated_at = excluded.updated_at
                 RETURNING total_sheep, updated_at",
                params![GLOBAL_STATS_ID, to_sql_count(delta), now.to_rfc3339()],
                row_to_global,
            )
            .map_err(not_found)
    }
}

fn row_to_global(row: &rusqlite::Row<'_>) -> rusqlite::Result<GlobalStats> {
    let total: i64 = row.get(0)?;
    let updated: String = row.get(1)?;
    Ok(GlobalStats {
        total_sheep: from_sql_count(total),
        updated_at: parse_ts(1, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_accumulates() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_global_stats().unwrap().total_sheep, 0);

        assert_eq!(db.increment_global_stats(10, Utc::now()).unwrap().total_sheep, 10);
        assert_eq!(db.increment_global_stats(5, Utc::now()).unwrap().total_sheep, 15);
        assert_eq!(db.get_global_stats().unwrap().total_sheep, 15);
    }

    #[test]
    fn two_connections_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.db");
        let a = Database::open_at(&path).unwrap();
        let b = Database::open_at(&path).unwrap();

        for _ in 0..50 {
            a.increment_global_stats(1, Utc::now()).unwrap();
            b.increment_global_stats(2, Utc::now()).unwrap();
        }
        assert_eq!(a.get_global_stats().unwrap().total_sheep, 150);
    }
}
