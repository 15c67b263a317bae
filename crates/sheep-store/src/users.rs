//! CRUD operations for [`User`] records and the leaderboard query.

use rusqlite::{params, OptionalExtension};
use sheep_shared::{LeaderboardEntry, User, UserId};
use uuid::Uuid;

use crate::database::{conversion_err, from_sql_count, parse_ts, to_sql_count, Database};
use crate::error::Result;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new user.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, nickname, total_clicks, tier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.nickname,
                to_sql_count(user.total_clicks),
                user.tier,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by id, `None` when the row is absent.
    pub fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, nickname, total_clicks, tier, created_at
                 FROM users
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .optional()?)
    }

    /// Players with the most clicks, ties broken by who joined first.
    pub fn top_users(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, nickname, total_clicks, tier, created_at
             FROM users
             ORDER BY total_clicks DESC, created_at ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_user)?;

        let mut entries = Vec::new();
        for (i, row) in rows.enumerate() {
            let user = row?;
            entries.push(LeaderboardEntry {
                id: user.id,
                nickname: user.nickname,
                total_clicks: user.total_clicks,
                tier: user.tier,
                rank: i as u32 + 1,
            });
        }
        Ok(entries)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Overwrite nickname, click total and displayed tier.
    /// Returns `true` if the user existed.
    pub fn update_user(&self, user: &User) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET nickname = ?2, total_clicks = ?3, tier = ?4 WHERE id = ?1",
            params![
                user.id.to_string(),
                user.nickname,
                to_sql_count(user.total_clicks),
                user.tier,
            ],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let nickname: String = row.get(1)?;
    let total_clicks: i64 = row.get(2)?;
    let tier: u8 = row.get(3)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| conversion_err(0, e))?;

    Ok(User {
        id: UserId(id),
        nickname,
        total_clicks: from_sql_count(total_clicks),
        tier,
        created_at: parse_ts(4, &created_str)?,
    })
}
