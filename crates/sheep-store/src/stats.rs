//! CRUD operations for [`UserStats`] rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use sheep_shared::{UserId, UserStats};
use uuid::Uuid;

use crate::database::{
    conversion_err, from_sql_count, parse_json, parse_opt_date, parse_ts, to_sql_count, Database,
};
use crate::error::Result;

impl Database {
    pub fn find_stats(&self, user_id: UserId) -> Result<Option<UserStats>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT user_id, messages_sent, highest_daily_clicks, longest_coin_streak,
                        total_days_active, first_click_date, last_active_date,
                        daily_click_history, updated_at
                 FROM user_stats
                 WHERE user_id = ?1",
                params![user_id.to_string()],
                row_to_stats,
            )
            .optional()?)
    }

    /// Load the stats row, inserting a fresh one if the user has none.
    pub fn get_or_create_stats(&self, user_id: UserId, now: DateTime<Utc>) -> Result<UserStats> {
        if let Some(existing) = self.find_stats(user_id)? {
            return Ok(existing);
        }
        let fresh = UserStats::new(user_id, now);
        self.upsert_stats(&fresh)?;
        tracing::debug!(user = %user_id, "created stats row");
        Ok(fresh)
    }

    /// Write the full row, replacing whatever was stored.
    pub fn upsert_stats(&self, s: &UserStats) -> Result<()> {
        self.conn().execute(
            "INSERT INTO user_stats (
                 user_id, messages_sent, highest_daily_clicks, longest_coin_streak,
                 total_days_active, first_click_date, last_active_date,
                 daily_click_history, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id) DO UPDATE SET
                 messages_sent = excluded.messages_sent,
                 highest_daily_clicks = excluded.highest_daily_clicks,
                 longest_coin_streak = excluded.longest_coin_streak,
                 total_days_active = excluded.total_days_active,
                 first_click_date = excluded.first_click_date,
                 last_active_date = excluded.last_active_date,
                 daily_click_history = excluded.daily_click_history,
                 updated_at = excluded.updated_at",
            params![
                s.user_id.to_string(),
                to_sql_count(s.messages_sent),
                to_sql_count(s.highest_daily_clicks),
                s.longest_coin_streak,
                s.total_days_active,
                s.first_click_date.map(|d| d.to_string()),
                s.last_active_date.map(|d| d.to_string()),
                serde_json::to_string(&s.daily_click_history)?,
                s.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn row_to_stats(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserStats> {
    let user_id: String = row.get(0)?;
    let history: String = row.get(7)?;
    let updated: String = row.get(8)?;

    Ok(UserStats {
        user_id: UserId(Uuid::parse_str(&user_id).map_err(|e| conversion_err(0, e))?),
        messages_sent: from_sql_count(row.get(1)?),
        highest_daily_clicks: from_sql_count(row.get(2)?),
        longest_coin_streak: row.get(3)?,
        total_days_active: row.get(4)?,
        first_click_date: parse_opt_date(5, row.get(5)?)?,
        last_active_date: parse_opt_date(6, row.get(6)?)?,
        daily_click_history: parse_json(7, &history)?,
        updated_at: parse_ts(8, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sheep_shared::User;

    use super::*;

    #[test]
    fn history_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let user = User::anonymous(UserId::new(), 3, Utc::now());
        db.create_user(&user).unwrap();

        let mut stats = db.get_or_create_stats(user.id, Utc::now()).unwrap();
        assert!(stats.daily_click_history.is_empty());

        let may1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let may3 = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        stats.daily_click_history.insert(may1, 12);
        stats.daily_click_history.insert(may3, 40);
        stats.total_days_active = 2;
        stats.highest_daily_clicks = 40;
        stats.first_click_date = Some(may1);
        stats.last_active_date = Some(may3);
        stats.messages_sent = 5;
        db.upsert_stats(&stats).unwrap();

        let loaded = db.find_stats(user.id).unwrap().unwrap();
        assert_eq!(loaded.daily_click_history, stats.daily_click_history);
        assert_eq!(loaded.first_click_date, Some(may1));
        assert_eq!(loaded.last_active_date, Some(may3));
        assert_eq!(loaded.highest_daily_clicks, 40);
        assert_eq!(loaded.messages_sent, 5);
    }
}
