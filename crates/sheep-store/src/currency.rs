//! CRUD operations for [`UserCurrency`] rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use sheep_shared::{UserCurrency, UserId};
use uuid::Uuid;

use crate::database::{
    conversion_err, from_sql_count, parse_json, parse_opt_ts, parse_ts, to_sql_count, Database,
};
use crate::error::Result;

const SELECT_CURRENCY: &str = "SELECT user_id, wool_coins, sheep_gems, last_daily_claim, last_gem_claim,
        last_box_claim, consecutive_days, selected_theme, unlocked_themes,
        selected_sheep_emoji, selected_particle, updated_at
 FROM user_currency
 WHERE user_id = ?1";

impl Database {
    pub fn find_currency(&self, user_id: UserId) -> Result<Option<UserCurrency>> {
        Ok(self
            .conn()
            .query_row(SELECT_CURRENCY, params![user_id.to_string()], row_to_currency)
            .optional()?)
    }

    /// Load the currency row, inserting a fresh one if the user has none.
    pub fn get_or_create_currency(&self, user_id: UserId, now: DateTime<Utc>) -> Result<UserCurrency> {
        if let Some(existing) = self.find_currency(user_id)? {
            return Ok(existing);
        }
        let fresh = UserCurrency::new(user_id, now);
        self.upsert_currency(&fresh)?;
        tracing::debug!(user = %user_id, "created currency row");
        Ok(fresh)
    }

    /// Write the full row, replacing whatever was stored.
    pub fn upsert_currency(&self, c: &UserCurrency) -> Result<()> {
        self.conn().execute(
            "INSERT INTO user_currency (
                 user_id, wool_coins, sheep_gems, last_daily_claim, last_gem_claim,
                 last_box_claim, consecutive_days, selected_theme, unlocked_themes,
                 selected_sheep_emoji, selected_particle, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(user_id) DO UPDATE SET
                 wool_coins = excluded.wool_coins,
                 sheep_gems = excluded.sheep_gems,
                 last_daily_claim = excluded.last_daily_claim,
                 last_gem_claim = excluded.last_gem_claim,
                 last_box_claim = excluded.last_box_claim,
                 consecutive_days = excluded.consecutive_days,
                 selected_theme = excluded.selected_theme,
                 unlocked_themes = excluded.unlocked_themes,
                 selected_sheep_emoji = excluded.selected_sheep_emoji,
                 selected_particle = excluded.selected_particle,
                 updated_at = excluded.updated_at",
            params![
                c.user_id.to_string(),
                to_sql_count(c.wool_coins),
                to_sql_count(c.sheep_gems),
                c.last_daily_claim.map(|t| t.to_rfc3339()),
                c.last_gem_claim.map(|t| t.to_rfc3339()),
                c.last_box_claim.map(|t| t.to_rfc3339()),
                c.consecutive_days,
                c.selected_theme,
                serde_json::to_string(&c.unlocked_themes)?,
                c.selected_sheep_emoji,
                c.selected_particle,
                c.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn row_to_currency(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserCurrency> {
    let user_id: String = row.get(0)?;
    let unlocked: String = row.get(8)?;
    let updated: String = row.get(11)?;

    Ok(UserCurrency {
        user_id: UserId(Uuid::parse_str(&user_id).map_err(|e| conversion_err(0, e))?),
        wool_coins: from_sql_count(row.get(1)?),
        sheep_gems: from_sql_count(row.get(2)?),
        last_daily_claim: parse_opt_ts(3, row.get(3)?)?,
        last_gem_claim: parse_opt_ts(4, row.get(4)?)?,
        last_box_claim: parse_opt_ts(5, row.get(5)?)?,
        consecutive_days: row.get(6)?,
        selected_theme: row.get(7)?,
        unlocked_themes: parse_json(8, &unlocked)?,
        selected_sheep_emoji: row.get(9)?,
        selected_particle: row.get(10)?,
        updated_at: parse_ts(11, &updated)?,
    })
}

#[cfg(test)]
mod tests {
    use sheep_shared::User;

    use super::*;

    fn db_with_user() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let user = User::anonymous(UserId::new(), 1, Utc::now());
        db.create_user(&user).unwrap();
        (db, user.id)
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let (db, id) = db_with_user();
        let first = db.get_or_create_currency(id, Utc::now()).unwrap();
        assert_eq!(first.wool_coins, 0);
        assert_eq!(first.unlocked_themes, vec!["cosmic"]);

        let mut changed = first.clone();
        changed.wool_coins = 99;
        db.upsert_currency(&changed).unwrap();

        let again = db.get_or_create_currency(id, Utc::now()).unwrap();
        assert_eq!(again.wool_coins, 99);
    }

    #[test]
    fn full_row_round_trip() {
        let (db, id) = db_with_user();
        let now = Utc::now();
        let mut c = UserCurrency::new(id, now);
        c.sheep_gems = 41;
        c.last_daily_claim = Some(now);
        c.last_box_claim = Some(now);
        c.consecutive_days = 3;
        c.unlocked_themes.push("forest".into());
        c.selected_theme = "forest".into();
        c.selected_particle = "⭐".into();
        db.upsert_currency(&c).unwrap();

        let loaded = db.find_currency(id).unwrap().unwrap();
        assert_eq!(loaded.sheep_gems, 41);
        assert_eq!(loaded.consecutive_days, 3);
        assert_eq!(loaded.unlocked_themes, vec!["cosmic", "forest"]);
        assert_eq!(loaded.selected_particle, "⭐");
        assert!(loaded.last_gem_claim.is_none());
        assert_eq!(loaded.last_box_claim.map(|t| t.timestamp()), Some(now.timestamp()));
    }
}
