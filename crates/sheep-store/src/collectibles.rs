//! Collectible catalog and ownership records.

use rusqlite::params;
use sheep_shared::{Collectible, CollectibleKind, ObtainedFrom, Rarity, UserCollectible, UserId};
use uuid::Uuid;

use crate::database::{conversion_err, from_sql_count, parse_ts, Database};
use crate::error::Result;

#[derive(Debug, thiserror::Error)]
#[error("unknown enum value {0:?}")]
struct UnknownValue(String);

impl Database {
    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    /// Entire catalog, cheapest first within each kind.
    pub fn list_collectibles(&self) -> Result<Vec<Collectible>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, emoji, kind, rarity, gem_cost
             FROM collectibles
             ORDER BY kind ASC, gem_cost ASC, id ASC",
        )?;

        let rows = stmt.query_map([], row_to_collectible)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    pub fn list_user_collectibles(&self, user_id: UserId) -> Result<Vec<UserCollectible>> {
        let mut stmt = self.conn().prepare(
            "SELECT user_id, collectible_id, obtained_at, obtained_from
             FROM user_collectibles
             WHERE user_id = ?1
             ORDER BY obtained_at ASC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], row_to_ownership)?;

        let mut owned = Vec::new();
        for row in rows {
            owned.push(row?);
        }
        Ok(owned)
    }

    /// Record ownership. Returns `false` when the user already owned the
    /// item; the existing record is left untouched.
    pub fn grant_collectible(&self, record: &UserCollectible) -> Result<bool> {
        let inserted = self.conn().execute(
            "INSERT OR IGNORE INTO user_collectibles
                 (user_id, collectible_id, obtained_at, obtained_from)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.user_id.to_string(),
                record.collectible_id,
                record.obtained_at.to_rfc3339(),
                record.obtained_from.as_str(),
            ],
        )?;
        Ok(inserted > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_collectible(row: &rusqlite::Row<'_>) -> rusqlite::Result<Collectible> {
    let kind: String = row.get(3)?;
    let rarity: String = row.get(4)?;
    let gem_cost: i64 = row.get(5)?;

    Ok(Collectible {
        id: row.get(0)?,
        name: row.get(1)?,
        emoji: row.get(2)?,
        kind: CollectibleKind::parse(&kind).ok_or_else(|| conversion_err(3, UnknownValue(kind.clone())))?,
        rarity: Rarity::parse(&rarity).ok_or_else(|| conversion_err(4, UnknownValue(rarity.clone())))?,
        gem_cost: from_sql_count(gem_cost),
    })
}

fn row_to_ownership(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserCollectible> {
    let user_str: String = row.get(0)?;
    let obtained_at: String = row.get(2)?;
    let from: String = row.get(3)?;

    Ok(UserCollectible {
        user_id: UserId(Uuid::parse_str(&user_str).map_err(|e| conversion_err(0, e))?),
        collectible_id: row.get(1)?,
        obtained_at: parse_ts(2, &obtained_at)?,
        obtained_from: ObtainedFrom::parse(&from).ok_or_else(|| conversion_err(3, UnknownValue(from.clone())))?,
    })
}
