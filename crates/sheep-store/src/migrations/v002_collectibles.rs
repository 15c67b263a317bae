//! v002 -- Collectible catalog and ownership.
//!
//! Creates `collectibles` and `user_collectibles` and seeds the catalog from
//! the built-in list.

use rusqlite::{params, Connection};
use sheep_shared::collectibles::default_catalog;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collectibles (
    id       TEXT PRIMARY KEY NOT NULL,
    name     TEXT NOT NULL,
    emoji    TEXT NOT NULL,
    kind     TEXT NOT NULL CHECK (kind IN ('sheep_emoji', 'particle')),
    rarity   TEXT NOT NULL CHECK (rarity IN ('free', 'normal', 'epic', 'legendary')),
    gem_cost INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_collectibles (
    user_id        TEXT NOT NULL,
    collectible_id TEXT NOT NULL,
    obtained_at    TEXT NOT NULL,
    obtained_from  TEXT NOT NULL CHECK (obtained_from IN ('purchase', 'box', 'free')),

    UNIQUE (user_id, collectible_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (collectible_id) REFERENCES collectibles(id)
);

CREATE INDEX IF NOT EXISTS idx_user_collectibles_user ON user_collectibles(user_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO collectibles (id, name, emoji, kind, rarity, gem_cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for item in default_catalog() {
        stmt.execute(params![
            item.id,
            item.name,
            item.emoji,
            item.kind.as_str(),
            item.rarity.as_str(),
            item.gem_cost as i64,
        ])?;
    }
    Ok(())
}
