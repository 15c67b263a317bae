//! v001 -- Initial schema creation.
//!
//! Creates the player tables (`users`, `user_currency`, `user_stats`), the
//! singleton `global_stats` row and `chat_messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    nickname     TEXT NOT NULL,
    total_clicks INTEGER NOT NULL DEFAULT 0,
    tier         INTEGER NOT NULL DEFAULT 0,  -- displayed tier
    created_at   TEXT NOT NULL                -- RFC-3339
);

CREATE INDEX IF NOT EXISTS idx_users_total_clicks ON users(total_clicks DESC);

-- ----------------------------------------------------------------
-- Currency (one row per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_currency (
    user_id              TEXT PRIMARY KEY NOT NULL,
    wool_coins           INTEGER NOT NULL DEFAULT 0 CHECK (wool_coins >= 0),
    sheep_gems           INTEGER NOT NULL DEFAULT 0 CHECK (sheep_gems >= 0),
    last_daily_claim     TEXT,
    last_gem_claim       TEXT,
    last_box_claim       TEXT,
    consecutive_days     INTEGER NOT NULL DEFAULT 0,
    selected_theme       TEXT NOT NULL,
    unlocked_themes      TEXT NOT NULL,       -- JSON array
    selected_sheep_emoji TEXT NOT NULL,
    selected_particle    TEXT NOT NULL,
    updated_at           TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Stats (one row per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS user_stats (
    user_id              TEXT PRIMARY KEY NOT NULL,
    messages_sent        INTEGER NOT NULL DEFAULT 0,
    highest_daily_clicks INTEGER NOT NULL DEFAULT 0,
    longest_coin_streak  INTEGER NOT NULL DEFAULT 0,
    total_days_active    INTEGER NOT NULL DEFAULT 0,
    first_click_date     TEXT,                -- YYYY-MM-DD
    last_active_date     TEXT,                -- YYYY-MM-DD
    daily_click_history  TEXT NOT NULL,       -- JSON object date -> count
    updated_at           TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Global counter (singleton)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS global_stats (
    id          TEXT PRIMARY KEY NOT NULL,
    total_sheep INTEGER NOT NULL DEFAULT 0,
    updated_at  TEXT NOT NULL
);

INSERT OR IGNORE INTO global_stats (id, total_sheep, updated_at)
VALUES ('global', 0, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'));

-- ----------------------------------------------------------------
-- Chat
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chat_messages (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id    TEXT NOT NULL,
    nickname   TEXT NOT NULL,                 -- snapshot at posting time
    message    TEXT NOT NULL CHECK (length(message) BETWEEN 1 AND 200),
    tier       INTEGER NOT NULL DEFAULT 0,    -- snapshot at posting time
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chat_created_at ON chat_messages(created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
