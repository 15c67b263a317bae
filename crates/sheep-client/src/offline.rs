//! Field-per-slot mirror of a profile in the [`LocalStore`].
//!
//! Every persisted field lives under its own `offline_`-prefixed key.
//! Scalars are stored as text, collections as JSON. Unreadable slots fall
//! back to the field's default so a corrupted entry never blocks start-up.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sheep_shared::constants::OFFLINE_KEY_PREFIX;
use sheep_shared::tiers::calculate_tier;
use sheep_shared::{Profile, User, UserCurrency, UserId, UserStats};

use crate::storage::LocalStore;

mod slot {
    pub const NICKNAME: &str = "nickname";
    pub const TOTAL_CLICKS: &str = "total_clicks";
    pub const TIER: &str = "tier";
    pub const CREATED_AT: &str = "created_at";

    pub const WOOL_COINS: &str = "wool_coins";
    pub const SHEEP_GEMS: &str = "sheep_gems";
    pub const LAST_DAILY_CLAIM: &str = "last_daily_claim";
    pub const LAST_GEM_CLAIM: &str = "last_gem_claim";
    pub const LAST_BOX_CLAIM: &str = "last_daily_box_claim";
    pub const CONSECUTIVE_DAYS: &str = "consecutive_days";
    pub const SELECTED_THEME: &str = "selected_theme";
    pub const UNLOCKED_THEMES: &str = "unlocked_themes";
    pub const SELECTED_SHEEP_EMOJI: &str = "selected_sheep_emoji";
    pub const SELECTED_PARTICLE: &str = "selected_particle";

    pub const MESSAGES_SENT: &str = "messages_sent";
    pub const HIGHEST_DAILY_CLICKS: &str = "highest_daily_clicks";
    pub const LONGEST_COIN_STREAK: &str = "longest_coin_streak";
    pub const TOTAL_DAYS_ACTIVE: &str = "total_days_active";
    pub const FIRST_CLICK_DATE: &str = "first_click_date";
    pub const LAST_ACTIVE_DATE: &str = "last_active_date";
    pub const DAILY_CLICK_HISTORY: &str = "daily_click_history";

    pub const OWNED_COLLECTIBLES: &str = "owned_collectibles";
    pub const TOTAL_SHEEP: &str = "total_sheep";
}

fn key(name: &str) -> String {
    format!("{OFFLINE_KEY_PREFIX}{name}")
}

#[derive(Clone)]
pub struct OfflineSlots {
    store: Arc<dyn LocalStore>,
}

impl OfflineSlots {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    // ------------------------------------------------------------------
    // Raw slot access
    // ------------------------------------------------------------------

    fn read_raw(&self, name: &str) -> Option<String> {
        match self.store.get(&key(name)) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(slot = name, error = %e, "offline read failed");
                None
            }
        }
    }

    fn write_raw(&self, name: &str, value: &str) {
        if let Err(e) = self.store.set(&key(name), value) {
            tracing::error!(slot = name, error = %e, "offline write failed");
        }
    }

    fn read<T: FromStr>(&self, name: &str) -> Option<T> {
        let raw = self.read_raw(name)?;
        let parsed = raw.parse().ok();
        if parsed.is_none() {
            tracing::warn!(slot = name, value = %raw, "unreadable offline slot ignored");
        }
        parsed
    }

    fn write<T: ToString>(&self, name: &str, value: T) {
        self.write_raw(name, &value.to_string());
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.read_raw(name)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(slot = name, error = %e, "unreadable offline slot ignored");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write_raw(name, &json),
            Err(e) => tracing::error!(slot = name, error = %e, "offline encode failed"),
        }
    }

    fn read_ts(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.read_raw(name)?;
        DateTime::parse_from_rfc3339(&raw).ok().map(|t| t.with_timezone(&Utc))
    }

    fn write_opt_ts(&self, name: &str, value: Option<DateTime<Utc>>) {
        match value {
            Some(ts) => self.write_raw(name, &ts.to_rfc3339()),
            None => self.clear(name),
        }
    }

    fn write_opt_date(&self, name: &str, value: Option<NaiveDate>) {
        match value {
            Some(date) => self.write(name, date),
            None => self.clear(name),
        }
    }

    fn clear(&self, name: &str) {
        if let Err(e) = self.store.remove(&key(name)) {
            tracing::error!(slot = name, error = %e, "offline clear failed");
        }
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// Rebuild a profile from the slots. A missing nickname means the player
    /// has never played offline; `fresh_nickname` names them and the new
    /// identity is written back immediately.
    pub fn load_profile(
        &self,
        id: UserId,
        now: DateTime<Utc>,
        fresh_nickname: impl FnOnce() -> String,
    ) -> Profile {
        let nickname = match self.read_raw(slot::NICKNAME) {
            Some(name) => name,
            None => {
                let name = fresh_nickname();
                self.write_raw(slot::NICKNAME, &name);
                self.write_raw(slot::CREATED_AT, &now.to_rfc3339());
                name
            }
        };

        let total_clicks: u64 = self.read(slot::TOTAL_CLICKS).unwrap_or(0);
        let user = User {
            id,
            nickname,
            total_clicks,
            // A pinned tier can never exceed what the clicks have unlocked.
            tier: self.read::<u8>(slot::TIER).unwrap_or(0).min(calculate_tier(total_clicks)),
            created_at: self.read_ts(slot::CREATED_AT).unwrap_or(now),
        };

        let defaults = UserCurrency::new(id, now);
        let currency = UserCurrency {
            user_id: id,
            wool_coins: self.read(slot::WOOL_COINS).unwrap_or(0),
            sheep_gems: self.read(slot::SHEEP_GEMS).unwrap_or(0),
            last_daily_claim: self.read_ts(slot::LAST_DAILY_CLAIM),
            last_gem_claim: self.read_ts(slot::LAST_GEM_CLAIM),
            last_box_claim: self.read_ts(slot::LAST_BOX_CLAIM),
            consecutive_days: self.read(slot::CONSECUTIVE_DAYS).unwrap_or(0),
            selected_theme: self.read_raw(slot::SELECTED_THEME).unwrap_or(defaults.selected_theme),
            unlocked_themes: self.read_json(slot::UNLOCKED_THEMES).unwrap_or(defaults.unlocked_themes),
            selected_sheep_emoji: self
                .read_raw(slot::SELECTED_SHEEP_EMOJI)
                .unwrap_or(defaults.selected_sheep_emoji),
            selected_particle: self.read_raw(slot::SELECTED_PARTICLE).unwrap_or(defaults.selected_particle),
            updated_at: now,
        };

        let history: BTreeMap<NaiveDate, u64> = self.read_json(slot::DAILY_CLICK_HISTORY).unwrap_or_default();
        let stats = UserStats {
            user_id: id,
            messages_sent: self.read(slot::MESSAGES_SENT).unwrap_or(0),
            highest_daily_clicks: self.read(slot::HIGHEST_DAILY_CLICKS).unwrap_or(0),
            longest_coin_streak: self.read(slot::LONGEST_COIN_STREAK).unwrap_or(0),
            total_days_active: history.len() as u32,
            first_click_date: self.read(slot::FIRST_CLICK_DATE),
            last_active_date: self.read(slot::LAST_ACTIVE_DATE),
            daily_click_history: history,
            updated_at: now,
        };

        Profile {
            user,
            currency,
            stats,
            owned: self.load_owned(),
        }
    }

    pub fn save_user(&self, user: &User) {
        self.write_raw(slot::NICKNAME, &user.nickname);
        self.write(slot::TOTAL_CLICKS, user.total_clicks);
        self.write(slot::TIER, user.tier);
        self.write_raw(slot::CREATED_AT, &user.created_at.to_rfc3339());
    }

    pub fn save_currency(&self, c: &UserCurrency) {
        self.write(slot::WOOL_COINS, c.wool_coins);
        self.write(slot::SHEEP_GEMS, c.sheep_gems);
        self.write_opt_ts(slot::LAST_DAILY_CLAIM, c.last_daily_claim);
        self.write_opt_ts(slot::LAST_GEM_CLAIM, c.last_gem_claim);
        self.write_opt_ts(slot::LAST_BOX_CLAIM, c.last_box_claim);
        self.write(slot::CONSECUTIVE_DAYS, c.consecutive_days);
        self.write_raw(slot::SELECTED_THEME, &c.selected_theme);
        self.write_json(slot::UNLOCKED_THEMES, &c.unlocked_themes);
        self.write_raw(slot::SELECTED_SHEEP_EMOJI, &c.selected_sheep_emoji);
        self.write_raw(slot::SELECTED_PARTICLE, &c.selected_particle);
    }

    pub fn save_stats(&self, s: &UserStats) {
        self.write(slot::MESSAGES_SENT, s.messages_sent);
        self.write(slot::HIGHEST_DAILY_CLICKS, s.highest_daily_clicks);
        self.write(slot::LONGEST_COIN_STREAK, s.longest_coin_streak);
        self.write(slot::TOTAL_DAYS_ACTIVE, s.total_days_active);
        self.write_opt_date(slot::FIRST_CLICK_DATE, s.first_click_date);
        self.write_opt_date(slot::LAST_ACTIVE_DATE, s.last_active_date);
        self.write_json(slot::DAILY_CLICK_HISTORY, &s.daily_click_history);
    }

    // ------------------------------------------------------------------
    // Collectibles and the global counter
    // ------------------------------------------------------------------

    pub fn load_owned(&self) -> BTreeSet<String> {
        self.read_json(slot::OWNED_COLLECTIBLES).unwrap_or_default()
    }

    /// Add one id to the owned set. Returns `false` if it was already there.
    pub fn add_owned(&self, collectible_id: &str) -> bool {
        let mut owned = self.load_owned();
        let inserted = owned.insert(collectible_id.to_string());
        if inserted {
            self.write_json(slot::OWNED_COLLECTIBLES, &owned);
        }
        inserted
    }

    pub fn total_sheep(&self) -> u64 {
        self.read(slot::TOTAL_SHEEP).unwrap_or(0)
    }

    /// Add `delta` to the locally kept global counter and return the result.
    pub fn add_total_sheep(&self, delta: u64) -> u64 {
        let total = self.total_sheep().saturating_add(delta);
        self.write(slot::TOTAL_SHEEP, total);
        total
    }
}
