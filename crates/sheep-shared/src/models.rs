//! Domain model structs.
//!
//! These mirror the persisted rows one-to-one and derive `Serialize` /
//! `Deserialize` so they can be stored as JSON in the local fallback store
//! and handed to whatever renders them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::themes::DEFAULT_THEME_ID;
use crate::types::{CollectibleKind, ObtainedFrom, Rarity, UserId};

/// Sheep shown on the button before any collectible is selected.
pub const DEFAULT_SHEEP_EMOJI: &str = "🐑";

/// Particle emitted on click before any collectible is selected.
pub const DEFAULT_PARTICLE: &str = "✨";

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    pub total_clicks: u64,
    /// Tier shown next to the nickname. Never above the earned tier.
    pub tier: u8,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh anonymous player named `Sheep<suffix>`.
    pub fn anonymous(id: UserId, suffix: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            nickname: format!("Sheep{suffix}"),
            total_clicks: 0,
            tier: 0,
            created_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCurrency {
    pub user_id: UserId,
    pub wool_coins: u64,
    pub sheep_gems: u64,
    pub last_daily_claim: Option<DateTime<Utc>>,
    pub last_gem_claim: Option<DateTime<Utc>>,
    pub last_box_claim: Option<DateTime<Utc>>,
    pub consecutive_days: u32,
    pub selected_theme: String,
    /// Insertion-ordered; only ever grows.
    pub unlocked_themes: Vec<String>,
    pub selected_sheep_emoji: String,
    pub selected_particle: String,
    pub updated_at: DateTime<Utc>,
}

impl UserCurrency {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            wool_coins: 0,
            sheep_gems: 0,
            last_daily_claim: None,
            last_gem_claim: None,
            last_box_claim: None,
            consecutive_days: 0,
            selected_theme: DEFAULT_THEME_ID.to_string(),
            unlocked_themes: vec![DEFAULT_THEME_ID.to_string()],
            selected_sheep_emoji: DEFAULT_SHEEP_EMOJI.to_string(),
            selected_particle: DEFAULT_PARTICLE.to_string(),
            updated_at: now,
        }
    }

    pub fn has_theme(&self, theme_id: &str) -> bool {
        self.unlocked_themes.iter().any(|t| t == theme_id)
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    pub user_id: UserId,
    pub messages_sent: u64,
    pub highest_daily_clicks: u64,
    pub longest_coin_streak: u32,
    /// Always equal to `daily_click_history.len()`.
    pub total_days_active: u32,
    pub first_click_date: Option<NaiveDate>,
    pub last_active_date: Option<NaiveDate>,
    pub daily_click_history: BTreeMap<NaiveDate, u64>,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            messages_sent: 0,
            highest_daily_clicks: 0,
            longest_coin_streak: 0,
            total_days_active: 0,
            first_click_date: None,
            last_active_date: None,
            daily_click_history: BTreeMap::new(),
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Global counter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalStats {
    pub total_sheep: u64,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A global chat message. Nickname and tier are snapshots taken when the
/// message was posted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: uuid::Uuid,
    pub user_id: UserId,
    pub nickname: String,
    pub message: String,
    pub tier: u8,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Collectibles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collectible {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub kind: CollectibleKind,
    pub rarity: Rarity,
    pub gem_cost: u64,
}

/// Ownership record, unique per (user, collectible).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCollectible {
    pub user_id: UserId,
    pub collectible_id: String,
    pub obtained_at: DateTime<Utc>,
    pub obtained_from: ObtainedFrom,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub id: UserId,
    pub nickname: String,
    pub total_clicks: u64,
    pub tier: u8,
    /// 1-based position.
    pub rank: u32,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Everything the progression engine reads and writes for one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user: User,
    pub currency: UserCurrency,
    pub stats: UserStats,
    /// Ids of owned collectibles.
    pub owned: BTreeSet<String>,
}

impl Profile {
    /// Brand-new profile for a just-provisioned user.
    pub fn new(user: User, now: DateTime<Utc>) -> Self {
        let id = user.id;
        Self {
            user,
            currency: UserCurrency::new(id, now),
            stats: UserStats::new(id, now),
            owned: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn owns(&self, collectible_id: &str) -> bool {
        self.owned.contains(collectible_id)
    }
}
