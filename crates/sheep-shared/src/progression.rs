//! Progression engine.
//!
//! Every player action is a pure transition on a [`Profile`]. Each function
//! validates first and mutates only once the action is known to succeed, so
//! an `Err` always leaves the profile exactly as it was.
//!
//! Calendar days are UTC dates taken from the `now` argument.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::constants::*;
use crate::error::ActionError;
use crate::models::{Collectible, Profile, UserCollectible};
use crate::rewards::{table_for, Prize, RandomSource};
use crate::themes::{find_theme, Theme, THEMES};
use crate::tiers::{calculate_tier, next_tier, tier_info, TIERS};
use crate::types::{BoxKind, CollectibleKind, ObtainedFrom, Rarity};

fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

fn claimed_on(stamp: Option<DateTime<Utc>>, today: NaiveDate) -> bool {
    stamp.map(day_of) == Some(today)
}

// ---------------------------------------------------------------------------
// Clicks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickOutcome {
    pub total_clicks: u64,
    /// Tier earned by `total_clicks`, regardless of any pinned display tier.
    pub earned_tier: u8,
    /// Set when this click unlocked a new tier.
    pub tier_up: Option<u8>,
    pub coins_awarded: u64,
    pub gems_awarded: u64,
    /// Clicks recorded for today, this one included.
    pub clicks_today: u64,
}

/// Register one click.
pub fn apply_click(profile: &mut Profile, now: DateTime<Utc>) -> ClickOutcome {
    let today = day_of(now);
    let previous_tier = calculate_tier(profile.user.total_clicks);

    let total = profile.user.total_clicks.saturating_add(1);
    let earned = calculate_tier(total);
    profile.user.total_clicks = total;

    let tier_up = (earned > previous_tier).then_some(earned);
    if tier_up.is_some() {
        // A pinned display tier only lasts until the next unlock.
        profile.user.tier = earned;
    }

    let coins = if earned >= COIN_AWARD_MIN_TIER && total % COIN_AWARD_INTERVAL == 0 {
        u64::from((earned / 2).max(1))
    } else {
        0
    };
    let gems = if earned >= GEM_AWARD_MIN_TIER && total % GEM_AWARD_INTERVAL == 0 {
        1
    } else {
        0
    };
    if coins > 0 || gems > 0 {
        profile.currency.wool_coins += coins;
        profile.currency.sheep_gems += gems;
        profile.currency.updated_at = now;
    }

    let stats = &mut profile.stats;
    let day_count = stats.daily_click_history.entry(today).or_insert(0);
    *day_count += 1;
    let clicks_today = *day_count;
    stats.highest_daily_clicks = stats.highest_daily_clicks.max(clicks_today);
    stats.total_days_active = stats.daily_click_history.len() as u32;
    stats.first_click_date.get_or_insert(today);
    stats.last_active_date = Some(today);
    stats.updated_at = now;

    ClickOutcome {
        total_clicks: total,
        earned_tier: earned,
        tier_up,
        coins_awarded: coins,
        gems_awarded: gems,
        clicks_today,
    }
}

// ---------------------------------------------------------------------------
// Daily claims
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyReward {
    pub coins_earned: u64,
    pub new_streak: u32,
    pub new_total: u64,
}

/// Coins for `streak` consecutive days: base plus a capped streak bonus.
pub fn daily_reward_amount(streak: u32) -> u64 {
    let bonus = (u64::from(streak) * DAILY_REWARD_PER_STREAK_DAY).min(DAILY_REWARD_BONUS_CAP);
    DAILY_REWARD_BASE + bonus
}

pub fn claim_daily_reward(profile: &mut Profile, now: DateTime<Utc>) -> Result<DailyReward, ActionError> {
    let today = day_of(now);
    let currency = &mut profile.currency;
    let last = currency.last_daily_claim.map(day_of);
    if last == Some(today) {
        return Err(ActionError::AlreadyClaimedToday);
    }

    let streak = match (last, today.pred_opt()) {
        (Some(last), Some(yesterday)) if last == yesterday => currency.consecutive_days.saturating_add(1),
        _ => 1,
    };
    let coins = daily_reward_amount(streak);

    currency.wool_coins += coins;
    currency.consecutive_days = streak;
    currency.last_daily_claim = Some(now);
    currency.updated_at = now;
    profile.stats.longest_coin_streak = profile.stats.longest_coin_streak.max(streak);
    profile.stats.updated_at = now;

    Ok(DailyReward {
        coins_earned: coins,
        new_streak: streak,
        new_total: currency.wool_coins,
    })
}

/// Grant the daily gem. Returns the new gem balance.
pub fn claim_daily_gems(profile: &mut Profile, now: DateTime<Utc>) -> Result<u64, ActionError> {
    let currency = &mut profile.currency;
    if claimed_on(currency.last_gem_claim, day_of(now)) {
        return Err(ActionError::AlreadyClaimedToday);
    }
    currency.sheep_gems += DAILY_GEM_AMOUNT;
    currency.last_gem_claim = Some(now);
    currency.updated_at = now;
    Ok(currency.sheep_gems)
}

// ---------------------------------------------------------------------------
// Boxes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoxReward {
    Coins { amount: u64 },
    Gems { amount: u64 },
    /// `duplicate` rolls were already owned and granted nothing.
    Collectible { collectible: Collectible, duplicate: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxOpening {
    pub kind: BoxKind,
    pub rewards: Vec<BoxReward>,
    /// Ownership records created by this opening, to be persisted.
    pub granted: Vec<UserCollectible>,
}

pub fn open_box<R: RandomSource + ?Sized>(
    profile: &mut Profile,
    kind: BoxKind,
    catalog: &[Collectible],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<BoxOpening, ActionError> {
    let table = table_for(kind);
    match kind {
        BoxKind::Daily => {
            if claimed_on(profile.currency.last_box_claim, day_of(now)) {
                return Err(ActionError::AlreadyClaimedToday);
            }
            profile.currency.last_box_claim = Some(now);
        }
        BoxKind::Premium => {
            let available = profile.currency.sheep_gems;
            if available < table.gem_cost {
                return Err(ActionError::InsufficientGems { needed: table.gem_cost, available });
            }
            profile.currency.sheep_gems -= table.gem_cost;
        }
    }

    let user_id = profile.id();
    let mut rewards = Vec::with_capacity(table.rolls as usize);
    let mut granted = Vec::new();
    for prize in table.open(catalog, rng) {
        let reward = match prize {
            Prize::Coins(amount) => {
                profile.currency.wool_coins += amount;
                BoxReward::Coins { amount }
            }
            Prize::Gems(amount) => {
                profile.currency.sheep_gems += amount;
                BoxReward::Gems { amount }
            }
            Prize::Collectible(collectible) => {
                let duplicate = !profile.owned.insert(collectible.id.clone());
                if !duplicate {
                    granted.push(UserCollectible {
                        user_id,
                        collectible_id: collectible.id.clone(),
                        obtained_at: now,
                        obtained_from: ObtainedFrom::Box,
                    });
                }
                BoxReward::Collectible { collectible, duplicate }
            }
        };
        rewards.push(reward);
    }
    profile.currency.updated_at = now;

    Ok(BoxOpening { kind, rewards, granted })
}

// ---------------------------------------------------------------------------
// Collectibles
// ---------------------------------------------------------------------------

pub fn purchase_collectible(
    profile: &mut Profile,
    collectible: &Collectible,
    now: DateTime<Utc>,
) -> Result<UserCollectible, ActionError> {
    if profile.owns(&collectible.id) {
        return Err(ActionError::AlreadyOwned(collectible.id.clone()));
    }
    if collectible.rarity.is_box_only() {
        return Err(ActionError::BoxOnly(collectible.id.clone()));
    }
    let cost = collectible.gem_cost;
    let available = profile.currency.sheep_gems;
    if cost > available {
        return Err(ActionError::InsufficientGems { needed: cost, available });
    }

    let obtained_from = if cost == 0 {
        ObtainedFrom::Free
    } else {
        profile.currency.sheep_gems -= cost;
        profile.currency.updated_at = now;
        ObtainedFrom::Purchase
    };
    profile.owned.insert(collectible.id.clone());

    Ok(UserCollectible {
        user_id: profile.id(),
        collectible_id: collectible.id.clone(),
        obtained_at: now,
        obtained_from,
    })
}

/// Equip a collectible. Free items can be equipped without owning them.
pub fn select_collectible(
    profile: &mut Profile,
    collectible: &Collectible,
    now: DateTime<Utc>,
) -> Result<(), ActionError> {
    if collectible.rarity != Rarity::Free && !profile.owns(&collectible.id) {
        return Err(ActionError::NotOwned(collectible.id.clone()));
    }
    let currency = &mut profile.currency;
    match collectible.kind {
        CollectibleKind::SheepEmoji => currency.selected_sheep_emoji = collectible.emoji.clone(),
        CollectibleKind::Particle => currency.selected_particle = collectible.emoji.clone(),
    }
    currency.updated_at = now;
    Ok(())
}

// ---------------------------------------------------------------------------
// Themes
// ---------------------------------------------------------------------------

/// Buy a theme with wool coins and switch to it.
pub fn purchase_theme(
    profile: &mut Profile,
    theme_id: &str,
    now: DateTime<Utc>,
) -> Result<&'static Theme, ActionError> {
    let theme = find_theme(theme_id).ok_or_else(|| ActionError::UnknownTheme(theme_id.to_string()))?;
    let currency = &mut profile.currency;
    if currency.has_theme(theme.id) {
        return Err(ActionError::AlreadyUnlocked(theme.id.to_string()));
    }
    if currency.wool_coins < theme.cost {
        return Err(ActionError::InsufficientCoins {
            needed: theme.cost,
            available: currency.wool_coins,
        });
    }

    currency.wool_coins -= theme.cost;
    currency.unlocked_themes.push(theme.id.to_string());
    currency.selected_theme = theme.id.to_string();
    currency.updated_at = now;
    Ok(theme)
}

pub fn select_theme(profile: &mut Profile, theme_id: &str, now: DateTime<Utc>) -> Result<(), ActionError> {
    let theme = find_theme(theme_id).ok_or_else(|| ActionError::UnknownTheme(theme_id.to_string()))?;
    let currency = &mut profile.currency;
    if !currency.has_theme(theme.id) {
        return Err(ActionError::NotOwned(theme.id.to_string()));
    }
    currency.selected_theme = theme.id.to_string();
    currency.updated_at = now;
    Ok(())
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Pin the displayed tier to any tier already earned.
pub fn set_display_tier(profile: &mut Profile, level: u8) -> Result<(), ActionError> {
    if tier_info(level).is_none() || level > calculate_tier(profile.user.total_clicks) {
        return Err(ActionError::TierLocked(level));
    }
    profile.user.tier = level;
    Ok(())
}

pub fn rename(profile: &mut Profile, nickname: &str) -> Result<(), ActionError> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        return Err(ActionError::InvalidNickname("nickname is empty".into()));
    }
    if trimmed.chars().count() > MAX_NICKNAME_LEN {
        return Err(ActionError::InvalidNickname(format!(
            "nickname is longer than {MAX_NICKNAME_LEN} characters"
        )));
    }
    profile.user.nickname = trimmed.to_string();
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Trim a chat message and check its length.
pub fn validate_message(text: &str) -> Result<String, ActionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ActionError::InvalidMessage("message is empty".into()));
    }
    if trimmed.chars().count() > MAX_CHAT_MESSAGE_LEN {
        return Err(ActionError::InvalidMessage(format!(
            "message is longer than {MAX_CHAT_MESSAGE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn record_message_sent(profile: &mut Profile, now: DateTime<Utc>) {
    profile.stats.messages_sent += 1;
    profile.stats.updated_at = now;
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_clicks: u64,
    /// Share of all clicks ever made, in percent.
    pub global_share_percent: f64,
    pub average_daily_clicks: f64,
    pub highest_daily_clicks: u64,
    pub total_days_active: u32,
    pub messages_sent: u64,
    pub current_streak: u32,
    pub longest_coin_streak: u32,
    pub themes_unlocked: usize,
    pub themes_total: usize,
    pub theme_completion_percent: f64,
    pub collectibles_owned: usize,
    pub earned_tier: u8,
    pub next_tier_name: Option<&'static str>,
    pub clicks_to_next_tier: Option<u64>,
    /// Progress through the current tier band, 0 to 100.
    pub tier_progress_percent: f64,
}

pub fn summarize(profile: &Profile, global_total: u64) -> StatsSummary {
    let clicks = profile.user.total_clicks;
    let stats = &profile.stats;
    let currency = &profile.currency;

    let percent = |part: f64, whole: f64| if whole > 0.0 { part / whole * 100.0 } else { 0.0 };

    let earned = calculate_tier(clicks);
    let next = next_tier(clicks);
    let tier_progress_percent = match next {
        Some((next, _)) => {
            let floor = TIERS[earned as usize].requirement;
            percent((clicks - floor) as f64, (next.requirement - floor) as f64)
        }
        None => 100.0,
    };

    StatsSummary {
        total_clicks: clicks,
        global_share_percent: percent(clicks as f64, global_total as f64),
        average_daily_clicks: if stats.total_days_active > 0 {
            clicks as f64 / f64::from(stats.total_days_active)
        } else {
            0.0
        },
        highest_daily_clicks: stats.highest_daily_clicks,
        total_days_active: stats.total_days_active,
        messages_sent: stats.messages_sent,
        current_streak: currency.consecutive_days,
        longest_coin_streak: stats.longest_coin_streak.max(currency.consecutive_days),
        themes_unlocked: currency.unlocked_themes.len(),
        themes_total: THEMES.len(),
        theme_completion_percent: percent(currency.unlocked_themes.len() as f64, THEMES.len() as f64),
        collectibles_owned: profile.owned.len(),
        earned_tier: earned,
        next_tier_name: next.map(|(t, _)| t.name),
        clicks_to_next_tier: next.map(|(_, remaining)| remaining),
        tier_progress_percent,
    }
}
