//! Named ranks unlocked by cumulative clicks.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TierInfo {
    pub level: u8,
    pub name: &'static str,
    pub icon: &'static str,
    /// Cumulative clicks needed to unlock this tier.
    pub requirement: u64,
    pub color: &'static str,
}

/// Ordered by ascending requirement. Level 0 is always unlocked.
pub const TIERS: [TierInfo; 10] = [
    TierInfo { level: 0, name: "Lamb", icon: "🐑", requirement: 0, color: "#9CA3AF" },
    TierInfo { level: 1, name: "Shepherd", icon: "👨‍🌾", requirement: 100, color: "#10B981" },
    TierInfo { level: 2, name: "Flock Master", icon: "🌟", requirement: 500, color: "#3B82F6" },
    TierInfo { level: 3, name: "Wool Baron", icon: "👑", requirement: 1_000, color: "#8B5CF6" },
    TierInfo { level: 4, name: "Sheep Lord", icon: "⚡", requirement: 2_500, color: "#F59E0B" },
    TierInfo { level: 5, name: "Legendary Herder", icon: "🔥", requirement: 5_000, color: "#EF4444" },
    TierInfo { level: 6, name: "Wool Deity", icon: "✨", requirement: 10_000, color: "#EC4899" },
    TierInfo { level: 7, name: "Celestial Shepherd", icon: "🌙", requirement: 25_000, color: "#A855F7" },
    TierInfo { level: 8, name: "Eternal Flockkeeper", icon: "🤍", requirement: 50_000, color: "#FFFFFF" },
    TierInfo { level: 9, name: "Sheep God", icon: "🌈", requirement: 100_000, color: "rainbow" },
];

/// Highest tier level whose requirement is met by `total_clicks`.
pub fn calculate_tier(total_clicks: u64) -> u8 {
    TIERS
        .iter()
        .rev()
        .find(|t| total_clicks >= t.requirement)
        .map(|t| t.level)
        .unwrap_or(0)
}

pub fn tier_info(level: u8) -> Option<&'static TierInfo> {
    TIERS.get(level as usize)
}

/// Next tier to unlock and how many clicks are still missing.
/// `None` once the top tier is reached.
pub fn next_tier(total_clicks: u64) -> Option<(&'static TierInfo, u64)> {
    let current = calculate_tier(total_clicks);
    tier_info(current + 1).map(|t| (t, t.requirement - total_clicks))
}
