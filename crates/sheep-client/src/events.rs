use serde::Serialize;
use sheep_shared::ChatMessage;

use crate::gateway::StorageMode;

/// Notifications for whatever presents the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A click unlocked a new tier.
    TierUp { tier: u8, name: &'static str },

    CoinsAwarded { amount: u64, balance: u64 },

    GemAwarded { amount: u64, balance: u64 },

    /// A chat message arrived, own messages included.
    ChatReceived(ChatMessage),

    GlobalTotalChanged { total: u64 },

    /// Some player's clicks, tier or nickname changed.
    LeaderboardChanged,

    /// Storage switched between remote and offline.
    ModeChanged { mode: StorageMode },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TierUp { .. } => "tier-up",
            Self::CoinsAwarded { .. } => "coins-awarded",
            Self::GemAwarded { .. } => "gem-awarded",
            Self::ChatReceived(_) => "chat-received",
            Self::GlobalTotalChanged { .. } => "global-total-changed",
            Self::LeaderboardChanged => "leaderboard-changed",
            Self::ModeChanged { .. } => "mode-changed",
        }
    }
}
