use thiserror::Error;

/// Reasons a player action is refused.
///
/// A refused action is a no-op: the profile it was applied to is left
/// exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Already claimed today")]
    AlreadyClaimedToday,

    #[error("Not enough wool coins: need {needed}, have {available}")]
    InsufficientCoins { needed: u64, available: u64 },

    #[error("Not enough sheep gems: need {needed}, have {available}")]
    InsufficientGems { needed: u64, available: u64 },

    #[error("Collectible already owned: {0}")]
    AlreadyOwned(String),

    #[error("Theme already unlocked: {0}")]
    AlreadyUnlocked(String),

    #[error("Collectible can only be won from boxes: {0}")]
    BoxOnly(String),

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Unknown collectible: {0}")]
    UnknownCollectible(String),

    #[error("Not owned: {0}")]
    NotOwned(String),

    #[error("Tier {0} is not unlocked")]
    TierLocked(u8),

    #[error("Invalid nickname: {0}")]
    InvalidNickname(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Chat is not available in offline mode")]
    ChatUnavailable,

    #[error("Action already in progress: {0}")]
    InFlight(&'static str),
}
