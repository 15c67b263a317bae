/// Application name
pub const APP_NAME: &str = "Global Sheep Clicker";

/// Clicks between wool-coin awards
pub const COIN_AWARD_INTERVAL: u64 = 100;

/// Lowest tier that earns wool coins from clicking
pub const COIN_AWARD_MIN_TIER: u8 = 1;

/// Clicks between sheep-gem awards
pub const GEM_AWARD_INTERVAL: u64 = 500;

/// Lowest tier that earns sheep gems from clicking
pub const GEM_AWARD_MIN_TIER: u8 = 5;

/// Daily reward: fixed base amount of wool coins
pub const DAILY_REWARD_BASE: u64 = 5;

/// Daily reward: bonus coins per streak day
pub const DAILY_REWARD_PER_STREAK_DAY: u64 = 2;

/// Daily reward: streak bonus cap
pub const DAILY_REWARD_BONUS_CAP: u64 = 10;

/// Gems granted by the daily gem claim
pub const DAILY_GEM_AMOUNT: u64 = 1;

/// Sheep-gem price of a premium embroidered box
pub const PREMIUM_BOX_COST_GEMS: u64 = 40;

/// Maximum chat message length in characters
pub const MAX_CHAT_MESSAGE_LEN: usize = 200;

/// Maximum nickname length in characters
pub const MAX_NICKNAME_LEN: usize = 24;

/// Number of chat messages kept in the live window
pub const CHAT_WINDOW: usize = 50;

/// Number of players shown on the leaderboard
pub const LEADERBOARD_SIZE: usize = 3;

/// Debounce delay before a click batch is written (milliseconds)
pub const CLICK_FLUSH_DELAY_MS: u64 = 300;

/// Prefix of every key in the local fallback store
pub const OFFLINE_KEY_PREFIX: &str = "offline_";

/// Local key remembering the provisioned user id across sessions
pub const USER_ID_KEY: &str = "sheep_user_id";

/// Primary key of the singleton global stats row
pub const GLOBAL_STATS_ID: &str = "global";
