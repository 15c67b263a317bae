use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, GlobalStats, User};

/// Row changes pushed by the backend change feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// The global counter row was written
    GlobalStatsUpdated(GlobalStats),

    /// A chat message was inserted
    ChatInserted(ChatMessage),

    /// A user row was written (clicks, tier or nickname changed)
    UserUpdated(User),
}

impl ChangeEvent {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GlobalStatsUpdated(_) => "global_stats",
            Self::ChatInserted(_) => "chat_messages",
            Self::UserUpdated(_) => "users",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn serializes_with_table_tag() {
        let event = ChangeEvent::GlobalStatsUpdated(GlobalStats { total_sheep: 7, updated_at: Utc::now() });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["table"], "global_stats_updated");
        assert_eq!(json["row"]["total_sheep"], 7);

        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind(), "global_stats");
    }
}
