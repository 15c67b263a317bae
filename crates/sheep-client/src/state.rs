//! In-memory mirror of everything the session shows.
//!
//! [`MirrorState`] is shared as `Arc<Mutex<MirrorState>>` between the session
//! and the realtime listener. The lock is only taken for synchronous sections
//! and never held across an `.await`.

use std::collections::VecDeque;

use serde::Serialize;
use sheep_shared::{ChatMessage, Collectible, GlobalStats, Profile};

use crate::gateway::StorageMode;

pub struct MirrorState {
    /// The local player. Mutated optimistically before anything is persisted.
    pub profile: Profile,

    /// Last known all-players counter.
    pub global: GlobalStats,

    /// Newest first, never longer than `chat_window`.
    pub chat: VecDeque<ChatMessage>,

    /// Collectible catalog, fetched once at start-up.
    pub catalog: Vec<Collectible>,

    pub mode: StorageMode,

    pub chat_window: usize,
}

impl MirrorState {
    pub fn new(
        profile: Profile,
        global: GlobalStats,
        recent_chat: Vec<ChatMessage>,
        catalog: Vec<Collectible>,
        mode: StorageMode,
        chat_window: usize,
    ) -> Self {
        let mut chat: VecDeque<ChatMessage> = recent_chat.into();
        chat.truncate(chat_window);
        Self {
            profile,
            global,
            chat,
            catalog,
            mode,
            chat_window,
        }
    }

    /// Prepend a message and trim the window. Returns `false` for a message
    /// already in the window.
    pub fn push_chat(&mut self, message: ChatMessage) -> bool {
        if self.chat.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.chat.push_front(message);
        self.chat.truncate(self.chat_window);
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            profile: self.profile.clone(),
            global_total: self.global.total_sheep,
            chat: self.chat.iter().cloned().collect(),
            mode: self.mode,
        }
    }
}

/// Read-only copy of the mirror handed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub profile: Profile,
    pub global_total: u64,
    pub chat: Vec<ChatMessage>,
    pub mode: StorageMode,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sheep_shared::{User, UserId};

    use super::*;

    fn message(n: usize) -> ChatMessage {
        ChatMessage {
            id: uuid::Uuid::new_v4(),
            user_id: UserId::new(),
            nickname: format!("Sheep{n}"),
            message: format!("baa #{n}"),
            tier: 0,
            created_at: Utc::now(),
        }
    }

    fn state(window: usize) -> MirrorState {
        let now = Utc::now();
        MirrorState::new(
            Profile::new(User::anonymous(UserId::new(), 1, now), now),
            GlobalStats { total_sheep: 0, updated_at: now },
            Vec::new(),
            Vec::new(),
            StorageMode::Fallback,
            window,
        )
    }

    #[test]
    fn chat_window_keeps_newest() {
        let mut state = state(50);
        for n in 0..60 {
            assert!(state.push_chat(message(n)));
        }
        assert_eq!(state.chat.len(), 50);
        assert_eq!(state.chat.front().unwrap().message, "baa #59");
        assert_eq!(state.chat.back().unwrap().message, "baa #10");
    }

    #[test]
    fn duplicate_messages_are_dropped() {
        let mut state = state(5);
        let msg = message(1);
        assert!(state.push_chat(msg.clone()));
        assert!(!state.push_chat(msg));
        assert_eq!(state.chat.len(), 1);
    }
}
