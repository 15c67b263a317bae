//! Realtime listener: folds the backend change feed into the mirror.

use std::sync::{Arc, Mutex};

use sheep_shared::protocol::ChangeEvent;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::events::SessionEvent;
use crate::state::MirrorState;

/// Apply one change to the mirror and return the event to surface, if any.
///
/// The global counter is replaced, never summed, so a replayed or late event
/// cannot inflate it.
pub fn apply_change(state: &mut MirrorState, change: ChangeEvent) -> Option<SessionEvent> {
    match change {
        ChangeEvent::GlobalStatsUpdated(stats) => {
            let total = stats.total_sheep;
            state.global = stats;
            Some(SessionEvent::GlobalTotalChanged { total })
        }
        ChangeEvent::ChatInserted(message) => {
            let accepted = state.push_chat(message.clone());
            accepted.then_some(SessionEvent::ChatReceived(message))
        }
        ChangeEvent::UserUpdated(_) => Some(SessionEvent::LeaderboardChanged),
    }
}

/// Spawn the task consuming `changes` until the feed closes.
pub fn spawn_listener(
    mut changes: broadcast::Receiver<ChangeEvent>,
    state: Arc<Mutex<MirrorState>>,
    events: broadcast::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let change = match changes.recv().await {
                Ok(change) => change,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "realtime listener lagged, some changes were dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let kind = change.kind();
            let event = match state.lock() {
                Ok(mut state) => apply_change(&mut state, change),
                Err(e) => {
                    tracing::error!(error = %e, "mirror lock poisoned, stopping realtime listener");
                    break;
                }
            };
            tracing::trace!(kind, "applied change");

            if let Some(event) = event {
                let _ = events.send(event);
            }
        }
        tracing::debug!("realtime listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sheep_shared::{ChatMessage, GlobalStats, Profile, User, UserId};

    use super::*;
    use crate::gateway::StorageMode;

    fn mirror() -> MirrorState {
        let now = Utc::now();
        MirrorState::new(
            Profile::new(User::anonymous(UserId::new(), 5, now), now),
            GlobalStats { total_sheep: 100, updated_at: now },
            Vec::new(),
            Vec::new(),
            StorageMode::Remote,
            50,
        )
    }

    fn chat(text: &str) -> ChatMessage {
        ChatMessage {
            id: uuid::Uuid::new_v4(),
            user_id: UserId::new(),
            nickname: "Sheep9".into(),
            message: text.into(),
            tier: 2,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn global_total_is_replaced() {
        let mut state = mirror();
        let stats = GlobalStats { total_sheep: 90, updated_at: Utc::now() };
        let event = apply_change(&mut state, ChangeEvent::GlobalStatsUpdated(stats));
        assert_eq!(event, Some(SessionEvent::GlobalTotalChanged { total: 90 }));
        assert_eq!(state.global.total_sheep, 90);
    }

    #[test]
    fn chat_is_prepended_once() {
        let mut state = mirror();
        let first = chat("hello");
        let second = chat("baa");

        assert!(apply_change(&mut state, ChangeEvent::ChatInserted(first.clone())).is_some());
        assert!(apply_change(&mut state, ChangeEvent::ChatInserted(second.clone())).is_some());
        assert!(apply_change(&mut state, ChangeEvent::ChatInserted(first)).is_none());

        assert_eq!(state.chat.len(), 2);
        assert_eq!(state.chat[0], second);
    }

    #[test]
    fn user_updates_refresh_leaderboard() {
        let mut state = mirror();
        let user = User::anonymous(UserId::new(), 1, Utc::now());
        assert_eq!(
            apply_change(&mut state, ChangeEvent::UserUpdated(user)),
            Some(SessionEvent::LeaderboardChanged)
        );
    }

    #[tokio::test]
    async fn listener_forwards_until_closed() {
        let (changes_tx, changes_rx) = broadcast::channel(8);
        let (events_tx, mut events_rx) = broadcast::channel(8);
        let state = Arc::new(Mutex::new(mirror()));
        let task = spawn_listener(changes_rx, state.clone(), events_tx);

        changes_tx.send(ChangeEvent::ChatInserted(chat("hi"))).unwrap();
        match events_rx.recv().await.unwrap() {
            SessionEvent::ChatReceived(msg) => assert_eq!(msg.message, "hi"),
            other => panic!("unexpected event {other:?}"),
        }

        drop(changes_tx);
        task.await.unwrap();
        assert_eq!(state.lock().unwrap().chat.len(), 1);
    }
}
