//! The game session: application state with a start → commands → shutdown
//! lifecycle.
//!
//! Every command applies the pure transition from `sheep_shared::progression`
//! to the mirror first, then persists through the gateway. Pending clicks are
//! flushed before a command writes its own rows so a click snapshot taken
//! earlier can never overwrite newer state. Persistence failures are logged by
//! the gateway and never rolled back.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sheep_shared::constants::LEADERBOARD_SIZE;
use sheep_shared::progression::{self, BoxOpening, ClickOutcome, DailyReward, StatsSummary};
use sheep_shared::themes::Theme;
use sheep_shared::tiers::tier_info;
use sheep_shared::{ActionError, BoxKind, ChatMessage, LeaderboardEntry};
use sheep_store::{LocalStorage, StoreError};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::backend::{Backend, BackendError, SqliteBackend};
use crate::batcher::{spawn_batcher, BatcherHandle, ClickSnapshot};
use crate::config::{BackendTarget, ClientConfig, LocalStorageLocation};
use crate::events::SessionEvent;
use crate::gateway::{PersistenceGateway, StorageMode};
use crate::realtime;
use crate::state::{MirrorState, SessionSnapshot};
use crate::storage::{LocalStore, SqliteLocalStore};

const EVENT_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything a session is built from.
pub struct SessionDeps {
    /// `None` forces offline mode.
    pub backend: Option<Arc<dyn Backend>>,
    pub local: Arc<dyn LocalStore>,
    pub clock: Arc<dyn Clock>,
    pub rng: StdRng,
    pub flush_delay: Duration,
    pub chat_window: usize,
}

/// Marks an action as running until dropped.
struct InFlight<'a> {
    running: &'a Mutex<HashSet<&'static str>>,
    action: &'static str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.action);
    }
}

pub struct GameSession {
    state: Arc<Mutex<MirrorState>>,
    gateway: Arc<PersistenceGateway>,
    batcher: BatcherHandle,
    listener: Option<JoinHandle<()>>,
    events: broadcast::Sender<SessionEvent>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    running: Mutex<HashSet<&'static str>>,
}

impl GameSession {
    /// Open the configured stores and start a session.
    pub async fn start(config: &ClientConfig) -> Result<Self, ClientError> {
        let backend: Option<Arc<dyn Backend>> = match config.backend_target() {
            Some(BackendTarget::SqliteFile(path)) => {
                tracing::info!(path = %path.display(), "opening backend");
                Some(Arc::new(SqliteBackend::open(&path)?))
            }
            Some(BackendTarget::SqliteMemory) => Some(Arc::new(SqliteBackend::in_memory()?)),
            None => None,
        };

        let local = match &config.local_storage {
            LocalStorageLocation::Default => LocalStorage::open_default()?,
            LocalStorageLocation::Path(path) => LocalStorage::open_at(path)?,
            LocalStorageLocation::Memory => LocalStorage::open_in_memory()?,
        };

        Ok(Self::start_with(SessionDeps {
            backend,
            local: Arc::new(SqliteLocalStore::new(local)),
            clock: Arc::new(SystemClock),
            rng: StdRng::from_entropy(),
            flush_delay: config.flush_delay,
            chat_window: config.chat_window,
        })
        .await)
    }

    /// Provision the player, load the mirror and spawn the background tasks.
    pub async fn start_with(deps: SessionDeps) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let gateway = Arc::new(PersistenceGateway::new(deps.backend, deps.local, events.clone()));
        let mut rng = deps.rng;
        let now = deps.clock.now();

        let profile = gateway.provision(now, &mut rng).await;
        // Subscribe before the initial loads; the mirror drops anything seen twice.
        let changes = gateway.subscribe();
        let global = gateway.global_stats(now).await;
        let chat = gateway.recent_chat(deps.chat_window).await;
        let catalog = gateway.catalog().await;
        let mode = gateway.mode();

        tracing::info!(
            user = %profile.id(),
            nickname = %profile.user.nickname,
            clicks = profile.user.total_clicks,
            ?mode,
            "session started"
        );

        let state = Arc::new(Mutex::new(MirrorState::new(
            profile,
            global,
            chat,
            catalog,
            mode,
            deps.chat_window,
        )));
        let listener = changes.map(|rx| realtime::spawn_listener(rx, state.clone(), events.clone()));
        let batcher = spawn_batcher(gateway.clone(), deps.flush_delay);

        Self {
            state,
            gateway,
            batcher,
            listener,
            events,
            clock: deps.clock,
            rng: Mutex::new(rng),
            running: Mutex::new(HashSet::new()),
        }
    }

    /// Write pending clicks and stop the background tasks.
    pub async fn shutdown(self) {
        self.batcher.shutdown().await;
        if let Some(listener) = self.listener {
            listener.abort();
        }
        tracing::info!("session stopped");
    }

    fn mirror(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, action: &'static str) -> Result<InFlight<'_>, ActionError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !running.insert(action) {
            tracing::debug!(action, "rejected, already in flight");
            return Err(ActionError::InFlight(action));
        }
        Ok(InFlight {
            running: &self.running,
            action,
        })
    }

    fn emit(&self, event: SessionEvent) {
        tracing::debug!(event = event.name(), "session event");
        let _ = self.events.send(event);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn mode(&self) -> StorageMode {
        self.gateway.mode()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mode = self.gateway.mode();
        let mut state = self.mirror();
        state.mode = mode;
        state.snapshot()
    }

    pub fn stats_summary(&self) -> StatsSummary {
        let state = self.mirror();
        progression::summarize(&state.profile, state.global.total_sheep)
    }

    /// Top players by clicks. `None` offline.
    pub async fn leaderboard(&self) -> Option<Vec<LeaderboardEntry>> {
        self.gateway.top_players(LEADERBOARD_SIZE).await
    }

    /// Wait until every recorded click has been written.
    pub async fn flush(&self) {
        self.batcher.flush().await;
    }

    // ------------------------------------------------------------------
    // Clicks
    // ------------------------------------------------------------------

    /// Register one click. Applied immediately, written by the batcher.
    pub fn click(&self) -> ClickOutcome {
        let now = self.clock.now();
        let (outcome, snapshot, coins, gems) = {
            let mut state = self.mirror();
            let outcome = progression::apply_click(&mut state.profile, now);
            state.global.total_sheep = state.global.total_sheep.saturating_add(1);
            let profile = &state.profile;
            let snapshot = ClickSnapshot {
                user: profile.user.clone(),
                currency: profile.currency.clone(),
                stats: profile.stats.clone(),
            };
            (outcome, snapshot, profile.currency.wool_coins, profile.currency.sheep_gems)
        };
        self.batcher.record(snapshot);

        if let Some(tier) = outcome.tier_up {
            let name = tier_info(tier).map(|t| t.name).unwrap_or_default();
            tracing::info!(tier, name, clicks = outcome.total_clicks, "tier up");
            self.emit(SessionEvent::TierUp { tier, name });
        }
        if outcome.coins_awarded > 0 {
            self.emit(SessionEvent::CoinsAwarded {
                amount: outcome.coins_awarded,
                balance: coins,
            });
        }
        if outcome.gems_awarded > 0 {
            self.emit(SessionEvent::GemAwarded {
                amount: outcome.gems_awarded,
                balance: gems,
            });
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Daily claims and boxes
    // ------------------------------------------------------------------

    pub async fn claim_daily_reward(&self) -> Result<DailyReward, ActionError> {
        let _running = self.begin("claim_daily_reward")?;
        let now = self.clock.now();
        let (reward, currency, stats) = {
            let mut state = self.mirror();
            let reward = progression::claim_daily_reward(&mut state.profile, now)?;
            (reward, state.profile.currency.clone(), state.profile.stats.clone())
        };
        tracing::info!(coins = reward.coins_earned, streak = reward.new_streak, "daily reward claimed");

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        self.gateway.save_stats(&stats).await;
        Ok(reward)
    }

    /// Returns the new gem balance.
    pub async fn claim_daily_gems(&self) -> Result<u64, ActionError> {
        let _running = self.begin("claim_daily_gems")?;
        let now = self.clock.now();
        let (balance, currency) = {
            let mut state = self.mirror();
            let balance = progression::claim_daily_gems(&mut state.profile, now)?;
            (balance, state.profile.currency.clone())
        };
        tracing::info!(balance, "daily gems claimed");

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        Ok(balance)
    }

    pub async fn open_box(&self, kind: BoxKind) -> Result<BoxOpening, ActionError> {
        let _running = self.begin("open_box")?;
        let now = self.clock.now();
        let (opening, currency) = {
            let mut guard = self.mirror();
            let state = &mut *guard;
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            let opening = progression::open_box(&mut state.profile, kind, &state.catalog, now, &mut *rng)?;
            (opening, state.profile.currency.clone())
        };
        tracing::info!(?kind, rewards = opening.rewards.len(), granted = opening.granted.len(), "box opened");

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        for record in &opening.granted {
            self.gateway.grant_collectible(record).await;
        }
        Ok(opening)
    }

    // ------------------------------------------------------------------
    // Collectibles and themes
    // ------------------------------------------------------------------

    pub async fn purchase_collectible(&self, collectible_id: &str) -> Result<(), ActionError> {
        let _running = self.begin("purchase_collectible")?;
        let now = self.clock.now();
        let (record, currency) = {
            let mut guard = self.mirror();
            let state = &mut *guard;
            let collectible = sheep_shared::collectibles::find(&state.catalog, collectible_id)
                .ok_or_else(|| ActionError::UnknownCollectible(collectible_id.to_string()))?;
            let record = progression::purchase_collectible(&mut state.profile, collectible, now)?;
            (record, state.profile.currency.clone())
        };
        tracing::info!(collectible = %record.collectible_id, from = record.obtained_from.as_str(), "collectible acquired");

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        self.gateway.grant_collectible(&record).await;
        Ok(())
    }

    pub async fn select_collectible(&self, collectible_id: &str) -> Result<(), ActionError> {
        let now = self.clock.now();
        let currency = {
            let mut guard = self.mirror();
            let state = &mut *guard;
            let collectible = sheep_shared::collectibles::find(&state.catalog, collectible_id)
                .ok_or_else(|| ActionError::UnknownCollectible(collectible_id.to_string()))?;
            progression::select_collectible(&mut state.profile, collectible, now)?;
            state.profile.currency.clone()
        };

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        Ok(())
    }

    pub async fn purchase_theme(&self, theme_id: &str) -> Result<&'static Theme, ActionError> {
        let _running = self.begin("purchase_theme")?;
        let now = self.clock.now();
        let (theme, currency) = {
            let mut state = self.mirror();
            let theme = progression::purchase_theme(&mut state.profile, theme_id, now)?;
            (theme, state.profile.currency.clone())
        };
        tracing::info!(theme = theme.id, cost = theme.cost, "theme purchased");

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        Ok(theme)
    }

    pub async fn select_theme(&self, theme_id: &str) -> Result<(), ActionError> {
        let now = self.clock.now();
        let currency = {
            let mut state = self.mirror();
            progression::select_theme(&mut state.profile, theme_id, now)?;
            state.profile.currency.clone()
        };

        self.batcher.flush().await;
        self.gateway.save_currency(&currency).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Identity and chat
    // ------------------------------------------------------------------

    pub async fn update_nickname(&self, nickname: &str) -> Result<(), ActionError> {
        let _running = self.begin("update_nickname")?;
        let user = {
            let mut state = self.mirror();
            progression::rename(&mut state.profile, nickname)?;
            state.profile.user.clone()
        };
        tracing::info!(nickname = %user.nickname, "nickname changed");

        self.batcher.flush().await;
        self.gateway.save_user(&user).await;
        Ok(())
    }

    /// Pin the tier shown next to the nickname.
    pub async fn update_tier(&self, level: u8) -> Result<(), ActionError> {
        let user = {
            let mut state = self.mirror();
            progression::set_display_tier(&mut state.profile, level)?;
            state.profile.user.clone()
        };

        self.batcher.flush().await;
        self.gateway.save_user(&user).await;
        Ok(())
    }

    /// Post to the global chat. Unavailable offline.
    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, ActionError> {
        let _running = self.begin("send_message")?;
        let body = progression::validate_message(text)?;
        if self.gateway.mode() == StorageMode::Fallback {
            return Err(ActionError::ChatUnavailable);
        }

        let now = self.clock.now();
        let (message, stats) = {
            let mut state = self.mirror();
            let message = ChatMessage {
                id: uuid::Uuid::new_v4(),
                user_id: state.profile.id(),
                nickname: state.profile.user.nickname.clone(),
                message: body,
                tier: state.profile.user.tier,
                created_at: now,
            };
            progression::record_message_sent(&mut state.profile, now);
            state.push_chat(message.clone());
            (message, state.profile.stats.clone())
        };
        self.emit(SessionEvent::ChatReceived(message.clone()));

        self.batcher.flush().await;
        if self.gateway.insert_chat(&message).await {
            self.gateway.save_stats(&stats).await;
        } else {
            tracing::warn!(message = %message.id, "chat message was not delivered");
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sheep_shared::constants::USER_ID_KEY;
    use sheep_store::Database;

    use super::*;
    use crate::storage::MemoryStorage;

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())))
        }

        fn advance_days(&self, days: i64) {
            *self.0.lock().unwrap() += chrono::Duration::days(days);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn deps(backend: Option<Arc<dyn Backend>>, local: Arc<dyn LocalStore>, clock: Arc<FixedClock>) -> SessionDeps {
        SessionDeps {
            backend,
            local,
            clock,
            rng: StdRng::seed_from_u64(7),
            flush_delay: Duration::from_millis(300),
            chat_window: 50,
        }
    }

    async fn remote_session(backend: &Arc<SqliteBackend>) -> GameSession {
        let backend: Arc<dyn Backend> = backend.clone();
        GameSession::start_with(deps(Some(backend), Arc::new(MemoryStorage::new()), FixedClock::new())).await
    }

    async fn next_chat(events: &mut broadcast::Receiver<SessionEvent>) -> ChatMessage {
        loop {
            if let SessionEvent::ChatReceived(message) = events.recv().await.unwrap() {
                return message;
            }
        }
    }

    #[tokio::test]
    async fn clicks_are_batched_into_the_backend() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let session = remote_session(&backend).await;
        let mut events = session.subscribe();
        assert_eq!(session.mode(), StorageMode::Remote);

        for _ in 0..150 {
            session.click();
        }
        assert_eq!(session.snapshot().global_total, 150);
        session.flush().await;

        let id = session.snapshot().profile.id();
        let stored = backend.get_user(id).await.unwrap().unwrap();
        assert_eq!(stored.total_clicks, 150);
        assert_eq!(stored.tier, 1);
        assert_eq!(backend.global_stats().await.unwrap().total_sheep, 150);
        assert_eq!(backend.get_or_create_currency(id, Utc::now()).await.unwrap().wool_coins, 1);

        assert_eq!(events.recv().await.unwrap(), SessionEvent::TierUp { tier: 1, name: "Shepherd" });
        assert_eq!(events.recv().await.unwrap(), SessionEvent::CoinsAwarded { amount: 1, balance: 1 });
        session.shutdown().await;
    }

    #[tokio::test]
    async fn daily_claims_once_per_day() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let clock = FixedClock::new();
        let session = GameSession::start_with(deps(
            Some(backend.clone() as Arc<dyn Backend>),
            Arc::new(MemoryStorage::new()),
            clock.clone(),
        ))
        .await;

        let first = session.claim_daily_reward().await.unwrap();
        assert_eq!(first.new_streak, 1);
        assert_eq!(session.claim_daily_reward().await, Err(ActionError::AlreadyClaimedToday));
        assert_eq!(session.claim_daily_gems().await, Ok(1));
        assert_eq!(session.claim_daily_gems().await, Err(ActionError::AlreadyClaimedToday));

        clock.advance_days(1);
        let second = session.claim_daily_reward().await.unwrap();
        assert_eq!(second.new_streak, 2);

        let id = session.snapshot().profile.id();
        let stored = backend.get_or_create_currency(id, Utc::now()).await.unwrap();
        assert_eq!(stored.wool_coins, first.coins_earned + second.coins_earned);
        assert_eq!(stored.consecutive_days, 2);
        assert_eq!(stored.sheep_gems, 1);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn collectibles_and_themes_persist() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let session = remote_session(&backend).await;
        session.mirror().profile.currency.sheep_gems = 10;

        assert_eq!(
            session.purchase_collectible("sheep_unicorn").await,
            Err(ActionError::BoxOnly("sheep_unicorn".into()))
        );
        assert_eq!(
            session.purchase_collectible("sheep_yeti").await,
            Err(ActionError::UnknownCollectible("sheep_yeti".into()))
        );
        assert!(matches!(
            session.select_collectible("sheep_goat").await,
            Err(ActionError::NotOwned(_))
        ));

        session.purchase_collectible("sheep_goat").await.unwrap();
        session.select_collectible("sheep_goat").await.unwrap();
        assert_eq!(
            session.purchase_collectible("sheep_goat").await,
            Err(ActionError::AlreadyOwned("sheep_goat".into()))
        );
        assert_eq!(session.snapshot().profile.currency.sheep_gems, 5);

        let id = session.snapshot().profile.id();
        let owned = backend.owned_collectibles(id).await.unwrap();
        assert_eq!(owned.len(), 1);
        let currency = backend.get_or_create_currency(id, Utc::now()).await.unwrap();
        assert_eq!(currency.selected_sheep_emoji, "🐐");
        assert_eq!(currency.sheep_gems, 5);

        assert!(matches!(
            session.purchase_theme("forest").await,
            Err(ActionError::InsufficientCoins { .. })
        ));
        assert!(matches!(session.select_theme("forest").await, Err(ActionError::NotOwned(_))));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn daily_box_grants_are_recorded() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let session = remote_session(&backend).await;

        let opening = session.open_box(BoxKind::Daily).await.unwrap();
        assert_eq!(opening.rewards.len(), 2);
        assert_eq!(session.open_box(BoxKind::Daily).await, Err(ActionError::AlreadyClaimedToday));

        let id = session.snapshot().profile.id();
        let owned = backend.owned_collectibles(id).await.unwrap();
        assert_eq!(owned.len(), opening.granted.len());
        let stored = backend.get_or_create_currency(id, Utc::now()).await.unwrap();
        assert_eq!(stored, session.snapshot().profile.currency);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn concurrent_same_action_is_rejected() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let session = remote_session(&backend).await;
        session.mirror().profile.currency.sheep_gems = 100;

        let (first, second) = tokio::join!(session.open_box(BoxKind::Premium), session.open_box(BoxKind::Premium));
        assert!(first.is_ok());
        assert_eq!(second, Err(ActionError::InFlight("open_box")));

        // The guard is released once the first call finishes.
        assert!(session.open_box(BoxKind::Premium).await.is_ok());
        session.shutdown().await;
    }

    #[tokio::test]
    async fn chat_reaches_other_sessions() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let alice = remote_session(&backend).await;
        let bob = remote_session(&backend).await;
        let mut bob_events = bob.subscribe();

        assert!(matches!(alice.send_message("   ").await, Err(ActionError::InvalidMessage(_))));
        assert!(matches!(
            alice.send_message(&"b".repeat(201)).await,
            Err(ActionError::InvalidMessage(_))
        ));

        let sent = alice.send_message("  hello flock  ").await.unwrap();
        assert_eq!(sent.message, "hello flock");
        assert_eq!(next_chat(&mut bob_events).await.id, sent.id);
        assert_eq!(bob.snapshot().chat[0].id, sent.id);
        assert_eq!(alice.snapshot().chat.len(), 1, "own message shown once");
        assert_eq!(alice.snapshot().profile.stats.messages_sent, 1);

        // A late joiner sees the history.
        let carol = remote_session(&backend).await;
        assert_eq!(carol.snapshot().chat[0].id, sent.id);

        let board = alice.leaderboard().await.unwrap();
        assert_eq!(board.len(), 3);

        for s in [alice, bob, carol] {
            s.shutdown().await;
        }
    }

    #[tokio::test]
    async fn nickname_and_tier_updates() {
        let backend = Arc::new(SqliteBackend::in_memory().unwrap());
        let session = remote_session(&backend).await;

        session.update_nickname("  Dolly ").await.unwrap();
        assert!(matches!(session.update_nickname("").await, Err(ActionError::InvalidNickname(_))));
        assert_eq!(session.update_tier(3).await, Err(ActionError::TierLocked(3)));

        for _ in 0..120 {
            session.click();
        }
        session.update_tier(0).await.unwrap();

        let id = session.snapshot().profile.id();
        let stored = backend.get_user(id).await.unwrap().unwrap();
        assert_eq!(stored.nickname, "Dolly");
        assert_eq!(stored.tier, 0);
        assert_eq!(stored.total_clicks, 120);
        assert_eq!(session.stats_summary().earned_tier, 1);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn offline_session_keeps_playing() {
        let local = Arc::new(MemoryStorage::new());
        let clock = FixedClock::new();
        let session = GameSession::start_with(deps(None, local.clone(), clock.clone())).await;
        assert_eq!(session.mode(), StorageMode::Fallback);
        assert_eq!(session.snapshot().mode, StorageMode::Fallback);

        for _ in 0..10 {
            session.click();
        }
        session.claim_daily_reward().await.unwrap();
        assert_eq!(session.send_message("baa").await, Err(ActionError::ChatUnavailable));
        assert!(session.leaderboard().await.is_none());
        assert!(session.open_box(BoxKind::Daily).await.is_ok());
        session.shutdown().await;

        assert_eq!(local.get("offline_total_clicks").unwrap().as_deref(), Some("10"));
        assert_eq!(local.get("offline_total_sheep").unwrap().as_deref(), Some("10"));
        assert!(local.get(USER_ID_KEY).unwrap().is_some());

        let again = GameSession::start_with(deps(None, local, clock)).await;
        let snapshot = again.snapshot();
        assert_eq!(snapshot.profile.user.total_clicks, 10);
        assert_eq!(snapshot.global_total, 10);
        assert_eq!(snapshot.profile.currency.consecutive_days, 1);
        assert_eq!(again.open_box(BoxKind::Daily).await, Err(ActionError::AlreadyClaimedToday));
        again.shutdown().await;
    }

    #[tokio::test]
    async fn start_from_config_reopens_the_same_player() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            backend_url: Some(format!("sqlite://{}", dir.path().join("backend.db").display())),
            local_storage: LocalStorageLocation::Path(dir.path().join("local.db")),
            ..ClientConfig::default()
        };

        let first = GameSession::start(&config).await.unwrap();
        assert_eq!(first.mode(), StorageMode::Remote);
        for _ in 0..3 {
            first.click();
        }
        let id = first.snapshot().profile.id();
        first.shutdown().await;

        let second = GameSession::start(&config).await.unwrap();
        let snapshot = second.snapshot();
        assert_eq!(snapshot.profile.id(), id);
        assert_eq!(snapshot.profile.user.total_clicks, 3);
        assert_eq!(snapshot.global_total, 3);
        second.shutdown().await;
    }

    #[tokio::test]
    async fn missing_schema_falls_back() {
        let broken: Arc<dyn Backend> =
            Arc::new(SqliteBackend::new(Database::open_in_memory_without_schema().unwrap()));
        let local = Arc::new(MemoryStorage::new());
        let session = GameSession::start_with(deps(Some(broken), local.clone(), FixedClock::new())).await;

        assert_eq!(session.mode(), StorageMode::Fallback);
        assert!(!session.snapshot().profile.user.nickname.is_empty());
        assert_eq!(session.snapshot().chat.len(), 0);

        session.click();
        session.shutdown().await;
        assert_eq!(local.get("offline_total_clicks").unwrap().as_deref(), Some("1"));
    }
}
