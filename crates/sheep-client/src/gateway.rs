//! Persistence gateway.
//!
//! One set of operations over two backings: the remote [`Backend`] and the
//! offline slots in the [`LocalStore`]. Offline mode is chosen up front when
//! no backend is configured, and latched for the rest of the session the
//! first time a remote call reports that the schema is missing. Any other
//! remote failure is logged and dropped; local state is never rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use sheep_shared::collectibles::default_catalog;
use sheep_shared::constants::USER_ID_KEY;
use sheep_shared::protocol::ChangeEvent;
use sheep_shared::{
    ChatMessage, Collectible, GlobalStats, LeaderboardEntry, Profile, User, UserCollectible, UserCurrency,
    UserId, UserStats,
};
use tokio::sync::broadcast;

use crate::backend::{Backend, BackendError, BackendResult};
use crate::batcher::{ClickBatch, FlushSink};
use crate::events::SessionEvent;
use crate::offline::OfflineSlots;
use crate::storage::LocalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Reads and writes go to the backend.
    Remote,
    /// Everything stays in local storage; no chat, no cross-client sync.
    Fallback,
}

pub struct PersistenceGateway {
    backend: Option<Arc<dyn Backend>>,
    local: Arc<dyn LocalStore>,
    offline: OfflineSlots,
    latched: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl PersistenceGateway {
    /// `backend` is `None` when offline mode is forced by configuration.
    pub fn new(
        backend: Option<Arc<dyn Backend>>,
        local: Arc<dyn LocalStore>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        if backend.is_none() {
            tracing::info!("no backend configured, running in offline mode");
        }
        Self {
            latched: AtomicBool::new(backend.is_none()),
            backend,
            offline: OfflineSlots::new(local.clone()),
            local,
            events,
        }
    }

    pub fn mode(&self) -> StorageMode {
        if self.latched.load(Ordering::SeqCst) {
            StorageMode::Fallback
        } else {
            StorageMode::Remote
        }
    }

    fn remote(&self) -> Option<&Arc<dyn Backend>> {
        match self.mode() {
            StorageMode::Remote => self.backend.as_ref(),
            StorageMode::Fallback => None,
        }
    }

    /// Switch to offline mode for the rest of the session.
    fn latch_offline(&self, reason: &str) {
        if !self.latched.swap(true, Ordering::SeqCst) {
            tracing::warn!(reason, "backend schema missing, switching to offline mode");
            let _ = self.events.send(SessionEvent::ModeChanged { mode: StorageMode::Fallback });
        }
    }

    /// Log a failed remote call. Returns `true` when the caller should redo
    /// the operation against local storage.
    fn remote_failed(&self, op: &'static str, err: &BackendError) -> bool {
        if err.is_schema_missing() {
            self.latch_offline(&err.to_string());
            true
        } else {
            tracing::warn!(op, error = %err, "backend call failed");
            false
        }
    }

    /// Keep going with `fallback` unless the schema is missing.
    fn tolerate<T>(&self, op: &'static str, result: BackendResult<T>, fallback: impl FnOnce() -> T) -> BackendResult<T> {
        match result {
            Ok(v) => Ok(v),
            Err(e) if e.is_schema_missing() => Err(e),
            Err(e) => {
                tracing::warn!(op, error = %e, "backend call failed, continuing with defaults");
                Ok(fallback())
            }
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    fn remembered_id(&self) -> Option<UserId> {
        let raw = match self.local.get(USER_ID_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "could not read remembered user id");
                return None;
            }
        };
        match UserId::parse(&raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(value = %raw, error = %e, "ignoring malformed remembered user id");
                None
            }
        }
    }

    fn remember_id(&self, id: UserId) {
        if let Err(e) = self.local.set(USER_ID_KEY, &id.to_string()) {
            tracing::error!(error = %e, "could not remember user id");
        }
    }

    /// Find or create the player for this device.
    ///
    /// When the remembered player cannot be loaded because of a transient
    /// failure, the session plays as a fresh guest instead. The guest is not
    /// remembered, so the next session reconnects to the saved player, whose
    /// rows are never overwritten with defaults.
    pub async fn provision<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Profile {
        let suffix = rng.gen_range(0..1000);
        if let Some(backend) = self.remote() {
            match self.provision_remote(backend.as_ref(), now, suffix).await {
                Ok(profile) => return profile,
                Err(e) if self.remote_failed("provision", &e) => {}
                Err(_) => return self.provision_guest(backend.as_ref(), now, suffix).await,
            }
        }
        self.provision_offline(now, suffix)
    }

    async fn provision_remote(&self, backend: &dyn Backend, now: DateTime<Utc>, suffix: u32) -> BackendResult<Profile> {
        if let Some(id) = self.remembered_id() {
            if let Some(user) = backend.get_user(id).await? {
                // Every read has to succeed here; defaults would be written
                // back over the saved rows.
                let currency = backend.get_or_create_currency(id, now).await?;
                let stats = backend.get_or_create_stats(id, now).await?;
                let owned = backend.owned_collectibles(id).await?;
                tracing::info!(user = %id, nickname = %user.nickname, "welcome back");
                return Ok(Profile {
                    user,
                    currency,
                    stats,
                    owned: owned.into_iter().map(|o| o.collectible_id).collect(),
                });
            }
            tracing::info!(user = %id, "remembered player unknown to the backend");
        }

        let profile = self.create_remote(backend, User::anonymous(UserId::new(), suffix, now), now).await?;
        self.remember_id(profile.id());
        tracing::info!(user = %profile.id(), nickname = %profile.user.nickname, "created new player");
        Ok(profile)
    }

    /// Insert a brand-new player. Only a missing schema is an error; anything
    /// else proceeds with the locally held identity.
    async fn create_remote(&self, backend: &dyn Backend, user: User, now: DateTime<Utc>) -> BackendResult<Profile> {
        let id = user.id;
        let inserted = backend.insert_user(&user).await;
        self.tolerate("insert_user", inserted, || ())?;
        let currency = backend.get_or_create_currency(id, now).await;
        let currency = self.tolerate("currency", currency, || UserCurrency::new(id, now))?;
        let stats = backend.get_or_create_stats(id, now).await;
        let stats = self.tolerate("stats", stats, || UserStats::new(id, now))?;

        Ok(Profile {
            user,
            currency,
            stats,
            owned: Default::default(),
        })
    }

    async fn provision_guest(&self, backend: &dyn Backend, now: DateTime<Utc>, suffix: u32) -> Profile {
        let user = User::anonymous(UserId::new(), suffix, now);
        tracing::warn!(user = %user.id, "could not load the remembered player, playing as a guest");
        match self.create_remote(backend, user, now).await {
            Ok(profile) => profile,
            Err(e) => {
                self.remote_failed("provision", &e);
                self.provision_offline(now, suffix)
            }
        }
    }

    fn provision_offline(&self, now: DateTime<Utc>, suffix: u32) -> Profile {
        let id = self.remembered_id().unwrap_or_else(|| {
            let id = UserId::new();
            self.remember_id(id);
            id
        });
        let profile = self.offline.load_profile(id, now, || format!("Sheep{suffix}"));
        tracing::info!(user = %id, nickname = %profile.user.nickname, "loaded offline player");
        profile
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn global_stats(&self, now: DateTime<Utc>) -> GlobalStats {
        if let Some(backend) = self.remote() {
            match backend.global_stats().await {
                Ok(stats) => return stats,
                Err(e) => {
                    self.remote_failed("global_stats", &e);
                }
            }
        }
        GlobalStats {
            total_sheep: self.offline.total_sheep(),
            updated_at: now,
        }
    }

    /// Newest first. Always empty offline.
    pub async fn recent_chat(&self, limit: usize) -> Vec<ChatMessage> {
        if let Some(backend) = self.remote() {
            match backend.recent_chat(limit).await {
                Ok(messages) => return messages,
                Err(e) => {
                    self.remote_failed("recent_chat", &e);
                }
            }
        }
        Vec::new()
    }

    /// Backend catalog, or the built-in one offline or when the fetch fails.
    pub async fn catalog(&self) -> Vec<Collectible> {
        if let Some(backend) = self.remote() {
            match backend.collectibles().await {
                Ok(items) if !items.is_empty() => return items,
                Ok(_) => tracing::warn!("backend catalog is empty, using built-in catalog"),
                Err(e) => {
                    self.remote_failed("collectibles", &e);
                }
            }
        }
        default_catalog()
    }

    /// `None` offline, where there is no shared leaderboard.
    pub async fn top_players(&self, limit: usize) -> Option<Vec<LeaderboardEntry>> {
        let backend = self.remote()?;
        match backend.top_players(limit).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                self.remote_failed("top_players", &e);
                None
            }
        }
    }

    /// Change feed, only while remote.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ChangeEvent>> {
        self.remote().map(|b| b.subscribe())
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub async fn save_user(&self, user: &User) {
        if let Some(backend) = self.remote() {
            match backend.update_user(user).await {
                Ok(()) => return,
                Err(e) if !self.remote_failed("update_user", &e) => return,
                Err(_) => {}
            }
        }
        self.offline.save_user(user);
    }

    pub async fn save_currency(&self, currency: &UserCurrency) {
        if let Some(backend) = self.remote() {
            match backend.update_currency(currency).await {
                Ok(()) => return,
                Err(e) if !self.remote_failed("update_currency", &e) => return,
                Err(_) => {}
            }
        }
        self.offline.save_currency(currency);
    }

    pub async fn save_stats(&self, stats: &UserStats) {
        if let Some(backend) = self.remote() {
            match backend.update_stats(stats).await {
                Ok(()) => return,
                Err(e) if !self.remote_failed("update_stats", &e) => return,
                Err(_) => {}
            }
        }
        self.offline.save_stats(stats);
    }

    /// Record ownership. Already-owned grants are silently ignored.
    pub async fn grant_collectible(&self, record: &UserCollectible) {
        if let Some(backend) = self.remote() {
            match backend.grant_collectible(record).await {
                Ok(true) => return,
                Ok(false) => {
                    tracing::debug!(collectible = %record.collectible_id, "already owned, grant ignored");
                    return;
                }
                Err(e) if !self.remote_failed("grant_collectible", &e) => return,
                Err(_) => {}
            }
        }
        self.offline.add_owned(&record.collectible_id);
    }

    /// Post a chat message. Chat does not exist offline, so this is a no-op
    /// there and returns `false`.
    pub async fn insert_chat(&self, message: &ChatMessage) -> bool {
        let Some(backend) = self.remote() else {
            return false;
        };
        match backend.insert_chat(message).await {
            Ok(()) => true,
            Err(e) => {
                self.remote_failed("insert_chat", &e);
                false
            }
        }
    }

    /// Write a click batch: atomic global increment plus the player rows.
    pub async fn persist_clicks(&self, batch: &ClickBatch) {
        let now = batch.snapshot.stats.updated_at;
        if let Some(backend) = self.remote() {
            match backend.increment_global(batch.delta, now).await {
                Ok(global) => {
                    tracing::debug!(delta = batch.delta, total = global.total_sheep, "global counter incremented");
                }
                Err(e) => {
                    if self.remote_failed("increment_global", &e) {
                        self.offline.add_total_sheep(batch.delta);
                    }
                }
            }
        } else {
            self.offline.add_total_sheep(batch.delta);
        }

        let snapshot = &batch.snapshot;
        self.save_user(&snapshot.user).await;
        self.save_stats(&snapshot.stats).await;
        self.save_currency(&snapshot.currency).await;
    }
}

#[async_trait]
impl FlushSink for PersistenceGateway {
    async fn flush(&self, batch: ClickBatch) {
        self.persist_clicks(&batch).await;
    }
}
