//! The relational backend the client persists to.
//!
//! [`Backend`] is the collaborator seam: everything the session needs from
//! remote storage plus a change feed. [`SqliteBackend`] is the bundled
//! implementation.

mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sheep_shared::protocol::ChangeEvent;
use sheep_shared::{
    ChatMessage, Collectible, GlobalStats, LeaderboardEntry, User, UserCollectible, UserCurrency, UserId,
    UserStats,
};
use sheep_store::StoreError;
use thiserror::Error;
use tokio::sync::broadcast;

pub use sqlite::SqliteBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    /// The tables the client relies on do not exist.
    #[error("Backend schema missing: {0}")]
    SchemaMissing(String),

    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend storage error: {0}")]
    Storage(String),
}

impl BackendError {
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, Self::SchemaMissing(_))
    }
}

impl From<StoreError> for BackendError {
    fn from(e: StoreError) -> Self {
        if e.is_schema_missing() {
            Self::SchemaMissing(e.to_string())
        } else {
            Self::Storage(e.to_string())
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_user(&self, id: UserId) -> BackendResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> BackendResult<()>;
    async fn update_user(&self, user: &User) -> BackendResult<()>;

    async fn get_or_create_currency(&self, id: UserId, now: DateTime<Utc>) -> BackendResult<UserCurrency>;
    async fn update_currency(&self, currency: &UserCurrency) -> BackendResult<()>;

    async fn get_or_create_stats(&self, id: UserId, now: DateTime<Utc>) -> BackendResult<UserStats>;
    async fn update_stats(&self, stats: &UserStats) -> BackendResult<()>;

    async fn global_stats(&self) -> BackendResult<GlobalStats>;
    /// Atomic add; returns the counter after the increment.
    async fn increment_global(&self, delta: u64, now: DateTime<Utc>) -> BackendResult<GlobalStats>;

    async fn insert_chat(&self, message: &ChatMessage) -> BackendResult<()>;
    /// Newest first.
    async fn recent_chat(&self, limit: usize) -> BackendResult<Vec<ChatMessage>>;

    async fn collectibles(&self) -> BackendResult<Vec<Collectible>>;
    async fn owned_collectibles(&self, id: UserId) -> BackendResult<Vec<UserCollectible>>;
    /// Insert-if-absent. `Ok(false)` when the record already existed.
    async fn grant_collectible(&self, record: &UserCollectible) -> BackendResult<bool>;

    async fn top_players(&self, limit: usize) -> BackendResult<Vec<LeaderboardEntry>>;

    /// Change feed of committed writes.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
