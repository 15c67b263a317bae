use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sheep_shared::protocol::ChangeEvent;
use sheep_shared::{
    ChatMessage, Collectible, GlobalStats, LeaderboardEntry, User, UserCollectible, UserCurrency, UserId,
    UserStats,
};
use sheep_store::Database;
use tokio::sync::broadcast;

use super::{Backend, BackendError, BackendResult};

const CHANGE_FEED_CAPACITY: usize = 1024;

/// [`Backend`] over a `sheep-store` database.
///
/// Writes are published on the change feed once committed, so every session
/// sharing one `SqliteBackend` sees the others' chat, counter and player
/// updates.
pub struct SqliteBackend {
    db: Mutex<Database>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { db: Mutex::new(db), changes }
    }

    pub fn open(path: &Path) -> BackendResult<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn in_memory() -> BackendResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> sheep_store::Result<T>) -> BackendResult<T> {
        let db = self
            .db
            .lock()
            .map_err(|e| BackendError::Unavailable(format!("Lock poisoned: {e}")))?;
        Ok(f(&db)?)
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        let receivers = self.changes.send(event).unwrap_or(0);
        tracing::trace!(receivers, "published change");
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn get_user(&self, id: UserId) -> BackendResult<Option<User>> {
        self.with_db(|db| db.find_user(id))
    }

    async fn insert_user(&self, user: &User) -> BackendResult<()> {
        self.with_db(|db| db.create_user(user))?;
        self.publish(ChangeEvent::UserUpdated(user.clone()));
        Ok(())
    }

    async fn update_user(&self, user: &User) -> BackendResult<()> {
        if self.with_db(|db| db.update_user(user))? {
            self.publish(ChangeEvent::UserUpdated(user.clone()));
        } else {
            tracing::warn!(user = %user.id, "update for unknown user ignored");
        }
        Ok(())
    }

    async fn get_or_create_currency(&self, id: UserId, now: DateTime<Utc>) -> BackendResult<UserCurrency> {
        self.with_db(|db| db.get_or_create_currency(id, now))
    }

    async fn update_currency(&self, currency: &UserCurrency) -> BackendResult<()> {
        self.with_db(|db| db.upsert_currency(currency))
    }

    async fn get_or_create_stats(&self, id: UserId, now: DateTime<Utc>) -> BackendResult<UserStats> {
        self.with_db(|db| db.get_or_create_stats(id, now))
    }

    async fn update_stats(&self, stats: &UserStats) -> BackendResult<()> {
        self.with_db(|db| db.upsert_stats(stats))
    }

    async fn global_stats(&self) -> BackendResult<GlobalStats> {
        self.with_db(|db| db.get_global_stats())
    }

    async fn increment_global(&self, delta: u64, now: DateTime<Utc>) -> BackendResult<GlobalStats> {
        let stats = self.with_db(|db| db.increment_global_stats(delta, now))?;
        self.publish(ChangeEvent::GlobalStatsUpdated(stats.clone()));
        Ok(stats)
    }

    async fn insert_chat(&self, message: &ChatMessage) -> BackendResult<()> {
        self.with_db(|db| db.insert_chat_message(message))?;
        self.publish(ChangeEvent::ChatInserted(message.clone()));
        Ok(())
    }

    async fn recent_chat(&self, limit: usize) -> BackendResult<Vec<ChatMessage>> {
        self.with_db(|db| db.recent_chat_messages(limit))
    }

    async fn collectibles(&self) -> BackendResult<Vec<Collectible>> {
        self.with_db(|db| db.list_collectibles())
    }

    async fn owned_collectibles(&self, id: UserId) -> BackendResult<Vec<UserCollectible>> {
        self.with_db(|db| db.list_user_collectibles(id))
    }

    async fn grant_collectible(&self, record: &UserCollectible) -> BackendResult<bool> {
        self.with_db(|db| db.grant_collectible(record))
    }

    async fn top_players(&self, limit: usize) -> BackendResult<Vec<LeaderboardEntry>> {
        self.with_db(|db| db.top_users(limit))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_are_published() {
        let backend = SqliteBackend::in_memory().unwrap();
        let mut feed = backend.subscribe();

        let user = User::anonymous(UserId::new(), 12, Utc::now());
        backend.insert_user(&user).await.unwrap();
        backend.increment_global(4, Utc::now()).await.unwrap();

        assert_eq!(feed.recv().await.unwrap(), ChangeEvent::UserUpdated(user));
        match feed.recv().await.unwrap() {
            ChangeEvent::GlobalStatsUpdated(stats) => assert_eq!(stats.total_sheep, 4),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_schema_is_classified() {
        let backend = SqliteBackend::new(Database::open_in_memory_without_schema().unwrap());
        let err = backend.get_user(UserId::new()).await.unwrap_err();
        assert!(err.is_schema_missing(), "{err}");
    }
}
