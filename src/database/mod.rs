pub mod memory_store;
pub mod schema;
pub mod sessions_repo;
pub mod sqlite_store;
pub mod users_repo;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Location, SharingSettings, UserId, UserRecord};

pub use memory_store::MemoryUserStore;
pub use sqlite_store::SqliteUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("stored record for user {user_id} is corrupt: {reason}")]
    Corrupt { user_id: UserId, reason: String },
}

/// Users and their sessions.
///
/// `snapshot` returns every decodable user in insertion order, read at a
/// single point in time. Writes are visible to every later call once they
/// return.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Insert or replace a user. A replaced user keeps its position in
    /// snapshot order.
    async fn put(&self, user: UserRecord) -> Result<(), StoreError>;

    /// Remove a user together with every session that points at them.
    async fn remove(&self, user_id: &str) -> Result<bool, StoreError>;

    async fn snapshot(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Returns false when the user does not exist.
    async fn set_location(&self, user_id: &str, location: Location) -> Result<bool, StoreError>;

    /// Returns false when the user does not exist.
    async fn set_settings(
        &self,
        user_id: &str,
        settings: SharingSettings,
    ) -> Result<bool, StoreError>;

    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError>;

    async fn insert_session(&self, token: &str, user_id: &str) -> Result<(), StoreError>;

    async fn remove_session(&self, token: &str) -> Result<(), StoreError>;

    /// (sessions, users)
    async fn counts(&self) -> Result<(usize, usize), StoreError>;
}
