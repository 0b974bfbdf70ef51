use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::warn;

use super::{schema, sessions_repo, users_repo, StoreError, UserStore};
use crate::models::{Location, SharingSettings, UserId, UserRecord, UserRow};

/// Durable store on SQLite.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    /// Connect, creating the database file if needed, and make sure the
    /// schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin the pool
        // to one connection that never gets recycled.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        schema::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        users_repo::load_user(&self.pool, user_id)
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }

    async fn put(&self, user: UserRecord) -> Result<(), StoreError> {
        let row = UserRow::try_from(&user)?;
        users_repo::upsert_user(&self.pool, &row).await?;
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        sessions_repo::delete_user_sessions(&mut *tx, user_id).await?;
        let deleted = users_repo::delete_user(&mut *tx, user_id).await?;
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn snapshot(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = users_repo::load_all_users(&self.pool).await?;
        let users = rows
            .into_iter()
            .filter_map(|row| match UserRecord::try_from(row) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Skipping unreadable user record: {}", e);
                    None
                }
            })
            .collect();
        Ok(users)
    }

    async fn set_location(&self, user_id: &str, location: Location) -> Result<bool, StoreError> {
        let updated = users_repo::update_location(&self.pool, user_id, &location).await?;
        Ok(updated > 0)
    }

    async fn set_settings(
        &self,
        user_id: &str,
        settings: SharingSettings,
    ) -> Result<bool, StoreError> {
        let settings_json = serde_json::to_string(&settings)?;
        let updated = users_repo::update_settings(&self.pool, user_id, &settings_json).await?;
        Ok(updated > 0)
    }

    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(sessions_repo::load_session_user(&self.pool, token).await?)
    }

    async fn insert_session(&self, token: &str, user_id: &str) -> Result<(), StoreError> {
        sessions_repo::insert_session(&self.pool, token, user_id).await?;
        Ok(())
    }

    async fn remove_session(&self, token: &str) -> Result<(), StoreError> {
        sessions_repo::delete_session(&self.pool, token).await?;
        Ok(())
    }

    async fn counts(&self) -> Result<(usize, usize), StoreError> {
        let sessions = sessions_repo::count_sessions(&self.pool).await?;
        let users = users_repo::count_users(&self.pool).await?;
        Ok((sessions.max(0) as usize, users.max(0) as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscordAuth, GuildInfo};

    async fn setup_store() -> SqliteUserStore {
        SqliteUserStore::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory store")
    }

    fn user(id: &str, location: Option<Location>) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: format!("user-{}", id),
            avatar_url: None,
            guilds: vec![GuildInfo {
                id: "g1".to_string(),
                name: "Guild One".to_string(),
                icon: None,
            }],
            location,
            settings: SharingSettings {
                guild_ids: vec!["g1".to_string()],
            },
            auth: DiscordAuth {
                access_token: "a".to_string(),
                expires_in: 604800,
                refresh_token: "r".to_string(),
                scope: "identify guilds".to_string(),
                token_type: "Bearer".to_string(),
                created_at: 1_700_000_000,
            },
            push_token: None,
        }
    }

    #[tokio::test]
    async fn put_then_get_returns_same_record() {
        let store = setup_store().await;
        let mut loc = Location::new(37.0, -122.0, 1.0);
        loc.mocked = Some(false);
        let u = user("1", Some(loc));
        store.put(u.clone()).await.unwrap();

        assert_eq!(store.get("1").await.unwrap(), Some(u));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn snapshot_keeps_insertion_order_across_updates() {
        let store = setup_store().await;
        for id in ["b", "a", "c"] {
            store.put(user(id, None)).await.unwrap();
        }

        let mut renamed = user("b", None);
        renamed.username = "renamed".to_string();
        store.put(renamed).await.unwrap();

        let ids: Vec<String> = store
            .snapshot()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(store.get("b").await.unwrap().unwrap().username, "renamed");
    }

    #[tokio::test]
    async fn snapshot_skips_corrupt_rows() {
        let store = setup_store().await;
        store.put(user("good", None)).await.unwrap();

        sqlx::query("INSERT INTO users (user_id, username, guilds, auth) VALUES ('bad', 'x', 'not json', '{}')")
            .execute(store.pool())
            .await
            .expect("Failed to insert corrupt row");

        let users = store.snapshot().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "good");

        assert!(matches!(
            store.get("bad").await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn set_location_and_settings_only_touch_existing_users() {
        let store = setup_store().await;
        store.put(user("1", None)).await.unwrap();

        let loc = Location::new(1.5, 2.5, 42.0);
        assert!(store.set_location("1", loc.clone()).await.unwrap());
        assert!(!store.set_location("2", loc.clone()).await.unwrap());

        let settings = SharingSettings { guild_ids: vec![] };
        assert!(store.set_settings("1", settings.clone()).await.unwrap());
        assert!(!store.set_settings("2", settings.clone()).await.unwrap());

        let stored = store.get("1").await.unwrap().unwrap();
        assert_eq!(stored.location, Some(loc));
        assert_eq!(stored.settings, settings);
    }

    #[tokio::test]
    async fn remove_drops_user_and_their_sessions() {
        let store = setup_store().await;
        store.put(user("1", None)).await.unwrap();
        store.put(user("2", None)).await.unwrap();
        store.insert_session("s1", "1").await.unwrap();
        store.insert_session("s1b", "1").await.unwrap();
        store.insert_session("s2", "2").await.unwrap();

        assert_eq!(store.counts().await.unwrap(), (3, 2));
        assert!(store.remove("1").await.unwrap());
        assert!(!store.remove("1").await.unwrap());

        assert_eq!(store.session_user("s1").await.unwrap(), None);
        assert_eq!(store.session_user("s1b").await.unwrap(), None);
        assert_eq!(store.session_user("s2").await.unwrap(), Some("2".to_string()));
        assert_eq!(store.counts().await.unwrap(), (1, 1));
    }

    #[tokio::test]
    async fn remove_session_is_idempotent() {
        let store = setup_store().await;
        store.insert_session("tok", "1").await.unwrap();
        store.remove_session("tok").await.unwrap();
        store.remove_session("tok").await.unwrap();
        assert_eq!(store.session_user("tok").await.unwrap(), None);
    }
}
