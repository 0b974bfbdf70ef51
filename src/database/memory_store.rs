use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{StoreError, UserStore};
use crate::models::{Location, SharingSettings, UserId, UserRecord};

#[derive(Default)]
struct MemoryState {
    users: IndexMap<UserId, UserRecord>,
    sessions: HashMap<String, UserId>,
}

/// Non-durable store. One lock guards users and sessions together, so a
/// snapshot never observes a half-applied write.
#[derive(Default)]
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.state.read().users.get(user_id).cloned())
    }

    async fn put(&self, user: UserRecord) -> Result<(), StoreError> {
        self.state.write().users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        state.sessions.retain(|_, owner| owner != user_id);
        Ok(state.users.shift_remove(user_id).is_some())
    }

    async fn snapshot(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.state.read().users.values().cloned().collect())
    }

    async fn set_location(&self, user_id: &str, location: Location) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let Some(user) = state.users.get_mut(user_id) else {
            return Ok(false);
        };
        user.location = Some(location);
        Ok(true)
    }

    async fn set_settings(
        &self,
        user_id: &str,
        settings: SharingSettings,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write();
        let Some(user) = state.users.get_mut(user_id) else {
            return Ok(false);
        };
        user.settings = settings;
        Ok(true)
    }

    async fn session_user(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.state.read().sessions.get(token).cloned())
    }

    async fn insert_session(&self, token: &str, user_id: &str) -> Result<(), StoreError> {
        self.state
            .write()
            .sessions
            .insert(token.to_string(), user_id.to_string());
        Ok(())
    }

    async fn remove_session(&self, token: &str) -> Result<(), StoreError> {
        self.state.write().sessions.remove(token);
        Ok(())
    }

    async fn counts(&self) -> Result<(usize, usize), StoreError> {
        let state = self.state.read();
        Ok((state.sessions.len(), state.users.len()))
    }
}
