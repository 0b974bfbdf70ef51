use std::sync::Arc;

use crate::config::Config;
use crate::database::MemoryUserStore;
use crate::models::{DiscordAuth, GuildInfo, Location, SharingSettings, UserRecord};
use crate::services::identity_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub const G1: &str = "1014436790251290624";
pub const G2: &str = "982436897571881061";

pub fn test_state() -> AppState {
    let mut config = Config::new("client", "secret");
    config.static_dir = "does-not-exist".to_string();
    AppState::new(config, Arc::new(MemoryUserStore::new()))
}

pub fn user(id: &str, at: Option<(f64, f64)>, guilds: &[&str], shared: &[&str]) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        username: format!("name-{}", id),
        avatar_url: None,
        guilds: guilds
            .iter()
            .map(|g| GuildInfo {
                id: g.to_string(),
                name: format!("Guild {}", g),
                icon: None,
            })
            .collect(),
        location: at.map(|(lat, lon)| Location::new(lat, lon, 0.0)),
        settings: SharingSettings {
            guild_ids: shared.iter().map(|s| s.to_string()).collect(),
        },
        auth: DiscordAuth {
            access_token: "at".to_string(),
            expires_in: 604800,
            refresh_token: "rt".to_string(),
            scope: "identify guilds".to_string(),
            token_type: "Bearer".to_string(),
            created_at: identity_service::unix_now(),
        },
        push_token: None,
    }
}

pub async fn add_user(state: &AppState, user: UserRecord) -> AuthenticatedUser {
    let id = user.id.clone();
    state.store.put(user).await.unwrap();
    let session = identity_service::open_session(state.store.as_ref(), &id)
        .await
        .unwrap();
    AuthenticatedUser { id, session }
}
