use std::collections::HashSet;

use thiserror::Error;
use tracing::info;

use crate::database::{StoreError, UserStore};
use crate::models::{DiscordAuth, GuildId, GuildInfo, Location, UserRecord};
use crate::services::discord_service::{DiscordClient, DiscordError, DiscordProfile};
use crate::services::identity_service;
use crate::services::settings_service;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Discord(#[from] DiscordError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct LoginOutcome {
    pub user: UserRecord,
    pub session: String,
    pub guilds: Vec<GuildInfo>,
}

/// What a login carries besides the Discord code.
#[derive(Debug, Clone, Default)]
pub struct LoginExtras {
    pub location: Option<Location>,
    pub push_token: Option<String>,
}

/// Create or refresh the user from fresh Discord data and open a session.
///
/// Settings are reset to every supported guild the user is in. A stored
/// location or push token survives when the login does not bring a new one.
pub async fn upsert_discord_user(
    store: &dyn UserStore,
    supported_guilds: &HashSet<GuildId>,
    profile: &DiscordProfile,
    auth: DiscordAuth,
    guilds: Vec<GuildInfo>,
    extras: LoginExtras,
) -> Result<(UserRecord, String), StoreError> {
    let existing = store.get(&profile.id).await?;
    let (old_location, old_push_token) = existing
        .map(|u| (u.location, u.push_token))
        .unwrap_or_default();

    let guild_ids: Vec<GuildId> = guilds.iter().map(|g| g.id.clone()).collect();
    let user = UserRecord {
        id: profile.id.clone(),
        username: profile.username.clone(),
        avatar_url: profile.avatar_url(),
        settings: settings_service::default_settings(supported_guilds, &guild_ids),
        guilds,
        location: extras.location.or(old_location),
        auth,
        push_token: extras.push_token.or(old_push_token),
    };
    store.put(user.clone()).await?;

    let session = identity_service::open_session(store, &user.id).await?;
    info!(user_id = %user.id, "User created/updated and logged in");
    Ok((user, session))
}

/// Full OAuth login: code exchange, profile, guilds, upsert, session.
pub async fn login_with_code(
    store: &dyn UserStore,
    discord: &DiscordClient,
    supported_guilds: &HashSet<GuildId>,
    code: &str,
    redirect_uri: &str,
    code_verifier: Option<&str>,
    extras: LoginExtras,
) -> Result<LoginOutcome, LoginError> {
    let now = identity_service::unix_now();
    let auth = discord
        .exchange_code(code, redirect_uri, code_verifier, now)
        .await?;
    let profile = discord.fetch_profile(&auth).await?;
    let guilds = discord.fetch_guilds(&auth).await?;

    let (user, session) = upsert_discord_user(
        store,
        supported_guilds,
        &profile,
        auth,
        guilds.clone(),
        extras,
    )
    .await?;

    Ok(LoginOutcome {
        user,
        session,
        guilds,
    })
}

/// Delete everything stored about a user, sessions included.
pub async fn delete_account(store: &dyn UserStore, user_id: &str) -> Result<bool, StoreError> {
    let deleted = store.remove(user_id).await?;
    if deleted {
        info!(user_id = %user_id, "User data deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryUserStore;

    fn profile(id: &str) -> DiscordProfile {
        DiscordProfile {
            id: id.to_string(),
            username: format!("user{}", id),
            avatar: Some("hash".to_string()),
        }
    }

    fn auth() -> DiscordAuth {
        DiscordAuth {
            access_token: "at".to_string(),
            expires_in: 604800,
            refresh_token: "rt".to_string(),
            scope: "identify guilds".to_string(),
            token_type: "Bearer".to_string(),
            created_at: identity_service::unix_now(),
        }
    }

    fn guilds(ids: &[&str]) -> Vec<GuildInfo> {
        ids.iter()
            .map(|id| GuildInfo {
                id: id.to_string(),
                name: id.to_uppercase(),
                icon: None,
            })
            .collect()
    }

    fn supported() -> HashSet<GuildId> {
        ["s1", "s2"].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn first_login_creates_user_with_default_settings() {
        let store = MemoryUserStore::new();
        let (user, session) = upsert_discord_user(
            &store,
            &supported(),
            &profile("7"),
            auth(),
            guilds(&["x", "s2", "s1"]),
            LoginExtras::default(),
        )
        .await
        .unwrap();

        assert_eq!(user.settings.guild_ids, vec!["s2".to_string(), "s1".to_string()]);
        assert_eq!(
            user.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/avatars/7/hash.png")
        );
        assert_eq!(store.session_user(&session).await.unwrap(), Some("7".to_string()));
        assert_eq!(store.get("7").await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn relogin_keeps_location_and_issues_new_session() {
        let store = MemoryUserStore::new();
        let here = Location::new(37.0, -122.0, 5.0);
        let (_, first) = upsert_discord_user(
            &store,
            &supported(),
            &profile("7"),
            auth(),
            guilds(&["s1"]),
            LoginExtras {
                location: Some(here.clone()),
                push_token: Some("push".to_string()),
            },
        )
        .await
        .unwrap();

        let (user, second) = upsert_discord_user(
            &store,
            &supported(),
            &profile("7"),
            auth(),
            guilds(&["s1", "s2"]),
            LoginExtras::default(),
        )
        .await
        .unwrap();

        assert_ne!(first, second);
        assert_eq!(user.location, Some(here));
        assert_eq!(user.push_token.as_deref(), Some("push"));
        assert_eq!(user.guilds.len(), 2);
        assert_eq!(store.counts().await.unwrap(), (2, 1));
    }

    #[tokio::test]
    async fn delete_account_removes_user_and_sessions() {
        let store = MemoryUserStore::new();
        let (_, session) = upsert_discord_user(
            &store,
            &supported(),
            &profile("7"),
            auth(),
            guilds(&["s1"]),
            LoginExtras::default(),
        )
        .await
        .unwrap();

        assert!(delete_account(&store, "7").await.unwrap());
        assert!(!delete_account(&store, "7").await.unwrap());
        assert_eq!(store.get("7").await.unwrap(), None);
        assert_eq!(store.session_user(&session).await.unwrap(), None);
    }
}
