use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use thiserror::Error;
use tracing::{info, warn};

use crate::database::{StoreError, UserStore};
use crate::models::UserRecord;

pub const SESSION_COOKIE: &str = "session";
const MAX_TOKEN_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Authorization header or session cookie is required")]
    Missing,
    #[error("session token is malformed")]
    Malformed,
    #[error("session is not known")]
    Unknown,
    #[error("session has expired")]
    Expired,
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Missing => "session_missing",
            SessionError::Malformed => "session_malformed",
            SessionError::Unknown => "session_unknown",
            SessionError::Expired => "session_expired",
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// 16 random bytes, URL-safe base64 without padding.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Pull the session token from `Authorization` (raw or `Bearer <token>`),
/// falling back to the `session` cookie. The header wins when both are sent.
pub fn extract_session_token(headers: &HeaderMap) -> Result<String, SessionError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| SessionError::Malformed)?.trim_start();
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        return check_token(token);
    }

    let cookie_token = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .map(str::trim)
        .find_map(|c| c.strip_prefix("session="));

    match cookie_token {
        Some(token) => check_token(token),
        None => Err(SessionError::Missing),
    }
}

fn check_token(token: &str) -> Result<String, SessionError> {
    let well_formed = !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(token.to_string())
    } else {
        Err(SessionError::Malformed)
    }
}

/// Map a session token to its user. Expired sessions are deleted on sight.
pub async fn resolve_session(
    store: &dyn UserStore,
    token: &str,
    now: i64,
) -> Result<UserRecord, ResolveError> {
    let Some(user_id) = store.session_user(token).await? else {
        warn!("Session not found");
        return Err(SessionError::Unknown.into());
    };

    let Some(user) = store.get(&user_id).await? else {
        warn!(user_id = %user_id, "Session points at a deleted user, clearing it");
        store.remove_session(token).await?;
        return Err(SessionError::Unknown.into());
    };

    if user.auth.is_expired(now) {
        info!(user_id = %user.id, "Session expired, clearing it");
        store.remove_session(token).await?;
        return Err(SessionError::Expired.into());
    }

    Ok(user)
}

/// Create a session for `user_id` and return its token.
pub async fn open_session(store: &dyn UserStore, user_id: &str) -> Result<String, StoreError> {
    let token = new_session_token();
    store.insert_session(&token, user_id).await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryUserStore;
    use crate::models::{DiscordAuth, SharingSettings};
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn user(id: &str, created_at: i64, expires_in: i64) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: id.to_string(),
            avatar_url: None,
            guilds: vec![],
            location: None,
            settings: SharingSettings::default(),
            auth: DiscordAuth {
                access_token: "t".to_string(),
                expires_in,
                refresh_token: "r".to_string(),
                scope: "identify guilds".to_string(),
                token_type: "Bearer".to_string(),
                created_at,
            },
            push_token: None,
        }
    }

    #[test]
    fn token_from_header_or_cookie() {
        let h = headers(&[(header::AUTHORIZATION, "abc_DEF-123")]);
        assert_eq!(extract_session_token(&h), Ok("abc_DEF-123".to_string()));

        let h = headers(&[(header::AUTHORIZATION, "Bearer tok")]);
        assert_eq!(extract_session_token(&h), Ok("tok".to_string()));

        let h = headers(&[(header::COOKIE, "theme=dark; session=cookie_tok")]);
        assert_eq!(extract_session_token(&h), Ok("cookie_tok".to_string()));

        let h = headers(&[
            (header::AUTHORIZATION, "from_header"),
            (header::COOKIE, "session=from_cookie"),
        ]);
        assert_eq!(extract_session_token(&h), Ok("from_header".to_string()));
    }

    #[test]
    fn missing_and_malformed_are_distinct() {
        assert_eq!(extract_session_token(&HeaderMap::new()), Err(SessionError::Missing));

        let h = headers(&[(header::COOKIE, "theme=dark")]);
        assert_eq!(extract_session_token(&h), Err(SessionError::Missing));

        let h = headers(&[(header::AUTHORIZATION, "Bearer ")]);
        assert_eq!(extract_session_token(&h), Err(SessionError::Malformed));

        let h = headers(&[(header::COOKIE, "session=a;b")]);
        assert_eq!(extract_session_token(&h), Ok("a".to_string()));

        let h = headers(&[(header::AUTHORIZATION, "tok with spaces")]);
        assert_eq!(extract_session_token(&h), Err(SessionError::Malformed));

        let long = "x".repeat(MAX_TOKEN_LEN + 1);
        let h = headers(&[(header::AUTHORIZATION, long.as_str())]);
        assert_eq!(extract_session_token(&h), Err(SessionError::Malformed));
    }

    #[test]
    fn new_tokens_are_url_safe_and_unique() {
        let a = new_session_token();
        let b = new_session_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
        assert!(check_token(&a).is_ok());
    }

    #[tokio::test]
    async fn resolves_live_session() {
        let store = MemoryUserStore::new();
        store.put(user("1", 1_000, 100)).await.unwrap();
        let token = open_session(&store, "1").await.unwrap();

        let resolved = resolve_session(&store, &token, 1_050).await.unwrap();
        assert_eq!(resolved.id, "1");
    }

    #[tokio::test]
    async fn unknown_session() {
        let store = MemoryUserStore::new();
        let err = resolve_session(&store, "nope", 0).await.unwrap_err();
        assert!(matches!(err, ResolveError::Session(SessionError::Unknown)));
    }

    #[tokio::test]
    async fn expired_session_is_removed() {
        let store = MemoryUserStore::new();
        store.put(user("1", 1_000, 100)).await.unwrap();
        store.insert_session("old", "1").await.unwrap();

        let err = resolve_session(&store, "old", 1_101).await.unwrap_err();
        assert!(matches!(err, ResolveError::Session(SessionError::Expired)));
        assert_eq!(store.session_user("old").await.unwrap(), None);
    }

    #[tokio::test]
    async fn never_expiring_auth_does_not_overflow() {
        let store = MemoryUserStore::new();
        store.put(user("demo", unix_now(), i64::MAX)).await.unwrap();
        store.insert_session("demo", "demo").await.unwrap();
        assert!(resolve_session(&store, "demo", unix_now()).await.is_ok());
    }

    #[tokio::test]
    async fn session_of_deleted_user_is_unknown() {
        let store = MemoryUserStore::new();
        store.insert_session("dangling", "gone").await.unwrap();
        let err = resolve_session(&store, "dangling", 0).await.unwrap_err();
        assert!(matches!(err, ResolveError::Session(SessionError::Unknown)));
        assert_eq!(store.session_user("dangling").await.unwrap(), None);
    }
}
