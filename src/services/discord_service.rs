use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{DiscordAuth, GuildInfo};

const OAUTH_SCOPE: &str = "identify guilds";

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Discord {endpoint} error: {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("Discord unreachable: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: String,
    scope: String,
    token_type: String,
}

/// `/users/@me`. `avatar` is the avatar hash, absent for default avatars.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl DiscordProfile {
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash))
    }
}

/// Thin OAuth2 client for the two login flows.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_url: String,
    client_id: String,
    client_secret: String,
}

impl DiscordClient {
    pub fn new(api_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    /// Browser authorize URL; `state` round-trips through Discord untouched.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        let base = format!("{}/oauth2/authorize", self.api_url);
        let mut url = match reqwest::Url::parse(&base) {
            Ok(url) => url,
            Err(_) => return base,
        };
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", OAUTH_SCOPE)
            .append_pair("state", state);
        url.to_string()
    }

    /// Exchange an authorization code. `code_verifier` is set by the mobile
    /// PKCE flow only.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
        now: i64,
    ) -> Result<DiscordAuth, DiscordError> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("scope", OAUTH_SCOPE),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier", verifier));
        }

        let resp = self
            .http
            .post(format!("{}/oauth2/token", self.api_url))
            .form(&form)
            .send()
            .await?;
        let token: TokenResponse = read_json(resp, "oauth2/token").await?;

        Ok(DiscordAuth {
            access_token: token.access_token,
            expires_in: token.expires_in,
            refresh_token: token.refresh_token,
            scope: token.scope,
            token_type: token.token_type,
            created_at: now,
        })
    }

    pub async fn fetch_profile(&self, auth: &DiscordAuth) -> Result<DiscordProfile, DiscordError> {
        let resp = self
            .http
            .get(format!("{}/users/@me", self.api_url))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", auth.token_type, auth.access_token),
            )
            .send()
            .await?;
        read_json(resp, "users/@me").await
    }

    pub async fn fetch_guilds(&self, auth: &DiscordAuth) -> Result<Vec<GuildInfo>, DiscordError> {
        let resp = self
            .http
            .get(format!("{}/users/@me/guilds", self.api_url))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", auth.token_type, auth.access_token),
            )
            .send()
            .await?;
        read_json(resp, "users/@me/guilds").await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
    endpoint: &'static str,
) -> Result<T, DiscordError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "Discord {} failed", endpoint);
        return Err(DiscordError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let client = DiscordClient::new("https://discord.com/api", "123", "s3cret");
        let url = client.authorize_url("http://localhost:8000/discord-callback", "/delete_data");
        assert!(url.starts_with("https://discord.com/api/oauth2/authorize?"));
        assert!(url.contains("client_id=123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fdiscord-callback"));
        assert!(url.contains("scope=identify+guilds"));
        assert!(url.contains("state=%2Fdelete_data"));
        assert!(!url.contains("s3cret"));
    }

    #[test]
    fn authorize_url_for_custom_api_base() {
        let client = DiscordClient::new("http://127.0.0.1:9000/api/", "1", "s");
        let url = client.authorize_url("x", "");
        assert!(url.starts_with("http://127.0.0.1:9000/api/oauth2/authorize?"));
    }

    #[test]
    fn avatar_url_only_with_hash() {
        let with = DiscordProfile {
            id: "42".to_string(),
            username: "u".to_string(),
            avatar: Some("abc".to_string()),
        };
        assert_eq!(
            with.avatar_url().as_deref(),
            Some("https://cdn.discordapp.com/avatars/42/abc.png")
        );
        let without = DiscordProfile { avatar: None, ..with };
        assert_eq!(without.avatar_url(), None);
    }

    #[test]
    fn guild_payload_ignores_extra_fields() {
        let raw = r#"[{"id":"1","name":"One","icon":null,"owner":false,"permissions":"0","features":[]}]"#;
        let guilds: Vec<GuildInfo> = serde_json::from_str(raw).unwrap();
        assert_eq!(guilds[0].id, "1");
        assert_eq!(guilds[0].icon, None);
    }
}
