use serde::{Deserialize, Serialize};

use super::{GuildId, GuildInfo, Location, SharingSettings};

pub type UserId = String;

pub const DEFAULT_AVATAR_URL: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

/// Discord OAuth token response, stamped with the time we received it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordAuth {
    pub access_token: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
    pub created_at: i64,
}

impl DiscordAuth {
    pub fn expires_at(&self) -> i64 {
        self.created_at.saturating_add(self.expires_in)
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at() < now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
    pub guilds: Vec<GuildInfo>,
    pub location: Option<Location>,
    pub settings: SharingSettings,
    pub auth: DiscordAuth,
    pub push_token: Option<String>,
}

impl UserRecord {
    pub fn guild_ids(&self) -> impl Iterator<Item = &GuildId> {
        self.guilds.iter().map(|g| &g.id)
    }

    pub fn avatar_url_or_default(&self) -> String {
        self.avatar_url
            .clone()
            .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string())
    }
}
