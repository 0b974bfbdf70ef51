use crate::database::StoreError;

use super::{Coords, DiscordAuth, GuildInfo, Location, SharingSettings, UserRecord};

// Storage row for `users`. Guilds, settings and auth live in JSON columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub guilds: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_timestamp: Option<f64>,
    pub location_mocked: Option<bool>,
    pub settings: String,
    pub auth: String,
    pub push_token: Option<String>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            user_id: row.user_id.clone(),
            reason,
        };

        let guilds: Vec<GuildInfo> = serde_json::from_str(&row.guilds)
            .map_err(|e| corrupt(format!("guilds column: {}", e)))?;
        let settings: SharingSettings = serde_json::from_str(&row.settings)
            .map_err(|e| corrupt(format!("settings column: {}", e)))?;
        let auth: DiscordAuth = serde_json::from_str(&row.auth)
            .map_err(|e| corrupt(format!("auth column: {}", e)))?;

        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(Location {
                coords: Coords::new(latitude, longitude),
                timestamp: row.location_timestamp.unwrap_or(0.0),
                mocked: row.location_mocked,
            }),
            (None, None) => None,
            _ => return Err(corrupt("half of a coordinate pair is NULL".to_string())),
        };

        Ok(UserRecord {
            id: row.user_id,
            username: row.username,
            avatar_url: row.avatar_url,
            guilds,
            location,
            settings,
            auth,
            push_token: row.push_token,
        })
    }
}

impl TryFrom<&UserRecord> for UserRow {
    type Error = StoreError;

    fn try_from(user: &UserRecord) -> Result<Self, Self::Error> {
        Ok(UserRow {
            user_id: user.id.clone(),
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
            guilds: serde_json::to_string(&user.guilds)?,
            latitude: user.location.as_ref().map(|l| l.coords.latitude),
            longitude: user.location.as_ref().map(|l| l.coords.longitude),
            location_timestamp: user.location.as_ref().map(|l| l.timestamp),
            location_mocked: user.location.as_ref().and_then(|l| l.mocked),
            settings: serde_json::to_string(&user.settings)?,
            auth: serde_json::to_string(&user.auth)?,
            push_token: user.push_token.clone(),
        })
    }
}
