use std::collections::HashSet;

use thiserror::Error;

use crate::database::{StoreError, UserStore};
use crate::models::{GuildId, SettingsRequest, SharingSettings, UserRecord};

pub const MAX_PRIVACY_MARGIN_METERS: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("guild {0} is not supported yet")]
    UnsupportedGuild(GuildId),
    #[error("guild {0} is not one of your guilds")]
    NotAMember(GuildId),
    #[error("privacy margin {value} for guild {guild_id} is not in [0, 10000]")]
    InvalidMargin { guild_id: GuildId, value: f64 },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedGuild(_) => "unsupported_guild",
            ValidationError::NotAMember(_) => "not_a_member",
            ValidationError::InvalidMargin { .. } => "invalid_margin",
        }
    }
}

/// Check requested settings against the allow-list and the user's actual
/// guilds. The first failing rule decides the error; within a rule the first
/// offending guild id (request order) is reported.
pub fn validate(
    candidate: &SettingsRequest,
    allowed_guilds: &HashSet<GuildId>,
    user_guilds: &HashSet<GuildId>,
) -> Result<SharingSettings, ValidationError> {
    if let Some(id) = candidate
        .guild_ids
        .iter()
        .find(|id| !allowed_guilds.contains(*id))
    {
        return Err(ValidationError::UnsupportedGuild(id.clone()));
    }

    if let Some(id) = candidate
        .guild_ids
        .iter()
        .find(|id| !user_guilds.contains(*id))
    {
        return Err(ValidationError::NotAMember(id.clone()));
    }

    if let Some(margins) = &candidate.privacy_margin {
        if let Some((guild_id, value)) = margins
            .iter()
            .find(|(_, v)| !(0.0..=MAX_PRIVACY_MARGIN_METERS).contains(*v))
        {
            return Err(ValidationError::InvalidMargin {
                guild_id: guild_id.clone(),
                value: *value,
            });
        }
    }

    let mut seen = HashSet::new();
    let guild_ids = candidate
        .guild_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    Ok(SharingSettings { guild_ids })
}

/// Settings given to a user at login: every supported guild they are in.
pub fn default_settings(
    allowed_guilds: &HashSet<GuildId>,
    user_guilds: &[GuildId],
) -> SharingSettings {
    let mut seen = HashSet::new();
    let guild_ids = user_guilds
        .iter()
        .filter(|id| allowed_guilds.contains(*id))
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    SharingSettings { guild_ids }
}

#[derive(Debug, Error)]
pub enum ApplySettingsError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate and store new settings for `user` in one write.
pub async fn apply_settings(
    store: &dyn UserStore,
    user: &UserRecord,
    request: &SettingsRequest,
    allowed_guilds: &HashSet<GuildId>,
) -> Result<SharingSettings, ApplySettingsError> {
    let user_guilds: HashSet<GuildId> = user.guild_ids().cloned().collect();
    let settings = validate(request, allowed_guilds, &user_guilds)?;
    store.set_settings(&user.id, settings.clone()).await?;
    Ok(settings)
}
