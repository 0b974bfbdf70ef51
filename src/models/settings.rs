use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::GuildId;

/// Stored sharing settings. Every id is a supported guild the user is in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingSettings {
    pub guild_ids: Vec<GuildId>,
}

/// Body of `POST /settings`. `privacy_margin` is the legacy per-guild radius
/// (meters); it is range-checked and then discarded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsRequest {
    pub guild_ids: Vec<GuildId>,
    #[serde(default)]
    pub privacy_margin: Option<BTreeMap<GuildId, f64>>,
}
