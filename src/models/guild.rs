use serde::{Deserialize, Serialize};

pub type GuildId = String;

/// Guild info from Discord's `/users/@me/guilds`. Only id, name and icon are
/// kept; everything else Discord sends is dropped on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}
