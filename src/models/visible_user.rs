use serde::Serialize;

use super::{GuildInfo, Location, UserId};

/// One entry of the peer list. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleUser {
    /// Server-side only; peers are shown by name and avatar.
    #[serde(skip_serializing)]
    pub id: UserId,
    pub name: String,
    pub avatar_url: String,
    pub location: Location,
    /// Guilds in common with the caller.
    pub common_guilds: Vec<GuildInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discord_id_stays_off_the_wire() {
        let peer = VisibleUser {
            id: "123456789012345678".to_string(),
            name: "alice".to_string(),
            avatar_url: "https://cdn.discordapp.com/embed/avatars/0.png".to_string(),
            location: Location::new(37.01, -122.01, 5.0),
            common_guilds: vec![GuildInfo {
                id: "g1".to_string(),
                name: "Guild".to_string(),
                icon: None,
            }],
        };

        let value = serde_json::to_value(&peer).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "alice",
                "avatar_url": "https://cdn.discordapp.com/embed/avatars/0.png",
                "location": {
                    "coords": { "latitude": 37.01, "longitude": -122.01 },
                    "timestamp": 5.0
                },
                "common_guilds": [{ "id": "g1", "name": "Guild", "icon": null }]
            })
        );
        assert!(!value.to_string().contains("123456789012345678"));
    }
}
