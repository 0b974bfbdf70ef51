//! Demo accounts for store reviewers: two users in the demo guild near
//! Cupertino, and a never-expiring `demo` session for the first one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::DEMO_GUILD_ID;
use crate::database::{StoreError, UserStore};
use crate::models::{DiscordAuth, GuildInfo, Location, SharingSettings, UserRecord};
use crate::services::identity_service;

pub const DEMO_SESSION: &str = "demo";
const DEMO_CENTER: (f64, f64) = (37.33182, -122.03118);
const DEMO_SPREAD_DEGREES: f64 = 0.05;

pub fn demo_guild() -> GuildInfo {
    GuildInfo {
        id: DEMO_GUILD_ID.to_string(),
        name: "Demo Guild".to_string(),
        icon: None,
    }
}

/// Same id, same position: the offset is seeded from the id.
pub fn demo_user(name: &str, id: &str) -> UserRecord {
    let mut rng = ChaCha8Rng::seed_from_u64(seed_for(id));
    let dlat = rng.gen_range(-DEMO_SPREAD_DEGREES..=DEMO_SPREAD_DEGREES);
    let dlon = rng.gen_range(-DEMO_SPREAD_DEGREES..=DEMO_SPREAD_DEGREES);

    UserRecord {
        id: id.to_string(),
        username: name.to_string(),
        avatar_url: Some(format!("https://cdn.discordapp.com/embed/avatars/{}.png", id)),
        guilds: vec![demo_guild()],
        location: Some(Location::new(
            DEMO_CENTER.0 + dlat,
            DEMO_CENTER.1 + dlon,
            0.0,
        )),
        settings: SharingSettings {
            guild_ids: vec![DEMO_GUILD_ID.to_string()],
        },
        auth: DiscordAuth {
            access_token: "demo".to_string(),
            expires_in: i64::MAX,
            refresh_token: "demo".to_string(),
            scope: "demo".to_string(),
            token_type: "demo".to_string(),
            created_at: identity_service::unix_now(),
        },
        push_token: None,
    }
}

pub async fn seed_demo_users(store: &dyn UserStore) -> Result<(), StoreError> {
    store.put(demo_user("Demo User", "1")).await?;
    store.put(demo_user("Demo User 2", "2")).await?;
    store.insert_session(DEMO_SESSION, "1").await?;
    info!("Demo users seeded");
    Ok(())
}

// FNV-1a over "demo" + id.
fn seed_for(id: &str) -> u64 {
    "demo"
        .bytes()
        .chain(id.bytes())
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryUserStore;

    #[test]
    fn demo_positions_are_stable_and_nearby() {
        let a = demo_user("Demo User", "1");
        let b = demo_user("Demo User", "1");
        assert_eq!(a.location, b.location);

        let loc = a.location.unwrap().coords;
        assert!((loc.latitude - DEMO_CENTER.0).abs() <= DEMO_SPREAD_DEGREES);
        assert!((loc.longitude - DEMO_CENTER.1).abs() <= DEMO_SPREAD_DEGREES);

        let other = demo_user("Demo User 2", "2").location.unwrap().coords;
        assert_ne!(loc, other);
    }

    #[tokio::test]
    async fn seeding_opens_demo_session() {
        let store = MemoryUserStore::new();
        seed_demo_users(&store).await.unwrap();
        seed_demo_users(&store).await.unwrap();

        assert_eq!(store.counts().await.unwrap(), (1, 2));
        let user = identity_service::resolve_session(&store, DEMO_SESSION, identity_service::unix_now())
            .await
            .unwrap();
        assert_eq!(user.id, "1");
    }
}
