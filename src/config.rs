use std::{collections::HashSet, env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::GuildId;

pub const DEMO_GUILD_ID: &str = "0000000000000000000";

// Guilds supported during the beta.
const DEFAULT_SUPPORTED_GUILDS: &[&str] = &[
    "1014436790251290624", // agents of change
    "982436897571881061",  // atlas fellows
    DEMO_GUILD_ID,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub base_url: String,
    pub discord_client_id: String,
    pub discord_client_secret: String,
    pub discord_api_url: String,
    pub mobile_redirect_uri: String,
    pub supported_guilds: HashSet<GuildId>,
    pub seed_demo_users: bool,
    pub static_dir: String,
    pub privacy_policy_path: String,
    pub support_email: String,
}

impl Config {
    /// Defaults for everything except the Discord credentials.
    pub fn new(discord_client_id: impl Into<String>, discord_client_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_url: "sqlite://miniworld.db".to_string(),
            base_url: "http://localhost:8000".to_string(),
            discord_client_id: discord_client_id.into(),
            discord_client_secret: discord_client_secret.into(),
            discord_api_url: "https://discord.com/api".to_string(),
            mobile_redirect_uri: "com.ulirocks.miniworld://redirect".to_string(),
            supported_guilds: DEFAULT_SUPPORTED_GUILDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            seed_demo_users: true,
            static_dir: "static".to_string(),
            privacy_policy_path: "privacy-policy.txt".to_string(),
            support_email: "uli@miniworld.app".to_string(),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::new(
            require("DISCORD_CLIENT_ID")?,
            require("DISCORD_CLIENT_SECRET")?,
        );

        let supported_guilds = match var("SUPPORTED_GUILDS") {
            Ok(raw) => parse_guild_list(&raw),
            Err(()) => defaults.supported_guilds.clone(),
        };

        Ok(Self {
            host: try_load("HOST", &defaults.host),
            port: try_load("PORT", &defaults.port.to_string()),
            database_url: try_load("DATABASE_URL", &defaults.database_url),
            base_url: try_load::<String>("BASE_URL", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            discord_api_url: try_load::<String>("DISCORD_API_URL", &defaults.discord_api_url)
                .trim_end_matches('/')
                .to_string(),
            mobile_redirect_uri: try_load("DISCORD_MOBILE_REDIRECT_URI", &defaults.mobile_redirect_uri),
            supported_guilds,
            seed_demo_users: try_load("SEED_DEMO_USERS", "true"),
            static_dir: try_load("STATIC_DIR", &defaults.static_dir),
            privacy_policy_path: try_load("PRIVACY_POLICY_PATH", &defaults.privacy_policy_path),
            support_email: try_load("SUPPORT_EMAIL", &defaults.support_email),
            ..defaults
        })
    }

    pub fn web_redirect_uri(&self) -> String {
        format!("{}/discord-callback", self.base_url)
    }

    /// `DATABASE_URL=memory` keeps everything in process memory.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.eq_ignore_ascii_case("memory")
    }
}

pub fn parse_guild_list(raw: &str) -> HashSet<GuildId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| ())
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid {key} value ({e}), using default: {default}");
            parse_default(key, default)
        }
    }
}

fn parse_default<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(v) => v,
        // Defaults are literals in this file; a failure here is a bug.
        Err(e) => panic!("default for {key} does not parse: {e}"),
    }
}
