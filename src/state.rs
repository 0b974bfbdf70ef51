use std::sync::Arc;

use crate::config::Config;
use crate::database::UserStore;
use crate::services::discord_service::DiscordClient;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<Config>,
    pub discord: DiscordClient,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Self {
        let discord = DiscordClient::new(
            &config.discord_api_url,
            &config.discord_client_id,
            &config.discord_client_secret,
        );
        Self {
            store,
            config: Arc::new(config),
            discord,
        }
    }
}
