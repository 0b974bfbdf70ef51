pub mod account_service;
pub mod demo_service;
pub mod discord_service;
pub mod geo_service;
pub mod identity_service;
pub mod settings_service;
pub mod visibility_service;
