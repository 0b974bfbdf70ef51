pub mod guild;
pub mod location;
pub mod settings;
pub mod user;
pub mod user_row;
pub mod visible_user;

pub use guild::{GuildId, GuildInfo};
pub use location::{Coords, Location, LocationError};
pub use settings::{SettingsRequest, SharingSettings};
pub use user::{DiscordAuth, UserId, UserRecord};
pub use user_row::UserRow;
pub use visible_user::VisibleUser;
