//! Repository implementations

mod error;
mod guild_settings;
mod health;
mod infraction;
mod message;

pub use error::{guild_settings_not_found, map_db_error};
pub use guild_settings::PgGuildSettingsRepository;
pub use health::PgStoreHealth;
pub use infraction::PgInfractionRepository;
pub use message::PgMessageRepository;
