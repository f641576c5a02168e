//! Database models - SQLx-compatible structs for PostgreSQL tables

mod guild_settings;
mod infraction;
mod message;

pub use guild_settings::GuildSettingsModel;
pub use infraction::InfractionModel;
pub use message::MessageModel;
