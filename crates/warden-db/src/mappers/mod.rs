//! Entity to model mappers
//!
//! Conversions between domain entities (warden-core) and database models.
//! - `From`/`TryFrom<Model> for Entity`: Convert database rows to domain objects;
//!   the fallible ones reject rows that do not decode
//! - `*Update`/`*Columns` structs: Prepare entity data for database operations

mod guild_settings;
mod infraction;
mod message;

pub use guild_settings::GuildSettingsUpdate;
pub use message::MessageColumns;
