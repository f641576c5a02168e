//! # warden-core
//!
//! Domain layer containing entities, value objects, repository traits, and gateway events.
//! This crate has zero dependencies on infrastructure (database, platform client, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    AuditLogCandidate, AuthorSnapshot, BufferedMessage, ChannelOverride, ChannelSnapshot,
    ClientSnapshot, GuildSettings, IncomingMessage, Infraction, InfractionType, MemberSnapshot,
    NewInfraction, RoleOverride, RoleSnapshot, UNKNOWN_CONTENT,
};
pub use error::DomainError;
pub use events::GatewayEvent;
pub use traits::{
    GuildSettingsRepository, InfractionRepository, MessageRepository, RepoResult, StoreHealth,
};
pub use value_objects::{Permissions, Snowflake, SnowflakeParseError};
