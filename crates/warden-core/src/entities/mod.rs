//! Domain entities - core business objects

mod audit;
mod guild_settings;
mod infraction;
mod message;
mod snapshot;

pub use audit::AuditLogCandidate;
pub use guild_settings::{ChannelOverride, GuildSettings, RoleOverride};
pub use infraction::{Infraction, InfractionType, NewInfraction};
pub use message::{BufferedMessage, UNKNOWN_CONTENT};
pub use snapshot::{
    AuthorSnapshot, ChannelSnapshot, ClientSnapshot, IncomingMessage, MemberSnapshot,
    RoleSnapshot,
};
