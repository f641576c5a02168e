//! Traits (ports) implemented by infrastructure crates

mod repositories;

pub use repositories::{
    GuildSettingsRepository, InfractionRepository, MessageRepository, RepoResult, StoreHealth,
};
