//! # warden-cache
//!
//! In-process state shared by the whole bot: guild settings, the message
//! write-back buffer, audit log correlation and the job scheduler.
//!
//! ## Features
//!
//! - **GuildSettingsCache**: Lazily created per guild settings, invalidated on every write
//! - **MessageBuffer**: New messages held in memory and flushed to the database in batches
//! - **AuditCorrelator**: Attributes message deletions to moderators
//! - **Scheduler**: Named cron jobs with skip-if-running ticks
//!
//! ## Example
//!
//! ```ignore
//! use warden_cache::{GuildSettingsCache, MessageBuffer, Scheduler};
//!
//! let scheduler = Scheduler::new();
//! let guilds = Arc::new(GuildSettingsCache::new(guild_repo));
//! let buffer = Arc::new(MessageBuffer::new(message_repo));
//!
//! guilds.start_eviction_schedule(&scheduler, &config.database.config_cache_delete_cron)?;
//! buffer.start_periodic_flush(&scheduler, &insert_cron, &delete_cron, ttl)?;
//!
//! let settings = guilds.get(guild_id).await?;
//! ```

pub mod audit;
pub mod content;
pub mod guild_cache;
pub mod message_buffer;
pub mod scheduler;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use audit::{AuditCorrelator, FRESH_ENTRY_WINDOW_MS};
pub use content::{clean_content, serialize_message};
pub use guild_cache::GuildSettingsCache;
pub use message_buffer::{MessageBuffer, MAX_PURGE_PERIOD_MS};
pub use scheduler::{
    Scheduler, SchedulerError, DELETE_GUILD_CACHE, DELETE_OLD_MESSAGES, STORE_NEW_MESSAGES,
};
