//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, the database crate provides the
//! PostgreSQL implementation and tests substitute in-memory ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{BufferedMessage, GuildSettings, Infraction, NewInfraction};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Settings Repository
// ============================================================================

#[async_trait]
pub trait GuildSettingsRepository: Send + Sync {
    /// Find the settings record for a guild
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildSettings>>;

    /// Insert the default record unless one exists, then return the stored record
    ///
    /// Concurrent calls for the same id must leave exactly one record behind.
    async fn create_default(&self, id: Snowflake) -> RepoResult<GuildSettings>;

    /// Persist every field of an existing record
    async fn update(&self, settings: &GuildSettings) -> RepoResult<()>;
}

// ============================================================================
// Message Repository
// ============================================================================

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a stored message by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>>;

    /// Insert or overwrite a batch of messages atomically, returns rows written
    async fn upsert_many(&self, messages: &[BufferedMessage]) -> RepoResult<u64>;

    /// Flag a stored message as deleted, returns the updated row
    async fn mark_deleted(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>>;

    /// Flag every stored message in `ids` as deleted, returns the updated rows
    async fn mark_many_deleted(&self, ids: &[Snowflake]) -> RepoResult<Vec<BufferedMessage>>;

    /// Replace the content of a stored message
    ///
    /// Returns `None` when the message is unknown or had no content.
    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Option<String>>;

    /// Flag up to `limit` of an author's newest messages in a channel as deleted
    ///
    /// Only messages created after `since` that are not deleted yet are touched.
    async fn mark_recent_deleted_by_author(
        &self,
        author_id: Snowflake,
        channel_id: Snowflake,
        since: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<BufferedMessage>>;

    /// Remove messages created at or before `cutoff`, returns rows removed
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;
}

// ============================================================================
// Infraction Repository
// ============================================================================

#[async_trait]
pub trait InfractionRepository: Send + Sync {
    /// Store an infraction and return it with its assigned id
    async fn create(&self, infraction: &NewInfraction) -> RepoResult<Infraction>;

    /// Find an infraction in a guild by id
    async fn find_by_id(&self, guild_id: Snowflake, id: i64) -> RepoResult<Option<Infraction>>;

    /// List a user's infractions in a guild, newest first
    async fn find_by_user(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<Infraction>>;

    /// Delete an infraction, returns false if it did not exist
    async fn delete(&self, guild_id: Snowflake, id: i64) -> RepoResult<bool>;
}

// ============================================================================
// Health
// ============================================================================

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip a trivial query
    async fn ping(&self) -> RepoResult<()>;
}
