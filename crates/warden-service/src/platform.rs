//! Outbound port to the chat platform
//!
//! Commands and listeners talk to the platform only through [`ChatPlatform`],
//! the gateway crate provides the real client and tests a recording double.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_core::entities::{AuditLogCandidate, IncomingMessage, MemberSnapshot};
use warden_core::error::DomainError;
use warden_core::value_objects::Snowflake;

/// Result type for platform calls
pub type PlatformResult<T> = Result<T, DomainError>;

/// A message the bot sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Reply to a message, sending plainly into its channel if the reply fails
    async fn reply(&self, to: &IncomingMessage, content: &str) -> PlatformResult<SentMessage>;

    /// Send a message to a channel
    async fn send(&self, channel_id: Snowflake, content: &str) -> PlatformResult<SentMessage>;

    /// Edit a message the bot sent
    async fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<SentMessage>;

    /// Delete a message
    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake)
        -> PlatformResult<()>;

    /// Direct message a user
    async fn send_direct(&self, user_id: Snowflake, content: &str) -> PlatformResult<()>;

    /// Resolve a guild member, `None` if the user is not in the guild
    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> PlatformResult<Option<MemberSnapshot>>;

    /// Newest message-delete entry of the guild's audit log
    async fn latest_message_delete_entry(
        &self,
        guild_id: Snowflake,
    ) -> PlatformResult<Option<AuditLogCandidate>>;

    /// Gateway heartbeat latency, if measured yet
    fn latency(&self) -> Option<Duration>;
}
