//! [`ChatPlatform`] over serenity's HTTP client and cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::builder::{CreateMessage, EditMessage};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::guild::audit_log::{Action, MessageAction};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use tracing::{debug, instrument};
use warden_core::entities::{AuditLogCandidate, IncomingMessage, MemberSnapshot};
use warden_core::error::DomainError;
use warden_core::value_objects::Snowflake;
use warden_service::{ChatPlatform, PlatformResult, SentMessage};

use super::convert::{snowflake, RoleTable};

const NOT_FOUND: u16 = 404;

fn platform_error(err: serenity::Error) -> DomainError {
    DomainError::PlatformError(err.to_string())
}

fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(e) if e.status_code().map(|s| s.as_u16()) == Some(NOT_FOUND)
    )
}

fn sent(message: &Message) -> SentMessage {
    SentMessage {
        id: snowflake(message.id),
        channel_id: snowflake(message.channel_id),
        created_at: snowflake(message.id).created_at(),
    }
}

#[inline]
fn channel(id: Snowflake) -> ChannelId {
    ChannelId::new(id.get())
}

#[inline]
fn message(id: Snowflake) -> MessageId {
    MessageId::new(id.get())
}

/// The live platform client
pub struct SerenityPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
    /// Last heartbeat round trip reported by the shard runner
    latency: Mutex<Option<Duration>>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache, latency: Mutex::new(None) }
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Roles of a guild, from the cache or else over HTTP
    async fn role_table(&self, guild_id: GuildId) -> PlatformResult<RoleTable> {
        let cached = self.cache.guild(guild_id).map(|guild| RoleTable::from_guild(&guild));
        if let Some(table) = cached {
            return Ok(table);
        }

        let guild = guild_id
            .to_partial_guild(&*self.http)
            .await
            .map_err(platform_error)?;
        Ok(RoleTable::from_roles(guild.id, guild.owner_id, guild.roles.values()))
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn reply(&self, to: &IncomingMessage, content: &str) -> PlatformResult<SentMessage> {
        let channel_id = channel(to.channel_id());
        let builder = CreateMessage::new()
            .content(content)
            .reference_message((channel_id, message(to.id)));

        match channel_id.send_message(&*self.http, builder).await {
            Ok(reply) => Ok(sent(&reply)),
            Err(e) => {
                debug!(message_id = %to.id, error = %e, "Reply failed, sending plainly");
                self.send(to.channel_id(), content).await
            }
        }
    }

    async fn send(&self, channel_id: Snowflake, content: &str) -> PlatformResult<SentMessage> {
        let message = channel(channel_id)
            .send_message(&*self.http, CreateMessage::new().content(content))
            .await
            .map_err(platform_error)?;
        Ok(sent(&message))
    }

    async fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<SentMessage> {
        let edited = channel(channel_id)
            .edit_message(&*self.http, message(message_id), EditMessage::new().content(content))
            .await
            .map_err(platform_error)?;
        Ok(sent(&edited))
    }

    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> PlatformResult<()> {
        channel(channel_id)
            .delete_message(&*self.http, message(message_id))
            .await
            .map_err(platform_error)
    }

    async fn send_direct(&self, user_id: Snowflake, content: &str) -> PlatformResult<()> {
        UserId::new(user_id.get())
            .direct_message(&*self.http, CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    #[instrument(skip(self))]
    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> PlatformResult<Option<MemberSnapshot>> {
        let guild = GuildId::new(guild_id.get());
        let member = match guild.member(&*self.http, UserId::new(user_id.get())).await {
            Ok(member) => member,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(platform_error(e)),
        };

        let roles: Vec<Snowflake> = member.roles.iter().map(|&id| snowflake(id)).collect();
        let table = self.role_table(guild).await?;
        Ok(Some(table.member(user_id, &roles, None)))
    }

    #[instrument(skip(self))]
    async fn latest_message_delete_entry(
        &self,
        guild_id: Snowflake,
    ) -> PlatformResult<Option<AuditLogCandidate>> {
        let logs = GuildId::new(guild_id.get())
            .audit_logs(
                &*self.http,
                Some(Action::Message(MessageAction::Delete)),
                None,
                None,
                Some(1),
            )
            .await
            .map_err(platform_error)?;

        let candidate = logs.entries.into_iter().next().and_then(|entry| {
            let options = entry.options?;
            Some(AuditLogCandidate {
                executor_id: snowflake(entry.user_id),
                target_id: snowflake(entry.target_id?),
                channel_id: snowflake(options.channel_id?),
                created_at: snowflake(entry.id).created_at(),
                count: options
                    .count
                    .map_or(1, |count| u32::try_from(count).unwrap_or(u32::MAX)),
            })
        });
        Ok(candidate)
    }

    fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }
}

impl std::fmt::Debug for SerenityPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityPlatform")
            .field("latency", &*self.latency.lock())
            .finish_non_exhaustive()
    }
}
