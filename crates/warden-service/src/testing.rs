//! Test doubles for the service layer
//!
//! [`RecordingPlatform`] stands in for the chat platform and records every
//! outbound call; [`TestServices`] wires a [`ServiceContext`] over the
//! in-memory repositories from `warden-cache`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use warden_cache::testing::{
    incoming_message, InMemoryGuildSettingsRepository, InMemoryInfractionRepository,
    InMemoryMessageRepository, InMemoryStoreHealth,
};
use warden_cache::{AuditCorrelator, GuildSettingsCache, MessageBuffer};
use warden_common::GlobalConfig;
use warden_core::entities::{AuditLogCandidate, IncomingMessage, MemberSnapshot, RoleSnapshot};
use warden_core::error::DomainError;
use warden_core::value_objects::{Permissions, Snowflake};

use crate::commands::{CommandContext, CommandRegistry};
use crate::platform::{ChatPlatform, PlatformResult, SentMessage};
use crate::services::ServiceContext;

pub const BOT_ID: i64 = 1;
pub const GUILD_ID: i64 = 300_000_000_000_000_001;
pub const CHANNEL_ID: i64 = 400_000_000_000_000_001;
pub const MEMBER_ID: i64 = 200_000_000_000_000_001;
pub const TARGET_ID: i64 = 200_000_000_000_000_002;
pub const DEVELOPER_ID: i64 = 100_000_000_000_000_001;

const TEST_CONFIG: &str = r#"
database:
  messages:
    insert_cron: "*/5 * * * *"
    delete_cron: "0 0 * * *"
developers:
  - "100000000000000001"
"#;

/// Configuration with [`DEVELOPER_ID`] on the developer allow-list
pub fn test_config() -> GlobalConfig {
    GlobalConfig::from_yaml_str(TEST_CONFIG).expect("test configuration is valid")
}

/// A guild member holding `roles` as `(id, position)` pairs, able to read and
/// write in the invocation channel
pub fn member(user_id: i64, roles: &[(i64, i32)]) -> MemberSnapshot {
    MemberSnapshot {
        user_id: Snowflake::new(user_id),
        roles: roles
            .iter()
            .map(|&(id, position)| RoleSnapshot { id: Snowflake::new(id), position })
            .collect(),
        is_owner: false,
        is_administrator: false,
        channel_permissions: Some(Permissions::RESPOND),
    }
}

/// A message in [`CHANNEL_ID`] of [`GUILD_ID`] from a member without roles
pub fn guild_message(id: i64, author_id: i64, content: &str) -> IncomingMessage {
    let mut message = incoming_message(id, Some(GUILD_ID), CHANNEL_ID, author_id, content);
    message.client.user_id = Snowflake::new(BOT_ID);
    message.member = Some(member(author_id, &[]));
    message
}

/// A direct message to the bot
pub fn direct_message(id: i64, author_id: i64, content: &str) -> IncomingMessage {
    let mut message = incoming_message(id, None, CHANNEL_ID, author_id, content);
    message.client.user_id = Snowflake::new(BOT_ID);
    message
}

// ============================================================================
// Recording platform
// ============================================================================

/// An outbound platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Reply { to: Snowflake, content: String },
    Send { channel_id: Snowflake, content: String },
    Edit { message_id: Snowflake, content: String },
    Delete { channel_id: Snowflake, message_id: Snowflake },
    Direct { user_id: Snowflake, content: String },
}

#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    next_id: AtomicI64,
    members: Mutex<HashMap<(Snowflake, Snowflake), MemberSnapshot>>,
    audit_entry: Mutex<Option<AuditLogCandidate>>,
    latency: Mutex<Option<Duration>>,
    fail_replies: AtomicBool,
    fail_deletes: AtomicBool,
    fail_direct: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(900_000_000_000_000_000),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    /// Content of every reply and plain send, in order
    pub fn messages(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Reply { content, .. } | PlatformCall::Send { content, .. } => {
                    Some(content.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Ids of every deleted message, in order
    pub fn deleted(&self) -> Vec<Snowflake> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Delete { message_id, .. } => Some(*message_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Make `member` resolvable in `guild_id`
    pub fn add_member(&self, guild_id: i64, member: MemberSnapshot) {
        self.members
            .lock()
            .insert((Snowflake::new(guild_id), member.user_id), member);
    }

    pub fn set_audit_entry(&self, entry: Option<AuditLogCandidate>) {
        *self.audit_entry.lock() = entry;
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Fail replies, sends and edits
    pub fn fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_direct(&self, fail: bool) {
        self.fail_direct.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }

    fn sent(&self, channel_id: Snowflake) -> PlatformResult<SentMessage> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(DomainError::PlatformError("injected send failure".to_string()));
        }
        Ok(SentMessage {
            id: Snowflake::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            channel_id,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn reply(&self, to: &IncomingMessage, content: &str) -> PlatformResult<SentMessage> {
        let sent = self.sent(to.channel_id())?;
        self.record(PlatformCall::Reply { to: to.id, content: content.to_string() });
        Ok(sent)
    }

    async fn send(&self, channel_id: Snowflake, content: &str) -> PlatformResult<SentMessage> {
        let sent = self.sent(channel_id)?;
        self.record(PlatformCall::Send { channel_id, content: content.to_string() });
        Ok(sent)
    }

    async fn edit(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> PlatformResult<SentMessage> {
        let mut sent = self.sent(channel_id)?;
        sent.id = message_id;
        self.record(PlatformCall::Edit { message_id, content: content.to_string() });
        Ok(sent)
    }

    async fn delete_message(&self, channel_id: Snowflake, message_id: Snowflake) -> PlatformResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DomainError::PlatformError("injected delete failure".to_string()));
        }
        self.record(PlatformCall::Delete { channel_id, message_id });
        Ok(())
    }

    async fn send_direct(&self, user_id: Snowflake, content: &str) -> PlatformResult<()> {
        if self.fail_direct.load(Ordering::SeqCst) {
            return Err(DomainError::PlatformError("cannot message this user".to_string()));
        }
        self.record(PlatformCall::Direct { user_id, content: content.to_string() });
        Ok(())
    }

    async fn fetch_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> PlatformResult<Option<MemberSnapshot>> {
        Ok(self.members.lock().get(&(guild_id, user_id)).cloned())
    }

    async fn latest_message_delete_entry(
        &self,
        _guild_id: Snowflake,
    ) -> PlatformResult<Option<AuditLogCandidate>> {
        Ok(*self.audit_entry.lock())
    }

    fn latency(&self) -> Option<Duration> {
        *self.latency.lock()
    }
}

// ============================================================================
// Service context
// ============================================================================

/// A [`ServiceContext`] over in-memory storage, with handles to every double
pub struct TestServices {
    pub services: ServiceContext,
    pub platform: Arc<RecordingPlatform>,
    pub guild_repo: Arc<InMemoryGuildSettingsRepository>,
    pub message_repo: Arc<InMemoryMessageRepository>,
    pub infraction_repo: Arc<InMemoryInfractionRepository>,
    pub store_health: Arc<InMemoryStoreHealth>,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GlobalConfig) -> Self {
        let platform = Arc::new(RecordingPlatform::new());
        let guild_repo = Arc::new(InMemoryGuildSettingsRepository::new());
        let message_repo = Arc::new(InMemoryMessageRepository::new());
        let infraction_repo = Arc::new(InMemoryInfractionRepository::new());
        let store_health = Arc::new(InMemoryStoreHealth::new());

        let services = ServiceContext::builder()
            .config(Arc::new(config))
            .guilds(Arc::new(GuildSettingsCache::new(guild_repo.clone())))
            .messages(Arc::new(MessageBuffer::new(message_repo.clone())))
            .audit(Arc::new(AuditCorrelator::new()))
            .infraction_repo(infraction_repo.clone())
            .store_health(store_health.clone())
            .platform(platform.clone())
            .build()
            .expect("every dependency is provided");

        Self { services, platform, guild_repo, message_repo, infraction_repo, store_health }
    }

    /// Context for running a command body directly, with fresh guild settings
    pub async fn command_context(&self, message: IncomingMessage, command_name: &str) -> CommandContext {
        let settings = match message.guild_id {
            Some(guild_id) => Some(
                self.services
                    .guilds()
                    .get(guild_id)
                    .await
                    .expect("guild settings are readable"),
            ),
            None => None,
        };

        CommandContext {
            message: Arc::new(message),
            settings,
            command_name: command_name.to_string(),
            prefix: ">".to_string(),
            services: self.services.clone(),
            registry: Arc::new(CommandRegistry::with_builtins()),
        }
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}
