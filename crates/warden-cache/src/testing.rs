//! In-memory repository doubles with call counters
//!
//! Compiled for unit tests and behind the `testing` feature for other crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;
use warden_core::entities::{
    AuthorSnapshot, BufferedMessage, ChannelSnapshot, ClientSnapshot, GuildSettings,
    IncomingMessage, Infraction, NewInfraction,
};
use warden_core::error::DomainError;
use warden_core::traits::{
    GuildSettingsRepository, InfractionRepository, MessageRepository, RepoResult, StoreHealth,
};
use warden_core::value_objects::{Permissions, Snowflake};

fn injected_failure() -> DomainError {
    DomainError::DatabaseError("injected failure".to_string())
}

/// A plain text message from a human author
pub fn incoming_message(
    id: i64,
    guild_id: Option<i64>,
    channel_id: i64,
    author_id: i64,
    content: &str,
) -> IncomingMessage {
    IncomingMessage {
        id: Snowflake::new(id),
        guild_id: guild_id.map(Snowflake::new),
        guild_name: guild_id.map(|_| "Test Guild".to_string()),
        channel: ChannelSnapshot::new(Snowflake::new(channel_id)),
        author: AuthorSnapshot {
            id: Snowflake::new(author_id),
            username: format!("user{author_id}"),
            bot: false,
        },
        content: content.to_string(),
        created_at: Utc::now(),
        sticker_id: None,
        reference_id: None,
        member: None,
        client: ClientSnapshot {
            user_id: Snowflake::new(1),
            managed_role_id: None,
            channel_permissions: guild_id.map(|_| Permissions::RESPOND),
            member: None,
        },
    }
}

// ============================================================================
// Guild settings
// ============================================================================

#[derive(Default)]
pub struct InMemoryGuildSettingsRepository {
    records: Mutex<HashMap<Snowflake, GuildSettings>>,
    reads: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fail_next: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl InMemoryGuildSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, bypassing counters
    pub fn put(&self, settings: GuildSettings) {
        self.records.lock().insert(settings.id, settings);
    }

    pub fn snapshot(&self, id: Snowflake) -> Option<GuildSettings> {
        self.records.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Point reads so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Records actually created
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Total calls of any kind
    pub fn calls(&self) -> usize {
        self.reads() + self.creates() + self.updates()
    }

    /// Make the next call fail with a database error
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Delay every call
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    async fn enter(&self) -> RepoResult<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl GuildSettingsRepository for InMemoryGuildSettingsRepository {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildSettings>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        Ok(self.snapshot(id))
    }

    async fn create_default(&self, id: Snowflake) -> RepoResult<GuildSettings> {
        self.enter().await?;
        let mut records = self.records.lock();
        let settings = records.entry(id).or_insert_with(|| {
            self.creates.fetch_add(1, Ordering::SeqCst);
            GuildSettings::new(id)
        });
        Ok(settings.clone())
    }

    async fn update(&self, settings: &GuildSettings) -> RepoResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        let mut records = self.records.lock();
        match records.get_mut(&settings.id) {
            Some(record) => {
                *record = settings.clone();
                Ok(())
            }
            None => Err(DomainError::GuildSettingsNotFound(settings.id)),
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Pauses one `upsert_many` call until released
#[derive(Clone, Default)]
pub struct UpsertGate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl UpsertGate {
    /// Wait until the held upsert has begun
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    rows: Mutex<HashMap<Snowflake, BufferedMessage>>,
    upsert_batches: AtomicUsize,
    bulk_delete_requests: Mutex<Vec<Vec<Snowflake>>>,
    purge_requests: AtomicUsize,
    fail_next: AtomicBool,
    gate: Mutex<Option<UpsertGate>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row directly
    pub fn seed(&self, message: BufferedMessage) {
        self.rows.lock().insert(message.id, message);
    }

    pub fn row(&self, id: Snowflake) -> Option<BufferedMessage> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    pub fn upsert_batches(&self) -> usize {
        self.upsert_batches.load(Ordering::SeqCst)
    }

    /// Id lists passed to `mark_many_deleted`
    pub fn bulk_delete_requests(&self) -> Vec<Vec<Snowflake>> {
        self.bulk_delete_requests.lock().clone()
    }

    pub fn purge_requests(&self) -> usize {
        self.purge_requests.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Hold the next `upsert_many` until the returned gate is released
    pub fn hold_next_upsert(&self) -> UpsertGate {
        let gate = UpsertGate::default();
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    fn check_failure(&self) -> RepoResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        self.check_failure()?;
        Ok(self.row(id))
    }

    async fn upsert_many(&self, messages: &[BufferedMessage]) -> RepoResult<u64> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        self.check_failure()?;
        self.upsert_batches.fetch_add(1, Ordering::SeqCst);

        let mut rows = self.rows.lock();
        for message in messages {
            let deleted = rows.get(&message.id).is_some_and(|row| row.deleted);
            let mut row = message.clone();
            row.deleted |= deleted;
            rows.insert(row.id, row);
        }
        Ok(messages.len() as u64)
    }

    async fn mark_deleted(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        self.check_failure()?;
        Ok(self.rows.lock().get_mut(&id).map(|row| {
            row.deleted = true;
            row.clone()
        }))
    }

    async fn mark_many_deleted(&self, ids: &[Snowflake]) -> RepoResult<Vec<BufferedMessage>> {
        self.check_failure()?;
        self.bulk_delete_requests.lock().push(ids.to_vec());
        let mut rows = self.rows.lock();
        Ok(ids
            .iter()
            .filter_map(|id| {
                rows.get_mut(id).map(|row| {
                    row.deleted = true;
                    row.clone()
                })
            })
            .collect())
    }

    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Option<String>> {
        self.check_failure()?;
        Ok(self
            .rows
            .lock()
            .get_mut(&id)
            .and_then(|row| row.content.replace(content.to_string())))
    }

    async fn mark_recent_deleted_by_author(
        &self,
        author_id: Snowflake,
        channel_id: Snowflake,
        since: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<BufferedMessage>> {
        self.check_failure()?;
        self.purge_requests.fetch_add(1, Ordering::SeqCst);

        let mut rows = self.rows.lock();
        let mut matches: Vec<&mut BufferedMessage> = rows
            .values_mut()
            .filter(|m| !m.deleted && m.is_from(author_id, channel_id) && m.created_at > since)
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matches
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|row| {
                row.deleted = true;
                row.clone()
            })
            .collect())
    }

    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        self.check_failure()?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|_, row| row.created_at > cutoff);
        Ok((before - rows.len()) as u64)
    }
}

// ============================================================================
// Infractions
// ============================================================================

#[derive(Default)]
pub struct InMemoryInfractionRepository {
    rows: Mutex<Vec<Infraction>>,
    next_id: AtomicI64,
}

impl InMemoryInfractionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Infraction> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl InfractionRepository for InMemoryInfractionRepository {
    async fn create(&self, infraction: &NewInfraction) -> RepoResult<Infraction> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Infraction {
            id,
            guild_id: infraction.guild_id,
            user_id: infraction.user_id,
            moderator_id: infraction.moderator_id,
            kind: infraction.kind,
            reason: infraction.reason.clone(),
            created_at: infraction.created_at,
            expires_at: infraction.expires_at,
        };
        self.rows.lock().push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, guild_id: Snowflake, id: i64) -> RepoResult<Option<Infraction>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|i| i.guild_id == guild_id && i.id == id)
            .cloned())
    }

    async fn find_by_user(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<Infraction>> {
        let mut found: Vec<Infraction> = self
            .rows
            .lock()
            .iter()
            .filter(|i| i.guild_id == guild_id && i.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn delete(&self, guild_id: Snowflake, id: i64) -> RepoResult<bool> {
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|i| !(i.guild_id == guild_id && i.id == id));
        Ok(rows.len() != before)
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Default)]
pub struct InMemoryStoreHealth {
    down: AtomicBool,
}

impl InMemoryStoreHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreHealth for InMemoryStoreHealth {
    async fn ping(&self) -> RepoResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(())
    }
}
