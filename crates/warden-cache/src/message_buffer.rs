//! Write-back message buffer
//!
//! New guild messages are held in memory and flushed to the database in
//! batches on a schedule. Reads and mutations check the buffer first and
//! fall back to the database for messages that were already flushed.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};
use warden_common::CronSpec;
use warden_core::entities::{BufferedMessage, IncomingMessage, UNKNOWN_CONTENT};
use warden_core::traits::{MessageRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::content::serialize_message;
use crate::scheduler::{Scheduler, SchedulerError, DELETE_OLD_MESSAGES, STORE_NEW_MESSAGES};

/// Longest look-back for purges: 13 days
pub const MAX_PURGE_PERIOD_MS: i64 = 1000 * 60 * 60 * 24 * 13;

/// Process wide buffer of not yet persisted messages
pub struct MessageBuffer {
    repo: Arc<dyn MessageRepository>,
    entries: Mutex<HashMap<Snowflake, BufferedMessage>>,
    /// Serializes flushes
    flush_lock: tokio::sync::Mutex<()>,
}

impl MessageBuffer {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self {
            repo,
            entries: Mutex::new(HashMap::new()),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Normalize and buffer a guild message from a human author
    ///
    /// Returns false when the message was not eligible.
    pub fn queue(&self, message: &IncomingMessage) -> bool {
        if message.author.bot {
            return false;
        }
        let Some(buffered) = serialize_message(message) else {
            return false;
        };
        self.entries.lock().insert(buffered.id, buffered);
        true
    }

    /// Look a message up in the buffer, then in the database
    pub async fn get(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        let buffered = self.entries.lock().get(&id).cloned();
        match buffered {
            Some(message) => Ok(Some(message)),
            None => self.repo.find_by_id(id).await,
        }
    }

    /// Flag a message as deleted wherever it lives
    pub async fn delete(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        let buffered = self.entries.lock().get_mut(&id).map(|message| {
            message.mark_deleted();
            message.clone()
        });
        match buffered {
            Some(message) => Ok(Some(message)),
            None => self.repo.mark_deleted(id).await,
        }
    }

    /// Flag a batch of messages as deleted
    ///
    /// Buffered messages that were already deleted are left out of the
    /// result. Ids missing from the buffer go to the database in one update.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[Snowflake]) -> RepoResult<Vec<BufferedMessage>> {
        let mut deleted = Vec::with_capacity(ids.len());
        let mut unbuffered = Vec::new();
        {
            let mut entries = self.entries.lock();
            for id in ids {
                match entries.get_mut(id) {
                    Some(message) => {
                        if message.mark_deleted() {
                            deleted.push(message.clone());
                        }
                    }
                    None => unbuffered.push(*id),
                }
            }
        }

        if !unbuffered.is_empty() {
            deleted.extend(self.repo.mark_many_deleted(&unbuffered).await?);
        }
        Ok(deleted)
    }

    /// Replace the content of a message, returns the previous content
    ///
    /// `content` must already be normalized.
    pub async fn update_content(&self, id: Snowflake, content: String) -> RepoResult<String> {
        let content = {
            let mut entries = self.entries.lock();
            match entries.get_mut(&id) {
                Some(message) => return Ok(message.replace_content(content)),
                None => content,
            }
        };

        let previous = self.repo.update_content(id, &content).await?;
        Ok(previous.unwrap_or_else(|| UNKNOWN_CONTENT.to_string()))
    }

    /// Persist every buffered message in one batch
    ///
    /// Entries are removed only after the batch is written, and only if they
    /// did not change while it was in flight. Returns the number written.
    #[instrument(skip(self))]
    pub async fn store(&self) -> RepoResult<usize> {
        let _flush = self.flush_lock.lock().await;

        let snapshot: Vec<BufferedMessage> = self.entries.lock().values().cloned().collect();
        if snapshot.is_empty() {
            return Ok(0);
        }

        self.repo.upsert_many(&snapshot).await?;

        let mut entries = self.entries.lock();
        for message in &snapshot {
            if entries.get(&message.id) == Some(message) {
                entries.remove(&message.id);
            }
        }
        let kept = entries.len();
        drop(entries);

        debug!(stored = snapshot.len(), kept, "Buffer flushed");
        Ok(snapshot.len())
    }

    /// Flag up to `limit` of a user's recent messages in a channel as deleted
    ///
    /// Buffered messages are taken newest first; the database is only asked
    /// for the remainder. `period_ms` is capped at [`MAX_PURGE_PERIOD_MS`];
    /// zero or less means the whole window.
    #[instrument(skip(self))]
    pub async fn delete_messages_by_user(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
        limit: usize,
        period_ms: i64,
    ) -> RepoResult<Vec<BufferedMessage>> {
        let period_ms = if period_ms <= 0 {
            MAX_PURGE_PERIOD_MS
        } else {
            period_ms.min(MAX_PURGE_PERIOD_MS)
        };
        let period = Duration::milliseconds(period_ms);

        let mut deleted: Vec<BufferedMessage> = {
            let mut entries = self.entries.lock();
            let mut matches: Vec<&mut BufferedMessage> = entries
                .values_mut()
                .filter(|m| !m.deleted && m.is_from(user_id, channel_id))
                .collect();
            matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            matches
                .into_iter()
                .take(limit)
                .map(|message| {
                    message.mark_deleted();
                    message.clone()
                })
                .collect()
        };

        let remaining = limit.saturating_sub(deleted.len());
        if remaining > 0 {
            let since = Utc::now() - period;
            let mut stored = self
                .repo
                .mark_recent_deleted_by_author(user_id, channel_id, since, remaining as i64)
                .await?;
            stored.retain(|m| !deleted.iter().any(|d| d.id == m.id));
            deleted.extend(stored);
        }

        Ok(deleted)
    }

    /// Register the flush and retention jobs
    pub fn start_periodic_flush(
        self: &Arc<Self>,
        scheduler: &Scheduler,
        insert_cron: &CronSpec,
        delete_cron: &CronSpec,
        ttl_ms: u64,
    ) -> Result<(), SchedulerError> {
        let buffer = Arc::clone(self);
        scheduler.schedule(STORE_NEW_MESSAGES, insert_cron, move || {
            let buffer = Arc::clone(&buffer);
            async move {
                let stored = buffer.store().await?;
                if stored > 0 {
                    info!(stored, "Stored buffered messages");
                }
                Ok(())
            }
        })?;

        let repo = Arc::clone(&self.repo);
        let ttl = Duration::milliseconds(i64::try_from(ttl_ms).unwrap_or(i64::MAX));
        scheduler.schedule(DELETE_OLD_MESSAGES, delete_cron, move || {
            let repo = Arc::clone(&repo);
            async move {
                let cutoff = Utc::now() - ttl;
                let deleted = repo.delete_created_before(cutoff).await?;
                info!(deleted, "Deleted old messages");
                Ok(())
            }
        })
    }

    /// Number of buffered messages
    pub fn size(&self) -> usize {
        self.entries.lock().len()
    }
}

impl std::fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("size", &self.size())
            .finish()
    }
}
