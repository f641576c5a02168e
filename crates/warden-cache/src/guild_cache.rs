//! Guild settings cache
//!
//! Settings are cached until something invalidates them; there is no ttl.
//! Every write path goes through [`GuildSettingsCache::update`] so a stale
//! copy never outlives a change.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use warden_common::CronSpec;
use warden_core::entities::GuildSettings;
use warden_core::traits::{GuildSettingsRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::scheduler::{Scheduler, SchedulerError, DELETE_GUILD_CACHE};

/// Process wide guild settings cache
pub struct GuildSettingsCache {
    repo: Arc<dyn GuildSettingsRepository>,
    entries: DashMap<Snowflake, Arc<GuildSettings>>,
    /// Serializes `confirm` per guild
    confirm_locks: DashMap<Snowflake, Arc<Mutex<()>>>,
}

impl GuildSettingsCache {
    pub fn new(repo: Arc<dyn GuildSettingsRepository>) -> Self {
        Self {
            repo,
            entries: DashMap::new(),
            confirm_locks: DashMap::new(),
        }
    }

    /// Cached settings, loading or creating them on a miss
    pub async fn get(&self, guild_id: Snowflake) -> RepoResult<Arc<GuildSettings>> {
        if let Some(settings) = self.entries.get(&guild_id) {
            return Ok(Arc::clone(settings.value()));
        }
        self.confirm(guild_id).await
    }

    /// Read the stored record, creating the default one if there is none, and cache it
    #[instrument(skip(self))]
    pub async fn confirm(&self, guild_id: Snowflake) -> RepoResult<Arc<GuildSettings>> {
        let lock = Arc::clone(self.confirm_locks.entry(guild_id).or_default().value());
        let result = {
            let _guard = lock.lock().await;
            self.load(guild_id).await
        };

        // Drop the lock entry unless another caller is queued on it
        drop(lock);
        self.confirm_locks
            .remove_if(&guild_id, |_, lock| Arc::strong_count(lock) == 1);

        let settings = Arc::new(result?);
        self.entries.insert(guild_id, Arc::clone(&settings));
        Ok(settings)
    }

    async fn load(&self, guild_id: Snowflake) -> RepoResult<GuildSettings> {
        if let Some(settings) = self.repo.find_by_id(guild_id).await? {
            return Ok(settings);
        }

        let settings = self.repo.create_default(guild_id).await?;
        info!(guild_id = %guild_id, "Created default guild settings");
        Ok(settings)
    }

    /// Persist a modified record and drop the cached copy
    #[instrument(skip(self, settings), fields(guild_id = %settings.id))]
    pub async fn update(&self, mut settings: GuildSettings) -> RepoResult<()> {
        settings.touch();
        self.repo.update(&settings).await?;
        self.invalidate(settings.id);
        Ok(())
    }

    /// Drop one cached record, returns whether it was cached
    pub fn invalidate(&self, guild_id: Snowflake) -> bool {
        let removed = self.entries.remove(&guild_id).is_some();
        if removed {
            debug!(guild_id = %guild_id, "Guild settings invalidated");
        }
        removed
    }

    /// Drop every cached record
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register the periodic full clear
    pub fn start_eviction_schedule(
        self: &Arc<Self>,
        scheduler: &Scheduler,
        cron: &CronSpec,
    ) -> Result<(), SchedulerError> {
        let cache = Arc::clone(self);
        scheduler.schedule(DELETE_GUILD_CACHE, cron, move || {
            let cache = Arc::clone(&cache);
            async move {
                let evicted = cache.len();
                cache.invalidate_all();
                info!(evicted, "Guild settings cache cleared");
                Ok(())
            }
        })
    }
}

impl std::fmt::Debug for GuildSettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildSettingsCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryGuildSettingsRepository;

    fn cache() -> (Arc<InMemoryGuildSettingsRepository>, Arc<GuildSettingsCache>) {
        let repo = Arc::new(InMemoryGuildSettingsRepository::new());
        let cache = Arc::new(GuildSettingsCache::new(repo.clone()));
        (repo, cache)
    }

    #[tokio::test]
    async fn test_first_access_creates_defaults() {
        let (repo, cache) = cache();
        let id = Snowflake::new(1);

        let settings = cache.get(id).await.unwrap();
        assert_eq!(settings.prefix, GuildSettings::DEFAULT_PREFIX);
        assert!(settings.disabled_commands.is_empty());
        assert_eq!(repo.creates(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_hit_skips_storage() {
        let (repo, cache) = cache();
        let id = Snowflake::new(1);

        cache.get(id).await.unwrap();
        let reads = repo.reads();
        cache.get(id).await.unwrap();
        assert_eq!(repo.reads(), reads);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_read() {
        let (repo, cache) = cache();
        let id = Snowflake::new(1);
        cache.get(id).await.unwrap();

        let mut stored = repo.snapshot(id).unwrap();
        stored.prefix = "?".to_string();
        repo.put(stored);

        assert_eq!(cache.get(id).await.unwrap().prefix, ">");
        assert!(cache.invalidate(id));
        assert!(!cache.invalidate(id));

        let reads = repo.reads();
        assert_eq!(cache.get(id).await.unwrap().prefix, "?");
        assert_eq!(repo.reads(), reads + 1);
    }

    #[tokio::test]
    async fn test_update_persists_and_invalidates() {
        let (repo, cache) = cache();
        let id = Snowflake::new(1);

        let mut settings = (*cache.get(id).await.unwrap()).clone();
        settings.disable_command("warn");
        cache.update(settings).await.unwrap();

        assert!(cache.is_empty());
        assert!(repo.snapshot(id).unwrap().is_disabled("warn"));
        assert!(cache.get(id).await.unwrap().is_disabled("warn"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirm_creates_once() {
        let (repo, cache) = cache();
        repo.set_latency(std::time::Duration::from_millis(5));
        let id = Snowflake::new(42);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.confirm(id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(repo.creates(), 1);
        assert!(cache.confirm_locks.is_empty());
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let (repo, cache) = cache();
        repo.fail_next();

        assert!(cache.get(Snowflake::new(1)).await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (_, cache) = cache();
        cache.get(Snowflake::new(1)).await.unwrap();
        cache.get(Snowflake::new(2)).await.unwrap();

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
