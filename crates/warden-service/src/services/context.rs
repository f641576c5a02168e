//! Service context - dependency container for commands and listeners
//!
//! Built once at startup and cloned into every command invocation.

use std::sync::Arc;

use warden_cache::{AuditCorrelator, GuildSettingsCache, MessageBuffer};
use warden_common::GlobalConfig;
use warden_core::traits::{InfractionRepository, StoreHealth};

use crate::platform::ChatPlatform;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// It provides access to:
/// - The static configuration
/// - Guild settings cache and message buffer
/// - Audit log correlation
/// - Infraction storage and a database liveness probe
/// - The chat platform
#[derive(Clone)]
pub struct ServiceContext {
    config: Arc<GlobalConfig>,

    // Caches
    guilds: Arc<GuildSettingsCache>,
    messages: Arc<MessageBuffer>,
    audit: Arc<AuditCorrelator>,

    // Repositories
    infraction_repo: Arc<dyn InfractionRepository>,
    store_health: Arc<dyn StoreHealth>,

    // Platform
    platform: Arc<dyn ChatPlatform>,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Get the static configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    // === Caches ===

    /// Get the guild settings cache
    pub fn guilds(&self) -> &Arc<GuildSettingsCache> {
        &self.guilds
    }

    /// Get the message buffer
    pub fn messages(&self) -> &Arc<MessageBuffer> {
        &self.messages
    }

    /// Get the audit log correlator
    pub fn audit(&self) -> &AuditCorrelator {
        &self.audit
    }

    // === Repositories ===

    /// Get the infraction repository
    pub fn infraction_repo(&self) -> &dyn InfractionRepository {
        self.infraction_repo.as_ref()
    }

    /// Get the database liveness probe
    pub fn store_health(&self) -> &dyn StoreHealth {
        self.store_health.as_ref()
    }

    // === Platform ===

    /// Get the chat platform
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("guilds", &self.guilds)
            .field("messages", &self.messages)
            .field("repositories", &"...")
            .field("platform", &"...")
            .finish()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    config: Option<Arc<GlobalConfig>>,
    guilds: Option<Arc<GuildSettingsCache>>,
    messages: Option<Arc<MessageBuffer>>,
    audit: Option<Arc<AuditCorrelator>>,
    infraction_repo: Option<Arc<dyn InfractionRepository>>,
    store_health: Option<Arc<dyn StoreHealth>>,
    platform: Option<Arc<dyn ChatPlatform>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Arc<GlobalConfig>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn guilds(mut self, guilds: Arc<GuildSettingsCache>) -> Self {
        self.guilds = Some(guilds);
        self
    }

    pub fn messages(mut self, messages: Arc<MessageBuffer>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn audit(mut self, audit: Arc<AuditCorrelator>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn infraction_repo(mut self, repo: Arc<dyn InfractionRepository>) -> Self {
        self.infraction_repo = Some(repo);
        self
    }

    pub fn store_health(mut self, health: Arc<dyn StoreHealth>) -> Self {
        self.store_health = Some(health);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn ChatPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext {
            config: self.config.ok_or_else(|| ServiceError::validation("config is required"))?,
            guilds: self.guilds.ok_or_else(|| ServiceError::validation("guilds is required"))?,
            messages: self
                .messages
                .ok_or_else(|| ServiceError::validation("messages is required"))?,
            audit: self.audit.unwrap_or_default(),
            infraction_repo: self
                .infraction_repo
                .ok_or_else(|| ServiceError::validation("infraction_repo is required"))?,
            store_health: self
                .store_health
                .ok_or_else(|| ServiceError::validation("store_health is required"))?,
            platform: self
                .platform
                .ok_or_else(|| ServiceError::validation("platform is required"))?,
        })
    }
}
