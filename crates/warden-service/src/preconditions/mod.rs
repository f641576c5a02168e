//! Precondition chain
//!
//! Preconditions run in ascending `position` order and stop at the first
//! denial. The global chain applies to every command; the local chain is
//! derived from each command's metadata.

mod client_permissions;
mod enabled;
mod guarded;
mod guild_only;
mod permissions;

pub use client_permissions::ClientPermissionsPrecondition;
pub use enabled::EnabledPrecondition;
pub use guarded::GuardedPrecondition;
pub use guild_only::GuildOnlyPrecondition;
pub use permissions::PermissionsPrecondition;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use warden_core::entities::IncomingMessage;

use crate::commands::CommandMetadata;
use crate::services::{ServiceContext, ServiceResult};

/// Kind of denial, drives how the denial is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Never shown to the user
    Silent,
    CommandDisabled,
    CommandDisabledInChannel,
    NoPermissions,
    /// The member's channel permissions could not be computed
    PermissionsUnresolved,
    GuildOnly,
    ClientPermissions,
}

impl Identifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silent => "Silent",
            Self::CommandDisabled => "CommandDisabled",
            Self::CommandDisabledInChannel => "CommandDisabledInChannel",
            Self::NoPermissions => "NoPermissions",
            Self::PermissionsUnresolved => "PermissionsUnresolved",
            Self::GuildOnly => "GuildOnly",
            Self::ClientPermissions => "ClientPermissions",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A precondition refusal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub identifier: Identifier,
    pub message: String,
}

impl Denial {
    pub fn new(identifier: Identifier, message: impl Into<String>) -> Self {
        Self { identifier, message: message.into() }
    }
}

/// Outcome of a single precondition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

impl Verdict {
    pub fn deny(identifier: Identifier, message: impl Into<String>) -> Self {
        Self::Deny(Denial::new(identifier, message))
    }

    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// What a precondition gets to look at
#[derive(Clone, Copy)]
pub struct PreconditionContext<'a> {
    pub message: &'a IncomingMessage,
    pub command: &'a CommandMetadata,
    pub services: &'a ServiceContext,
}

#[async_trait]
pub trait Precondition: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower runs first
    fn position(&self) -> u32 {
        0
    }

    /// Storage failures propagate as errors, refusals come back as `Verdict::Deny`
    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict>;
}

/// Ordered, short-circuiting list of preconditions
#[derive(Clone, Default)]
pub struct PreconditionChain {
    entries: Vec<Arc<dyn Precondition>>,
}

impl PreconditionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preconditions applied to every command
    pub fn global() -> Self {
        let mut chain = Self::new();
        chain.push(Arc::new(GuardedPrecondition));
        chain.push(Arc::new(EnabledPrecondition));
        chain.push(Arc::new(PermissionsPrecondition));
        chain
    }

    /// Preconditions declared by a command's metadata
    pub fn local_for(metadata: &CommandMetadata) -> Self {
        let mut chain = Self::new();
        if metadata.category.is_guild_only() {
            chain.push(Arc::new(GuildOnlyPrecondition));
        }
        if !metadata.required_client_permissions.is_empty() {
            chain.push(Arc::new(ClientPermissionsPrecondition));
        }
        chain
    }

    /// Insert keeping the chain sorted by position, ties keep insertion order
    pub fn push(&mut self, precondition: Arc<dyn Precondition>) {
        let position = precondition.position();
        let index = self.entries.partition_point(|p| p.position() <= position);
        self.entries.insert(index, precondition);
    }

    /// Run every precondition until one denies
    pub async fn run(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        for precondition in &self.entries {
            let verdict = precondition.check(ctx).await?;
            if let Verdict::Deny(denial) = verdict {
                tracing::debug!(
                    precondition = precondition.name(),
                    command = ctx.command.name,
                    identifier = %denial.identifier,
                    "Precondition denied command"
                );
                return Ok(Verdict::Deny(denial));
            }
        }
        Ok(Verdict::Allow)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for PreconditionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreconditionChain").field("entries", &self.names()).finish()
    }
}
