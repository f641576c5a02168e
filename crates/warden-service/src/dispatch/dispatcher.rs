//! Command dispatcher
//!
//! One call per inbound message:
//! channel gate -> prefix -> name -> lookup -> global preconditions ->
//! local preconditions -> arguments -> settings -> command body.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{instrument, warn};
use warden_core::entities::{GuildSettings, IncomingMessage};

use super::events::{CommandEvent, CommandListener, CommandPayload};
use super::prefix::{PrefixResolution, PrefixResolver};
use crate::commands::{Args, Command, CommandContext, CommandRegistry};
use crate::preconditions::{Denial, PreconditionChain, PreconditionContext, Verdict};
use crate::services::{ServiceContext, ServiceError, ServiceResult};

/// Handles prefixed messages that name no registered command (shortcuts)
#[async_trait]
pub trait RawMessageHandler: Send + Sync {
    async fn handle(&self, message: &IncomingMessage, name: &str, parameters: &str) -> ServiceResult<()>;
}

/// Drops unknown command names
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreShortcuts;

#[async_trait]
impl RawMessageHandler for IgnoreShortcuts {
    async fn handle(&self, _message: &IncomingMessage, name: &str, _parameters: &str) -> ServiceResult<()> {
        tracing::trace!(name, "No command or shortcut with this name");
        Ok(())
    }
}

/// Where a message ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Bot author, or the bot cannot answer in the channel
    Ignored,
    MentionOnly,
    NotPrefixed,
    UnknownName,
    /// Handed to the raw message handler
    Delegated,
    NoHandler,
    Denied(Denial),
    Succeeded,
    Failed,
}

pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    resolver: PrefixResolver,
    global: PreconditionChain,
    listeners: Vec<Arc<dyn CommandListener>>,
    raw_handler: Arc<dyn RawMessageHandler>,
    services: ServiceContext,
}

impl CommandDispatcher {
    /// Create a dispatcher using the configured prefixes
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if the regex prefix does not compile
    pub fn new(registry: Arc<CommandRegistry>, services: ServiceContext) -> ServiceResult<Self> {
        let resolver = PrefixResolver::new(&services.config().commands)
            .map_err(|e| ServiceError::validation(format!("invalid regex prefix: {e}")))?;

        Ok(Self {
            registry,
            resolver,
            global: PreconditionChain::global(),
            listeners: Vec::new(),
            raw_handler: Arc::new(IgnoreShortcuts),
            services,
        })
    }

    pub fn with_listener(mut self, listener: Arc<dyn CommandListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_raw_handler(mut self, handler: Arc<dyn RawMessageHandler>) -> Self {
        self.raw_handler = handler;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    pub async fn handle_message(&self, message: Arc<IncomingMessage>) -> DispatchOutcome {
        if message.author.bot || !message.client_can_respond() {
            return DispatchOutcome::Ignored;
        }

        let content = message.content.as_str();
        let resolution = match self.resolver.resolve_static(content, &message.client) {
            Some(resolution) => resolution,
            None => {
                let settings = self.prefix_settings(&message).await;
                let guild_prefix = settings.as_deref().map(|s| s.prefix.as_str());
                self.resolver.resolve_configured(content, guild_prefix)
            }
        };

        match resolution {
            PrefixResolution::MentionOnly => {
                self.emit(&CommandEvent::MentionPrefixOnly { message: &message }).await;
                DispatchOutcome::MentionOnly
            }
            PrefixResolution::NotPrefixed => {
                self.emit(&CommandEvent::NonPrefixedMessage { message: &message }).await;
                DispatchOutcome::NotPrefixed
            }
            PrefixResolution::Matched { prefix, remainder, .. } => {
                self.dispatch(&message, prefix, remainder).await
            }
        }
    }

    /// Settings for the string prefix, `None` outside guilds or if they cannot be read
    async fn prefix_settings(&self, message: &IncomingMessage) -> Option<Arc<GuildSettings>> {
        let guild_id = message.guild_id?;
        match self.services.guilds().get(guild_id).await {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Falling back to the default prefix");
                None
            }
        }
    }

    async fn dispatch(&self, message: &Arc<IncomingMessage>, prefix: &str, remainder: &str) -> DispatchOutcome {
        let prefix_less = remainder.trim();
        let (name, parameters) = match prefix_less.find(char::is_whitespace) {
            Some(index) => (&prefix_less[..index], prefix_less[index..].trim()),
            None => (prefix_less, ""),
        };

        if name.is_empty() {
            self.emit(&CommandEvent::UnknownName { message, prefix }).await;
            return DispatchOutcome::UnknownName;
        }

        let case_insensitive = self.services.config().commands.case_insensitive_commands;
        let Some(command) = self.registry.get(name, case_insensitive) else {
            if let Err(e) = self.raw_handler.handle(message, name, parameters).await {
                warn!(name, error = %e, "Raw message handler failed");
            }
            return DispatchOutcome::Delegated;
        };

        let payload = CommandPayload {
            message,
            command: command.metadata(),
            command_name: name,
            prefix,
        };

        if !command.supports_message() {
            self.emit(&CommandEvent::NoHandler(payload)).await;
            return DispatchOutcome::NoHandler;
        }

        let ctx = PreconditionContext {
            message,
            command: payload.command,
            services: &self.services,
        };
        let local = PreconditionChain::local_for(payload.command);

        for chain in [&self.global, &local] {
            match chain.run(&ctx).await {
                Ok(Verdict::Allow) => {}
                Ok(Verdict::Deny(denial)) => {
                    self.emit(&CommandEvent::Denied { payload, denial: &denial }).await;
                    return DispatchOutcome::Denied(denial);
                }
                Err(error) => {
                    self.emit(&CommandEvent::Error { payload, error: &error }).await;
                    self.emit(&CommandEvent::Finish { payload, success: false, duration: None }).await;
                    return DispatchOutcome::Failed;
                }
            }
        }

        let args = Args::new(parameters);
        self.emit(&CommandEvent::Run(payload)).await;

        match self.execute(command.as_ref(), message, name, prefix, args).await {
            Ok(duration) => {
                self.emit(&CommandEvent::Success { payload, duration }).await;
                self.emit(&CommandEvent::Finish { payload, success: true, duration: Some(duration) }).await;
                DispatchOutcome::Succeeded
            }
            Err(error) => {
                self.emit(&CommandEvent::Error { payload, error: &error }).await;
                self.emit(&CommandEvent::Finish { payload, success: false, duration: None }).await;
                DispatchOutcome::Failed
            }
        }
    }

    /// Read fresh settings and time the command body
    async fn execute(
        &self,
        command: &dyn Command,
        message: &Arc<IncomingMessage>,
        name: &str,
        prefix: &str,
        args: Args,
    ) -> ServiceResult<std::time::Duration> {
        let settings = match message.guild_id {
            Some(guild_id) => Some(self.services.guilds().get(guild_id).await?),
            None => None,
        };

        let ctx = CommandContext {
            message: Arc::clone(message),
            settings,
            command_name: name.to_string(),
            prefix: prefix.to_string(),
            services: self.services.clone(),
            registry: Arc::clone(&self.registry),
        };

        let stopwatch = Instant::now();
        command.message_run(&ctx, args).await?;
        Ok(stopwatch.elapsed())
    }

    async fn emit(&self, event: &CommandEvent<'_>) {
        for listener in &self.listeners {
            listener.on_event(event).await;
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("registry", &self.registry)
            .field("resolver", &self.resolver)
            .field("global", &self.global)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
