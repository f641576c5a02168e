//! Message commands: metadata, run context and the registry

mod args;
pub mod builtin;
mod duration;

pub use args::Args;
pub use duration::{format_duration, parse_duration, DurationArg};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use warden_core::entities::{GuildSettings, IncomingMessage};
use warden_core::value_objects::Permissions;

use crate::services::{ServiceContext, ServiceResult};

/// Command grouping, also drives which preconditions apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Developer,
    Utility,
    Management,
    Moderation,
}

impl CommandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Developer => "Developer",
            Self::Utility => "Utility",
            Self::Management => "Management",
            Self::Moderation => "Moderation",
        }
    }

    /// Categories whose commands only make sense inside a guild
    pub fn is_guild_only(&self) -> bool {
        matches!(self, Self::Management | Self::Moderation)
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a command
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub category: CommandCategory,
    pub description: &'static str,
    pub usage: Option<&'static str>,
    /// Permissions the invoking member needs
    pub required_user_permissions: Permissions,
    /// Permissions the bot needs in the invocation channel
    pub required_client_permissions: Permissions,
    /// Restricted to the developer allow-list
    pub guarded: bool,
}

impl CommandMetadata {
    pub const fn new(name: &'static str, category: CommandCategory) -> Self {
        Self {
            name,
            aliases: &[],
            category,
            description: "",
            usage: None,
            required_user_permissions: Permissions::empty(),
            required_client_permissions: Permissions::empty(),
            guarded: false,
        }
    }
}

/// Everything a command body gets besides its arguments
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub message: Arc<IncomingMessage>,
    /// Settings of the invocation guild, read for this invocation
    pub settings: Option<Arc<GuildSettings>>,
    /// Name the command was invoked with
    pub command_name: String,
    /// Matched prefix text
    pub prefix: String,
    pub services: ServiceContext,
    /// Every registered command, for commands that manage other commands
    pub registry: Arc<CommandRegistry>,
}

impl CommandContext {
    /// Reply to the invoking message
    pub async fn reply(&self, content: &str) -> ServiceResult<crate::platform::SentMessage> {
        Ok(self.services.platform().reply(&self.message, content).await?)
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    fn metadata(&self) -> &CommandMetadata;

    /// Whether the command can be invoked from a chat message
    fn supports_message(&self) -> bool {
        true
    }

    /// Run the command for a chat message
    async fn message_run(&self, ctx: &CommandContext, args: Args) -> ServiceResult<()>;
}

/// Commands by name and alias
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
    by_name: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for command in builtin::all() {
            registry.register(command);
        }
        registry
    }

    /// Add a command; names and aliases are stored lowercased
    ///
    /// A later registration wins on a name clash.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        let index = self.commands.len();
        let metadata = command.metadata();
        for name in std::iter::once(&metadata.name).chain(metadata.aliases) {
            self.by_name.insert(name.to_lowercase(), index);
        }
        self.commands.push(command);
    }

    /// Look a command up by name or alias
    pub fn get(&self, name: &str, case_insensitive: bool) -> Option<Arc<dyn Command>> {
        let key = if case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        };
        self.by_name
            .get(&key)
            .map(|&index| Arc::clone(&self.commands[index]))
    }

    /// Whether `name` is a command's primary name (not an alias)
    pub fn is_primary_name(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c.metadata().name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.commands.iter().map(|c| c.metadata().name).collect();
        f.debug_struct("CommandRegistry").field("commands", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(CommandMetadata);

    #[async_trait]
    impl Command for Echo {
        fn metadata(&self) -> &CommandMetadata {
            &self.0
        }

        async fn message_run(&self, _ctx: &CommandContext, _args: Args) -> ServiceResult<()> {
            Ok(())
        }
    }

    fn echo() -> Arc<dyn Command> {
        Arc::new(Echo(CommandMetadata {
            aliases: &["say"],
            ..CommandMetadata::new("echo", CommandCategory::Utility)
        }))
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let mut registry = CommandRegistry::new();
        registry.register(echo());

        assert!(registry.get("echo", true).is_some());
        assert!(registry.get("say", true).is_some());
        assert!(registry.get("ECHO", true).is_some());
        assert!(registry.get("ECHO", false).is_none());
        assert!(registry.get("nope", true).is_none());
        assert!(registry.is_primary_name("echo"));
        assert!(!registry.is_primary_name("say"));
    }

    #[test]
    fn test_builtins_registered() {
        let registry = CommandRegistry::with_builtins();
        for name in ["ping", "pong", "stats", "health", "config", "settings", "warn", "strike"] {
            assert!(registry.get(name, true).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_guild_only_categories() {
        assert!(CommandCategory::Moderation.is_guild_only());
        assert!(CommandCategory::Management.is_guild_only());
        assert!(!CommandCategory::Utility.is_guild_only());
        assert!(!CommandCategory::Developer.is_guild_only());
    }
}
