//! Command lifecycle events and their listeners

use std::time::Duration;

use async_trait::async_trait;
use warden_core::entities::IncomingMessage;

use crate::commands::CommandMetadata;
use crate::preconditions::Denial;
use crate::services::ServiceError;

/// A resolved invocation
#[derive(Debug, Clone, Copy)]
pub struct CommandPayload<'a> {
    pub message: &'a IncomingMessage,
    pub command: &'a CommandMetadata,
    /// Name as typed by the user
    pub command_name: &'a str,
    /// Prefix text as typed by the user
    pub prefix: &'a str,
}

#[derive(Debug)]
pub enum CommandEvent<'a> {
    /// The message only mentions the bot
    MentionPrefixOnly { message: &'a IncomingMessage },
    NonPrefixedMessage { message: &'a IncomingMessage },
    /// A prefix with no command name after it
    UnknownName { message: &'a IncomingMessage, prefix: &'a str },
    /// The command cannot be invoked from a chat message
    NoHandler(CommandPayload<'a>),
    Denied { payload: CommandPayload<'a>, denial: &'a Denial },
    Run(CommandPayload<'a>),
    Success { payload: CommandPayload<'a>, duration: Duration },
    Error { payload: CommandPayload<'a>, error: &'a ServiceError },
    /// Always follows `Run` or a failed precondition run; `duration` is
    /// absent when the command did not complete
    Finish { payload: CommandPayload<'a>, success: bool, duration: Option<Duration> },
}

impl CommandEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MentionPrefixOnly { .. } => "MentionPrefixOnly",
            Self::NonPrefixedMessage { .. } => "NonPrefixedMessage",
            Self::UnknownName { .. } => "UnknownName",
            Self::NoHandler(_) => "NoHandler",
            Self::Denied { .. } => "Denied",
            Self::Run(_) => "Run",
            Self::Success { .. } => "Success",
            Self::Error { .. } => "Error",
            Self::Finish { .. } => "Finish",
        }
    }
}

#[async_trait]
pub trait CommandListener: Send + Sync {
    async fn on_event(&self, event: &CommandEvent<'_>);
}

/// Logs command lifecycle events
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLogger;

#[async_trait]
impl CommandListener for CommandLogger {
    async fn on_event(&self, event: &CommandEvent<'_>) {
        match event {
            CommandEvent::Run(payload) => tracing::debug!(
                command = payload.command.name,
                author_id = %payload.message.author.id,
                guild_id = ?payload.message.guild_id,
                "Running command"
            ),
            CommandEvent::Finish { payload, success, duration } => tracing::info!(
                command = payload.command.name,
                author_id = %payload.message.author.id,
                success,
                duration = ?duration,
                "Command finished"
            ),
            CommandEvent::Denied { payload, denial } => tracing::debug!(
                command = payload.command.name,
                author_id = %payload.message.author.id,
                identifier = %denial.identifier,
                "Command denied"
            ),
            _ => {}
        }
    }
}
