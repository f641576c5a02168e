//! Error presenter - answers denials and failed commands in the channel
//!
//! Responses are deleted together with the invoking message after the
//! guild's delay, unless the guild preserves errors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use uuid::Uuid;
use warden_core::entities::{GuildSettings, IncomingMessage};

use crate::dispatch::{CommandEvent, CommandListener, CommandPayload};
use crate::preconditions::{Denial, Identifier};
use crate::services::{ServiceContext, ServiceError};

/// Delay used when no guild settings apply
pub const DEFAULT_DELETE_DELAY_MS: i64 = GuildSettings::DEFAULT_ERROR_DELETE_DELAY;

/// Generic reply for unexpected failures, `id` is the logged correlation id
pub fn unexpected_error_message(id: &Uuid) -> String {
    format!(
        "An error occured while running this command, please include this ID when reporting the bug: `{id}`."
    )
}

/// How long a response stays visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Retention {
    preserve: bool,
    delay_ms: i64,
}

impl Retention {
    const DEFAULT: Self = Self { preserve: false, delay_ms: DEFAULT_DELETE_DELAY_MS };

    fn of(settings: &GuildSettings) -> Self {
        Self { preserve: settings.preserve_errors, delay_ms: settings.error_delete_delay }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPresenter {
    services: ServiceContext,
}

impl ErrorPresenter {
    pub fn new(services: ServiceContext) -> Self {
        Self { services }
    }

    async fn on_denied(&self, message: &IncomingMessage, denial: &Denial) {
        if matches!(denial.identifier, Identifier::Silent | Identifier::GuildOnly) {
            return;
        }

        let retention = match message.guild_id {
            Some(guild_id) => {
                let settings = match self.services.guilds().get(guild_id).await {
                    Ok(settings) => settings,
                    Err(e) => {
                        warn!(guild_id = %guild_id, error = %e, "Cannot read settings to present denial");
                        return;
                    }
                };

                let respond = match denial.identifier {
                    Identifier::CommandDisabled => settings.respond_if_disabled,
                    Identifier::CommandDisabledInChannel => settings.respond_if_disabled_in_channel,
                    _ => settings.respond_if_no_perms,
                };
                if !respond {
                    let _ = self
                        .services
                        .platform()
                        .delete_message(message.channel_id(), message.id)
                        .await;
                    return;
                }

                Retention::of(&settings)
            }
            None => Retention {
                preserve: matches!(
                    denial.identifier,
                    Identifier::ClientPermissions
                        | Identifier::NoPermissions
                        | Identifier::PermissionsUnresolved
                ),
                ..Retention::DEFAULT
            },
        };

        self.respond(message, &denial.message, retention).await;
    }

    async fn on_error(&self, payload: &CommandPayload<'_>, failure: &ServiceError) {
        let message = payload.message;

        let (content, retention) = match failure {
            ServiceError::User(text) => (text.clone(), self.retention_for(message).await),
            other => {
                let id = Uuid::new_v4();
                error!(
                    error_id = %id,
                    command = payload.command.name,
                    code = other.error_code(),
                    error = %other,
                    "Unexpected error while running command"
                );
                (
                    unexpected_error_message(&id),
                    Retention { preserve: true, ..Retention::DEFAULT },
                )
            }
        };

        self.respond(message, &content, retention).await;
    }

    /// Guild retention, or the defaults outside guilds and when settings cannot be read
    async fn retention_for(&self, message: &IncomingMessage) -> Retention {
        let Some(guild_id) = message.guild_id else {
            return Retention::DEFAULT;
        };
        match self.services.guilds().get(guild_id).await {
            Ok(settings) => Retention::of(&settings),
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Using default error retention");
                Retention::DEFAULT
            }
        }
    }

    async fn respond(&self, message: &IncomingMessage, content: &str, retention: Retention) {
        let sent = match self.services.platform().reply(message, content).await {
            Ok(sent) => sent,
            Err(e) => {
                debug!(message_id = %message.id, error = %e, "Could not deliver error response");
                return;
            }
        };

        if retention.preserve {
            return;
        }

        let services = self.services.clone();
        let delay = Duration::from_millis(u64::try_from(retention.delay_ms).unwrap_or(0));
        let (channel_id, message_id) = (message.channel_id(), message.id);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let platform = services.platform();
            let _ = platform.delete_message(sent.channel_id, sent.id).await;
            let _ = platform.delete_message(channel_id, message_id).await;
        });
    }
}

#[async_trait]
impl CommandListener for ErrorPresenter {
    async fn on_event(&self, event: &CommandEvent<'_>) {
        match event {
            CommandEvent::Denied { payload, denial } => self.on_denied(payload.message, denial).await,
            CommandEvent::Error { payload, error } => self.on_error(payload, error).await,
            _ => {}
        }
    }
}
