//! Guild configuration from chat
//!
//! `config <setting>` shows the current value, `config <setting> <value>`
//! changes it. Every change goes through the settings cache so the next
//! invocation sees it.

use async_trait::async_trait;
use warden_core::entities::GuildSettings;
use warden_core::error::DomainError;
use warden_core::value_objects::{Permissions, Snowflake};

use crate::commands::{
    format_duration, parse_duration, Args, Command, CommandCategory, CommandContext,
    CommandMetadata, DurationArg,
};
use crate::services::{ServiceError, ServiceResult};

static METADATA: CommandMetadata = CommandMetadata {
    aliases: &["settings"],
    description: "Configure the bot.",
    usage: Some("<setting> [value]"),
    required_user_permissions: Permissions::ADMINISTRATOR,
    ..CommandMetadata::new("config", CommandCategory::Management)
};

const SETTINGS: &[&str] = &[
    "prefix",
    "auto-delete",
    "respond-if-no-perms",
    "respond-if-disabled",
    "respond-if-disabled-in-channel",
    "preserve-errors",
    "show-executor",
    "error-delete-delay",
    "enable",
    "disable",
    "moderator-roles",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    AutoDelete,
    RespondIfNoPerms,
    RespondIfDisabled,
    RespondIfDisabledInChannel,
    PreserveErrors,
    ShowExecutor,
}

impl Toggle {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "auto-delete" => Self::AutoDelete,
            "respond-if-no-perms" => Self::RespondIfNoPerms,
            "respond-if-disabled" => Self::RespondIfDisabled,
            "respond-if-disabled-in-channel" => Self::RespondIfDisabledInChannel,
            "preserve-errors" => Self::PreserveErrors,
            "show-executor" => Self::ShowExecutor,
            _ => return None,
        })
    }

    fn field(self, settings: &mut GuildSettings) -> &mut bool {
        match self {
            Self::AutoDelete => &mut settings.auto_delete,
            Self::RespondIfNoPerms => &mut settings.respond_if_no_perms,
            Self::RespondIfDisabled => &mut settings.respond_if_disabled,
            Self::RespondIfDisabledInChannel => &mut settings.respond_if_disabled_in_channel,
            Self::PreserveErrors => &mut settings.preserve_errors,
            Self::ShowExecutor => &mut settings.show_executor,
        }
    }
}

pub struct ConfigCommand;

#[async_trait]
impl Command for ConfigCommand {
    fn metadata(&self) -> &CommandMetadata {
        &METADATA
    }

    async fn message_run(&self, ctx: &CommandContext, mut args: Args) -> ServiceResult<()> {
        let current = ctx
            .settings
            .as_deref()
            .ok_or_else(|| ServiceError::user("This command can only be used in a server."))?;

        let Some(setting) = args.next() else {
            return Err(ServiceError::user(format!(
                "You must provide a setting to configure. Available settings: {}.",
                SETTINGS.join(", ")
            )));
        };
        let setting = setting.to_lowercase();
        let mut settings = current.clone();

        let response = match setting.as_str() {
            "prefix" => set_prefix(&mut settings, args.next())?,
            "error-delete-delay" => set_error_delete_delay(&mut settings, args.rest())?,
            "enable" => enable(ctx, &mut settings, args.next())?,
            "disable" => disable(ctx, &mut settings, args.next())?,
            "moderator-roles" => moderator_roles(&mut settings, args.next(), args.next())?,
            other => match Toggle::parse(other) {
                Some(toggle) => set_toggle(&mut settings, toggle, args.next())?,
                None => {
                    return Err(ServiceError::user(format!(
                        "Unknown setting `{other}`. Available settings: {}.",
                        SETTINGS.join(", ")
                    )))
                }
            },
        };

        if &settings != current {
            ctx.services.guilds().update(settings).await?;
        }

        ctx.reply(&response).await?;
        Ok(())
    }
}

fn set_prefix(settings: &mut GuildSettings, value: Option<String>) -> ServiceResult<String> {
    let Some(prefix) = value else {
        return Ok(format!("The current prefix for this server is `{}`.", settings.prefix));
    };

    if prefix == settings.prefix {
        return Err(ServiceError::user(
            "The prefix you provided is the same as the current prefix.",
        ));
    }

    settings.set_prefix(&prefix).map_err(as_user_error)?;
    Ok(format!("The prefix for this server has been set to `{prefix}`."))
}

fn set_toggle(
    settings: &mut GuildSettings,
    toggle: Toggle,
    value: Option<String>,
) -> ServiceResult<String> {
    let field = toggle.field(settings);
    let Some(value) = value else {
        return Ok(format!("The value for this setting is currently set to `{field}`."));
    };

    let value = parse_bool(&value)
        .ok_or_else(|| ServiceError::user("The value must be `true` or `false`."))?;
    if *field == value {
        return Err(ServiceError::user(format!(
            "The value for this setting is already set to `{value}`."
        )));
    }

    *field = value;
    Ok(format!("The value for this setting has been set to `{value}`."))
}

fn set_error_delete_delay(settings: &mut GuildSettings, value: Option<String>) -> ServiceResult<String> {
    let Some(value) = value else {
        return Ok(format!(
            "The value for this setting is currently set to `{}`.",
            format_duration(settings.error_delete_delay)
        ));
    };

    let delay = match parse_duration(&value) {
        None => return Err(ServiceError::user("Invalid duration.")),
        Some(DurationArg::Permanent) => {
            return Err(ServiceError::user(
                "You cannot set the error delete delay to permanent.",
            ))
        }
        Some(DurationArg::Finite(ms)) => ms,
    };

    if delay == settings.error_delete_delay {
        return Err(ServiceError::user(format!(
            "The value for this setting is already set to `{}`.",
            format_duration(delay)
        )));
    }
    if delay < GuildSettings::MIN_ERROR_DELETE_DELAY {
        return Err(ServiceError::user("The error delete delay cannot be less than 1 second."));
    }
    if delay > GuildSettings::MAX_ERROR_DELETE_DELAY {
        return Err(ServiceError::user(
            "The error delete delay cannot be longer than 30 seconds.",
        ));
    }

    settings.set_error_delete_delay(delay).map_err(as_user_error)?;
    Ok(format!(
        "The value for this setting has been set to `{}`.",
        format_duration(delay)
    ))
}

/// Resolve a user supplied name to a command guilds may toggle
fn toggleable_command(ctx: &CommandContext, name: Option<String>) -> ServiceResult<&'static str> {
    let name = name.ok_or_else(|| ServiceError::user("You must provide a command name."))?;
    let case_insensitive = ctx.services.config().commands.case_insensitive_commands;

    ctx.registry
        .get(&name, case_insensitive)
        .map(|command| command.metadata().clone())
        .filter(|metadata| metadata.category != CommandCategory::Developer)
        .map(|metadata| metadata.name)
        .ok_or_else(|| ServiceError::user("That command does not exist."))
}

fn enable(ctx: &CommandContext, settings: &mut GuildSettings, name: Option<String>) -> ServiceResult<String> {
    let command = toggleable_command(ctx, name)?;
    if !settings.enable_command(command) {
        return Err(ServiceError::user("That command is already enabled."));
    }
    Ok(format!("The `{command}` command has been enabled."))
}

fn disable(ctx: &CommandContext, settings: &mut GuildSettings, name: Option<String>) -> ServiceResult<String> {
    let command = toggleable_command(ctx, name)?;
    if command == METADATA.name {
        return Err(ServiceError::user("You cannot disable the config command."));
    }
    if !settings.disable_command(command) {
        return Err(ServiceError::user("That command is already disabled."));
    }
    Ok(format!("The `{command}` command has been disabled."))
}

fn moderator_roles(
    settings: &mut GuildSettings,
    action: Option<String>,
    role: Option<String>,
) -> ServiceResult<String> {
    let Some(action) = action else {
        if settings.moderator_roles.is_empty() {
            return Ok("No moderator roles are configured.".to_string());
        }
        let roles: Vec<String> = settings.moderator_roles.iter().map(|r| format!("<@&{r}>")).collect();
        return Ok(format!("Moderator roles: {}", roles.join(", ")));
    };

    let role = role
        .as_deref()
        .and_then(parse_role)
        .ok_or_else(|| ServiceError::user("That is not a valid role."))?;

    match action.to_lowercase().as_str() {
        "add" => {
            if settings.moderator_roles.contains(&role) {
                return Err(ServiceError::user("That role is already a moderator role."));
            }
            settings.moderator_roles.push(role);
            Ok(format!("The role <@&{role}> is now a moderator role."))
        }
        "remove" => {
            if !settings.moderator_roles.contains(&role) {
                return Err(ServiceError::user("That role is not a moderator role."));
            }
            settings.moderator_roles.retain(|r| *r != role);
            Ok(format!("The role <@&{role}> is no longer a moderator role."))
        }
        _ => Err(ServiceError::user("The action must be `add` or `remove`.")),
    }
}

/// A role given raw or as a `<@&id>` mention
fn parse_role(raw: &str) -> Option<Snowflake> {
    let id = raw
        .strip_prefix("<@&")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(raw);
    Snowflake::is_valid_str(id).then(|| Snowflake::parse(id).ok()).flatten()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "false" | "no" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

fn as_user_error(error: DomainError) -> ServiceError {
    match error {
        DomainError::ValidationError(message) => ServiceError::User(message),
        other => ServiceError::Domain(other),
    }
}
