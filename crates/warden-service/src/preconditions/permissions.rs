//! Member permissions, role overrides and channel scoping

use async_trait::async_trait;
use warden_core::entities::{GuildSettings, IncomingMessage, MemberSnapshot};
use warden_core::value_objects::Snowflake;

use super::{Identifier, Precondition, PreconditionContext, Verdict};
use crate::commands::{CommandCategory, CommandMetadata};
use crate::services::ServiceResult;

pub const NO_PERMISSIONS_MESSAGE: &str =
    "You do not have the required permissions to run this command.";
pub const DISABLED_IN_CHANNEL_MESSAGE: &str = "This command cannot be used in this channel.";
pub const UNRESOLVED_PERMISSIONS_MESSAGE: &str =
    "I cannot resolve your permissions in this channel. Please try again later.";

pub struct PermissionsPrecondition;

#[async_trait]
impl Precondition for PermissionsPrecondition {
    fn name(&self) -> &'static str {
        "Permissions"
    }

    fn position(&self) -> u32 {
        20
    }

    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        if ctx.command.category == CommandCategory::Developer {
            return Ok(Verdict::Allow);
        }
        let Some(guild_id) = ctx.message.guild_id else {
            return Ok(Verdict::Allow);
        };
        let Some(member) = ctx.message.member.as_ref() else {
            return Ok(unresolved());
        };

        // Owners and administrators pass both the member and channel checks
        if member.is_owner || member.is_administrator {
            return Ok(Verdict::Allow);
        }

        let settings = ctx.services.guilds().get(guild_id).await?;
        let role_ids = member.role_ids();

        let verdict = check_member(ctx.command, member, &role_ids, &settings);
        if !verdict.is_allowed() {
            return Ok(verdict);
        }

        Ok(check_channel(ctx.message, ctx.command, &role_ids, &settings))
    }
}

/// Required permissions, falling back to role overrides by descending rank
fn check_member(
    command: &CommandMetadata,
    member: &MemberSnapshot,
    role_ids: &[Snowflake],
    settings: &GuildSettings,
) -> Verdict {
    let required = command.required_user_permissions;
    if required.is_empty() {
        return Verdict::Allow;
    }

    let Some(available) = member.channel_permissions else {
        return unresolved();
    };
    if available.has(required) {
        return Verdict::Allow;
    }

    let granted = member.roles_by_rank().iter().any(|role| {
        settings
            .role_overrides_for(role.id)
            .any(|o| o.grants(command.name, role_ids))
    });
    if granted {
        return Verdict::Allow;
    }

    Verdict::deny(Identifier::NoPermissions, NO_PERMISSIONS_MESSAGE)
}

/// Moderators pass, everyone else needs a channel override listing the command
fn check_channel(
    message: &IncomingMessage,
    command: &CommandMetadata,
    role_ids: &[Snowflake],
    settings: &GuildSettings,
) -> Verdict {
    if settings.is_moderator(role_ids) {
        return Verdict::Allow;
    }

    let allowed = settings
        .channel_override(&message.channel.lineage())
        .is_some_and(|o| o.allows_command(command.name) && o.admits(role_ids));

    if allowed {
        Verdict::Allow
    } else {
        Verdict::deny(Identifier::CommandDisabledInChannel, DISABLED_IN_CHANNEL_MESSAGE)
    }
}

fn unresolved() -> Verdict {
    Verdict::deny(Identifier::PermissionsUnresolved, UNRESOLVED_PERMISSIONS_MESSAGE)
}
