use async_trait::async_trait;

use super::{Identifier, Precondition, PreconditionContext, Verdict};
use crate::commands::CommandCategory;
use crate::services::ServiceResult;

/// Commands a guild switched off
pub struct EnabledPrecondition;

#[async_trait]
impl Precondition for EnabledPrecondition {
    fn name(&self) -> &'static str {
        "Enabled"
    }

    fn position(&self) -> u32 {
        10
    }

    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        if ctx.command.category == CommandCategory::Developer {
            return Ok(Verdict::Allow);
        }
        let Some(guild_id) = ctx.message.guild_id else {
            return Ok(Verdict::Allow);
        };

        let settings = ctx.services.guilds().get(guild_id).await?;
        if settings.is_disabled(ctx.command.name) {
            return Ok(Verdict::deny(
                Identifier::CommandDisabled,
                "This command is disabled in this server.",
            ));
        }

        Ok(Verdict::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandMetadata;
    use crate::testing::{direct_message, guild_message, TestServices, GUILD_ID, MEMBER_ID};
    use warden_core::entities::GuildSettings;
    use warden_core::value_objects::Snowflake;

    #[tokio::test]
    async fn test_disabled_command_is_denied() {
        let harness = TestServices::new();
        let mut settings = GuildSettings::new(Snowflake::new(GUILD_ID));
        settings.disable_command("warn");
        harness.guild_repo.put(settings);

        let message = guild_message(10, MEMBER_ID, ">warn");
        let command = CommandMetadata::new("warn", CommandCategory::Moderation);
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };

        assert_eq!(
            EnabledPrecondition.check(&ctx).await.unwrap(),
            Verdict::deny(Identifier::CommandDisabled, "This command is disabled in this server.")
        );
    }

    #[tokio::test]
    async fn test_dm_and_developer_skip_storage() {
        let harness = TestServices::new();

        let message = direct_message(10, MEMBER_ID, ">ping");
        let command = CommandMetadata::new("ping", CommandCategory::Utility);
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };
        assert!(EnabledPrecondition.check(&ctx).await.unwrap().is_allowed());

        let message = guild_message(11, MEMBER_ID, ">stats");
        let command = CommandMetadata::new("stats", CommandCategory::Developer);
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };
        assert!(EnabledPrecondition.check(&ctx).await.unwrap().is_allowed());

        assert_eq!(harness.guild_repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let harness = TestServices::new();
        harness.guild_repo.fail_next();

        let message = guild_message(10, MEMBER_ID, ">ping");
        let command = CommandMetadata::new("ping", CommandCategory::Utility);
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };
        assert!(EnabledPrecondition.check(&ctx).await.is_err());
    }
}
