use async_trait::async_trait;

use super::{Identifier, Precondition, PreconditionContext, Verdict};
use crate::services::ServiceResult;

/// Developer-only commands, checked against the static allow-list
pub struct GuardedPrecondition;

#[async_trait]
impl Precondition for GuardedPrecondition {
    fn name(&self) -> &'static str {
        "Guarded"
    }

    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        if !ctx.command.guarded || ctx.services.config().is_developer(ctx.message.author.id) {
            return Ok(Verdict::Allow);
        }

        Ok(Verdict::deny(
            Identifier::Silent,
            "This command is only available to developers.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandCategory, CommandMetadata};
    use crate::testing::{guild_message, TestServices, DEVELOPER_ID, MEMBER_ID};

    fn guarded() -> CommandMetadata {
        CommandMetadata {
            guarded: true,
            ..CommandMetadata::new("stats", CommandCategory::Developer)
        }
    }

    #[tokio::test]
    async fn test_non_developer_is_denied_silently() {
        let harness = TestServices::new();
        let message = guild_message(10, MEMBER_ID, ">stats");
        let command = guarded();
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };

        let Verdict::Deny(denial) = GuardedPrecondition.check(&ctx).await.unwrap() else {
            panic!("expected a denial");
        };
        assert_eq!(denial.identifier, Identifier::Silent);
        assert_eq!(harness.guild_repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_developer_and_unguarded_pass() {
        let harness = TestServices::new();
        let command = guarded();

        let message = guild_message(10, DEVELOPER_ID, ">stats");
        let ctx = PreconditionContext { message: &message, command: &command, services: &harness.services };
        assert!(GuardedPrecondition.check(&ctx).await.unwrap().is_allowed());

        let open = CommandMetadata::new("ping", CommandCategory::Utility);
        let message = guild_message(11, MEMBER_ID, ">ping");
        let ctx = PreconditionContext { message: &message, command: &open, services: &harness.services };
        assert!(GuardedPrecondition.check(&ctx).await.unwrap().is_allowed());
    }
}
