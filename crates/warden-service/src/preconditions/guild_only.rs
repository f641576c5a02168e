use async_trait::async_trait;

use super::{Identifier, Precondition, PreconditionContext, Verdict};
use crate::services::ServiceResult;

/// Commands that only make sense inside a guild
pub struct GuildOnlyPrecondition;

#[async_trait]
impl Precondition for GuildOnlyPrecondition {
    fn name(&self) -> &'static str {
        "GuildOnly"
    }

    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        if ctx.message.in_guild() {
            Ok(Verdict::Allow)
        } else {
            Ok(Verdict::deny(
                Identifier::GuildOnly,
                "This command can only be used in a server.",
            ))
        }
    }
}
