use async_trait::async_trait;
use warden_core::value_objects::Permissions;

use super::{Identifier, Precondition, PreconditionContext, Verdict};
use crate::services::ServiceResult;

/// The bot's own permissions in the invocation channel
pub struct ClientPermissionsPrecondition;

#[async_trait]
impl Precondition for ClientPermissionsPrecondition {
    fn name(&self) -> &'static str {
        "ClientPermissions"
    }

    fn position(&self) -> u32 {
        10
    }

    async fn check(&self, ctx: &PreconditionContext<'_>) -> ServiceResult<Verdict> {
        let required = ctx.command.required_client_permissions;
        if required.is_empty() || !ctx.message.in_guild() {
            return Ok(Verdict::Allow);
        }

        let available = ctx.message.client.channel_permissions.unwrap_or_default();
        if available.has(required) {
            return Ok(Verdict::Allow);
        }

        Ok(Verdict::deny(Identifier::ClientPermissions, missing_message(required, available)))
    }
}

fn missing_message(required: Permissions, available: Permissions) -> String {
    let missing = required.difference(available);
    format!(
        "I am missing the following permissions to run this command: {}.",
        missing.list().join(", ")
    )
}
