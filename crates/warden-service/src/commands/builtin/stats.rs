use async_trait::async_trait;
use tokio::time::Instant;

use super::heartbeat_ms;
use crate::commands::{Args, Command, CommandCategory, CommandContext, CommandMetadata};
use crate::services::ServiceResult;

static METADATA: CommandMetadata = CommandMetadata {
    aliases: &["health"],
    description: "Get the bot's statistics.",
    guarded: true,
    ..CommandMetadata::new("stats", CommandCategory::Developer)
};

pub struct StatsCommand;

#[async_trait]
impl Command for StatsCommand {
    fn metadata(&self) -> &CommandMetadata {
        &METADATA
    }

    async fn message_run(&self, ctx: &CommandContext, _args: Args) -> ServiceResult<()> {
        let services = &ctx.services;

        // One round trip to the database as a rough estimate of its latency
        let start = Instant::now();
        let database = match services.store_health().ping().await {
            Ok(()) => format!("{}ms", start.elapsed().as_millis()),
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                "unreachable".to_string()
            }
        };

        let report = format!(
            "**Statistics Report**\n\
             \\- Cached guilds: `{}`\n\
             \\- Buffered messages: `{}`\n\
             \\- Database heartbeat: `{database}`\n\
             \\- Client heartbeat: `{}ms`",
            services.guilds().len(),
            services.messages().size(),
            heartbeat_ms(services.platform().latency()),
        );

        ctx.reply(&report).await?;
        Ok(())
    }
}
