use async_trait::async_trait;
use tokio::time::Instant;

use super::heartbeat_ms;
use crate::commands::{Args, Command, CommandCategory, CommandContext, CommandMetadata};
use crate::services::ServiceResult;

static METADATA: CommandMetadata = CommandMetadata {
    aliases: &["pong", "latency", "heartbeat"],
    description: "Get the websocket heartbeat and roundtrip latency.",
    ..CommandMetadata::new("ping", CommandCategory::Utility)
};

/// Measures the time to send a message, not the API latency
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn metadata(&self) -> &CommandMetadata {
        &METADATA
    }

    async fn message_run(&self, ctx: &CommandContext, _args: Args) -> ServiceResult<()> {
        let platform = ctx.services.platform();

        let start = Instant::now();
        let sent = ctx.reply("Pinging...").await?;
        let roundtrip = start.elapsed().as_millis();

        let text = format!(
            "Pong! Roundtrip took: {roundtrip}ms. Heartbeat: {}ms.",
            heartbeat_ms(platform.latency())
        );
        platform.edit(sent.channel_id, sent.id, &text).await?;
        Ok(())
    }
}
