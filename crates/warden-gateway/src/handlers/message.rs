use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, trace};
use warden_cache::clean_content;
use warden_core::entities::IncomingMessage;
use warden_core::events::{MessageBulkDeleteEvent, MessageDeleteEvent, MessageUpdateEvent};
use warden_core::value_objects::Snowflake;
use warden_service::{CommandDispatcher, DispatchOutcome, ServiceContext};

use crate::error::GatewayResult;

/// New message: run it through the command pipeline, then buffer it
///
/// The command runs on its own task so a slow command never holds up the
/// event loop. The buffer entry is written before this returns, so later
/// edits and deletions of the same message always find it.
pub fn on_message_create(
    commands: &Arc<CommandDispatcher>,
    message: IncomingMessage,
) -> JoinHandle<DispatchOutcome> {
    let message = Arc::new(message);

    let dispatcher = Arc::clone(commands);
    let invocation = Arc::clone(&message);
    let dispatch = tokio::spawn(async move { dispatcher.handle_message(invocation).await });

    if commands.services().messages().queue(&message) {
        trace!(message_id = %message.id, "Message buffered");
    }
    dispatch
}

/// Edited message: swap the stored content
pub async fn on_message_update(
    services: &ServiceContext,
    event: MessageUpdateEvent,
) -> GatewayResult<()> {
    let (Some(_), Some(content)) = (event.guild_id, event.content) else {
        return Ok(());
    };

    let content = clean_content(&content);
    let previous = services
        .messages()
        .update_content(event.id, content.clone())
        .await?;

    debug!(message_id = %event.id, old = %previous, new = %content, "Message edited");
    Ok(())
}

/// Deleted message: flag it and try to work out who deleted it
///
/// Returns the moderator the deletion is attributed to, if any.
pub async fn on_message_delete(
    services: &ServiceContext,
    event: MessageDeleteEvent,
) -> GatewayResult<Option<Snowflake>> {
    let Some(guild_id) = event.guild_id else {
        return Ok(None);
    };

    let Some(message) = services.messages().delete(event.id).await? else {
        debug!(message_id = %event.id, "Deleted message was never recorded");
        return Ok(None);
    };

    let executor = services
        .platform()
        .latest_message_delete_entry(guild_id)
        .await?
        .filter(|entry| message.is_from(entry.target_id, entry.channel_id))
        .and_then(|entry| services.audit().attribute_deletion(entry));

    match executor {
        Some(executor_id) => info!(
            guild_id = %guild_id,
            message_id = %message.id,
            author_id = %message.author_id,
            executor_id = %executor_id,
            "Message deleted by moderator"
        ),
        None => debug!(
            guild_id = %guild_id,
            message_id = %message.id,
            author_id = %message.author_id,
            "Message deleted"
        ),
    }
    Ok(executor)
}

/// Purged messages: flag the whole batch
pub async fn on_message_bulk_delete(
    services: &ServiceContext,
    event: MessageBulkDeleteEvent,
) -> GatewayResult<()> {
    let Some(guild_id) = event.guild_id else {
        return Ok(());
    };

    let deleted = services.messages().delete_many(&event.ids).await?;
    info!(
        guild_id = %guild_id,
        channel_id = %event.channel_id,
        requested = event.ids.len(),
        deleted = deleted.len(),
        "Messages bulk deleted"
    );
    Ok(())
}
