//! Serenity event handler
//!
//! Translates client callbacks into [`GatewayEvent`]s and forwards them to
//! the dispatcher. Nothing is handled here.

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::event::MessageUpdateEvent as SerenityMessageUpdate;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::{ChannelId, GuildId, MessageId};
use serenity::prelude::{Context, EventHandler};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use warden_core::events::{
    GuildEvent, MessageBulkDeleteEvent, MessageDeleteEvent, MessageUpdateEvent, ReadyEvent,
};
use warden_core::GatewayEvent;

use super::convert::{incoming_message, snowflake};

/// Forwards platform events into the dispatch channel
pub struct GatewayHandler {
    events: mpsc::Sender<GatewayEvent>,
}

impl GatewayHandler {
    pub fn new(events: mpsc::Sender<GatewayEvent>) -> Self {
        Self { events }
    }

    async fn forward(&self, event: GatewayEvent) {
        let event_type = event.event_type();
        if self.events.send(event).await.is_err() {
            error!(event_type, "Event dispatcher is gone, dropping event");
        }
    }
}

#[async_trait]
impl EventHandler for GatewayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.forward(GatewayEvent::Ready(ReadyEvent {
            user_id: snowflake(ready.user.id),
            username: ready.user.name.clone(),
            guild_count: ready.guilds.len(),
        }))
        .await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        self.forward(GatewayEvent::GuildCreate(GuildEvent { guild_id: snowflake(guild.id) }))
            .await;
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        if incomplete.unavailable {
            warn!(guild_id = %incomplete.id, "Guild became unavailable");
            return;
        }
        self.forward(GatewayEvent::GuildDelete(GuildEvent { guild_id: snowflake(incomplete.id) }))
            .await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let bot_id = ctx.cache.current_user().id;
        let message = {
            let guild = msg.guild_id.and_then(|id| ctx.cache.guild(id));
            if msg.guild_id.is_some() && guild.is_none() {
                debug!(message_id = %msg.id, "Guild not cached, member state unknown");
            }
            incoming_message(&msg, guild.as_deref(), bot_id)
        };

        self.forward(GatewayEvent::MessageCreate(Box::new(message))).await;
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old: Option<Message>,
        _new: Option<Message>,
        event: SerenityMessageUpdate,
    ) {
        self.forward(GatewayEvent::MessageUpdate(MessageUpdateEvent {
            id: snowflake(event.id),
            channel_id: snowflake(event.channel_id),
            guild_id: event.guild_id.map(snowflake),
            content: event.content,
        }))
        .await;
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        self.forward(GatewayEvent::MessageDelete(MessageDeleteEvent {
            id: snowflake(deleted_message_id),
            channel_id: snowflake(channel_id),
            guild_id: guild_id.map(snowflake),
        }))
        .await;
    }

    async fn message_delete_bulk(
        &self,
        _ctx: Context,
        channel_id: ChannelId,
        multiple_deleted_messages_ids: Vec<MessageId>,
        guild_id: Option<GuildId>,
    ) {
        self.forward(GatewayEvent::MessageBulkDelete(MessageBulkDeleteEvent {
            ids: multiple_deleted_messages_ids.into_iter().map(snowflake).collect(),
            channel_id: snowflake(channel_id),
            guild_id: guild_id.map(snowflake),
        }))
        .await;
    }
}
