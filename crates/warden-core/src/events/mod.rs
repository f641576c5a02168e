//! Gateway events consumed by the bot

mod gateway_event;

pub use gateway_event::{
    GatewayEvent, GuildEvent, MessageBulkDeleteEvent, MessageDeleteEvent, MessageUpdateEvent,
    ReadyEvent,
};
