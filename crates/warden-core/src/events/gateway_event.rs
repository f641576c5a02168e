//! Gateway events - the closed set of platform notifications the bot reacts to
//!
//! The platform adapter translates client callbacks into these values and
//! pushes them through a single channel, so every event is handled by one
//! `match` in the dispatcher.

use serde::{Deserialize, Serialize};

use crate::entities::IncomingMessage;
use crate::value_objects::Snowflake;

/// All platform events handled by the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEvent {
    // =========================================================================
    // Session
    // =========================================================================
    Ready(ReadyEvent),

    // =========================================================================
    // Guild Events
    // =========================================================================
    GuildCreate(GuildEvent),
    GuildDelete(GuildEvent),

    // =========================================================================
    // Message Events
    // =========================================================================
    MessageCreate(Box<IncomingMessage>),
    MessageUpdate(MessageUpdateEvent),
    MessageDelete(MessageDeleteEvent),
    MessageBulkDelete(MessageBulkDeleteEvent),
}

impl GatewayEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::GuildCreate(_) => "GUILD_CREATE",
            Self::GuildDelete(_) => "GUILD_DELETE",
            Self::MessageCreate(_) => "MESSAGE_CREATE",
            Self::MessageUpdate(_) => "MESSAGE_UPDATE",
            Self::MessageDelete(_) => "MESSAGE_DELETE",
            Self::MessageBulkDelete(_) => "MESSAGE_BULK_DELETE",
        }
    }

    /// Guild the event belongs to, if any
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::Ready(_) => None,
            Self::GuildCreate(e) | Self::GuildDelete(e) => Some(e.guild_id),
            Self::MessageCreate(m) => m.guild_id,
            Self::MessageUpdate(e) => e.guild_id,
            Self::MessageDelete(e) => e.guild_id,
            Self::MessageBulkDelete(e) => e.guild_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    pub user_id: Snowflake,
    pub username: String,
    pub guild_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildEvent {
    pub guild_id: Snowflake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdateEvent {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    /// New content, `None` when the update did not touch the content
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeleteEvent {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBulkDeleteEvent {
    pub ids: Vec<Snowflake>,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GatewayEvent::GuildDelete(GuildEvent {
            guild_id: Snowflake::new(123),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"GUILD_DELETE\""));
        assert!(json.contains("\"guild_id\":\"123\""));
    }

    #[test]
    fn test_event_type_and_guild() {
        let event = GatewayEvent::MessageDelete(MessageDeleteEvent {
            id: Snowflake::new(1),
            channel_id: Snowflake::new(2),
            guild_id: Some(Snowflake::new(3)),
        });
        assert_eq!(event.event_type(), "MESSAGE_DELETE");
        assert_eq!(event.guild_id(), Some(Snowflake::new(3)));

        let ready = GatewayEvent::Ready(ReadyEvent {
            user_id: Snowflake::new(1),
            username: "warden".into(),
            guild_count: 0,
        });
        assert_eq!(ready.guild_id(), None);
    }
}
