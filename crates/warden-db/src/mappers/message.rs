//! BufferedMessage entity <-> model mapper

use chrono::{DateTime, Utc};
use warden_core::entities::BufferedMessage;
use warden_core::value_objects::Snowflake;

use crate::models::MessageModel;

/// Convert MessageModel to BufferedMessage entity
impl From<MessageModel> for BufferedMessage {
    fn from(model: MessageModel) -> Self {
        BufferedMessage {
            id: Snowflake::new(model.id),
            guild_id: Snowflake::new(model.guild_id),
            channel_id: Snowflake::new(model.channel_id),
            author_id: Snowflake::new(model.author_id),
            content: model.content,
            sticker_id: model.sticker_id.map(Snowflake::new),
            reference_id: model.reference_id.map(Snowflake::new),
            created_at: model.created_at,
            deleted: model.deleted,
        }
    }
}

/// A batch of messages split into one array per column, for `UNNEST` inserts
#[derive(Debug, Default)]
pub struct MessageColumns {
    pub ids: Vec<i64>,
    pub guild_ids: Vec<i64>,
    pub channel_ids: Vec<i64>,
    pub author_ids: Vec<i64>,
    pub contents: Vec<Option<String>>,
    pub sticker_ids: Vec<Option<i64>>,
    pub reference_ids: Vec<Option<i64>>,
    pub created_ats: Vec<DateTime<Utc>>,
    pub deleted: Vec<bool>,
}

impl MessageColumns {
    pub fn new(messages: &[BufferedMessage]) -> Self {
        let mut columns = Self::default();
        for message in messages {
            columns.ids.push(message.id.into_inner());
            columns.guild_ids.push(message.guild_id.into_inner());
            columns.channel_ids.push(message.channel_id.into_inner());
            columns.author_ids.push(message.author_id.into_inner());
            columns.contents.push(message.content.clone());
            columns.sticker_ids.push(message.sticker_id.map(Snowflake::into_inner));
            columns.reference_ids.push(message.reference_id.map(Snowflake::into_inner));
            columns.created_ats.push(message.created_at);
            columns.deleted.push(message.deleted);
        }
        columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
