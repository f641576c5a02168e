//! Message database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for messages table
#[derive(Debug, Clone, FromRow)]
pub struct MessageModel {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub author_id: i64,
    pub content: Option<String>,
    pub sticker_id: Option<i64>,
    pub reference_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

impl MessageModel {
    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reference_id.is_some()
    }
}

