//! Buffered message entity - a chat message as the bot records it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Returned in place of content the bot never saw
pub const UNKNOWN_CONTENT: &str = "Unknown content.";

/// Message record kept in the write-back buffer and in the `messages` table
///
/// `content` is always the normalized form (custom emoji escaped, user
/// mentions annotated with their id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedMessage {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub author_id: Snowflake,
    pub content: Option<String>,
    pub sticker_id: Option<Snowflake>,
    pub reference_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

impl BufferedMessage {
    /// Create a new, not deleted, message record
    pub fn new(
        id: Snowflake,
        guild_id: Snowflake,
        channel_id: Snowflake,
        author_id: Snowflake,
        content: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            guild_id,
            channel_id,
            author_id,
            content,
            sticker_id: None,
            reference_id: None,
            created_at,
            deleted: false,
        }
    }

    /// Flag the message as deleted, returns false if it already was
    pub fn mark_deleted(&mut self) -> bool {
        !std::mem::replace(&mut self.deleted, true)
    }

    /// Swap the content, returning the previous value or the placeholder
    pub fn replace_content(&mut self, content: String) -> String {
        self.content
            .replace(content)
            .unwrap_or_else(|| UNKNOWN_CONTENT.to_string())
    }

    /// Content for display, falling back to the placeholder
    pub fn content_or_placeholder(&self) -> &str {
        self.content.as_deref().unwrap_or(UNKNOWN_CONTENT)
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reference_id.is_some()
    }

    /// Whether the message was sent by `author_id` in `channel_id`
    #[inline]
    pub fn is_from(&self, author_id: Snowflake, channel_id: Snowflake) -> bool {
        self.author_id == author_id && self.channel_id == channel_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: Option<&str>) -> BufferedMessage {
        BufferedMessage::new(
            Snowflake::new(1),
            Snowflake::new(2),
            Snowflake::new(3),
            Snowflake::new(4),
            content.map(str::to_string),
            Utc::now(),
        )
    }

    #[test]
    fn test_mark_deleted_once() {
        let mut msg = message(Some("hi"));
        assert!(msg.mark_deleted());
        assert!(!msg.mark_deleted());
        assert!(msg.deleted);
    }

    #[test]
    fn test_replace_content_returns_previous() {
        let mut msg = message(Some("old"));
        assert_eq!(msg.replace_content("new".into()), "old");
        assert_eq!(msg.content.as_deref(), Some("new"));
    }

    #[test]
    fn test_replace_missing_content_returns_placeholder() {
        let mut msg = message(None);
        assert_eq!(msg.content_or_placeholder(), UNKNOWN_CONTENT);
        assert_eq!(msg.replace_content("new".into()), UNKNOWN_CONTENT);
    }

    #[test]
    fn test_is_from() {
        let msg = message(None);
        assert!(msg.is_from(Snowflake::new(4), Snowflake::new(3)));
        assert!(!msg.is_from(Snowflake::new(4), Snowflake::new(9)));
    }
}
