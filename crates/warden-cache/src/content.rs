//! Message content normalization
//!
//! Buffered and stored content never carries raw custom emoji markup, and
//! user mentions are annotated with the numeric id so the text stays
//! readable after the user leaves or renames.

use std::sync::LazyLock;

use regex::Regex;
use warden_core::entities::{BufferedMessage, IncomingMessage};

static CUSTOM_EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(a?):([^:\n\r]+):(\d{17,19})>").expect("hardcoded custom emoji regex")
});

static USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?(\d{17,19})>").expect("hardcoded user mention regex"));

/// Escape custom emoji markup and annotate user mentions
pub fn clean_content(content: &str) -> String {
    let escaped = CUSTOM_EMOJI.replace_all(content, r"<$1\:$2\:$3>");
    USER_MENTION.replace_all(&escaped, "<@$1> ($1)").into_owned()
}

/// Build the buffered form of a guild message
///
/// Returns `None` for messages sent outside a guild.
pub fn serialize_message(message: &IncomingMessage) -> Option<BufferedMessage> {
    let guild_id = message.guild_id?;
    let content = if message.content.is_empty() {
        None
    } else {
        Some(clean_content(&message.content))
    };

    let mut buffered = BufferedMessage::new(
        message.id,
        guild_id,
        message.channel.id,
        message.author.id,
        content,
        message.created_at,
    );
    buffered.sticker_id = message.sticker_id;
    buffered.reference_id = message.reference_id;
    Some(buffered)
}
