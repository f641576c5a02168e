//! Prefix resolution
//!
//! First match wins: a mention of the bot, the natural language regex
//! prefix, then the guild's (or the global) string prefix.

use regex::{Regex, RegexBuilder};
use warden_common::CommandSettings;
use warden_core::entities::ClientSnapshot;
use warden_core::value_objects::Snowflake;

/// Shortest content that can hold a mention of a snowflake
const MIN_MENTION_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixKind {
    Mention,
    Regex,
    Configured,
}

/// Outcome of prefix resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixResolution<'a> {
    /// The message is nothing but a mention of the bot
    MentionOnly,
    Matched {
        kind: PrefixKind,
        /// Prefix text as written in the message
        prefix: &'a str,
        /// Content after the prefix, untrimmed
        remainder: &'a str,
    },
    NotPrefixed,
}

#[derive(Debug, Clone)]
pub struct PrefixResolver {
    regex_prefix: Option<Regex>,
    default_prefix: String,
    case_insensitive: bool,
}

impl PrefixResolver {
    pub fn new(settings: &CommandSettings) -> Result<Self, regex::Error> {
        let regex_prefix = if settings.regex_prefix.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&settings.regex_prefix)
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            regex_prefix,
            default_prefix: settings.prefix.clone(),
            case_insensitive: settings.case_insensitive_prefixes,
        })
    }

    /// Prefix used outside guilds
    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Try the mention and regex prefixes, which need no guild settings
    pub fn resolve_static<'a>(
        &self,
        content: &'a str,
        client: &ClientSnapshot,
    ) -> Option<PrefixResolution<'a>> {
        if let Some(end) = mention_prefix_len(content, client) {
            if end == content.len() {
                return Some(PrefixResolution::MentionOnly);
            }
            return Some(PrefixResolution::Matched {
                kind: PrefixKind::Mention,
                prefix: &content[..end],
                remainder: &content[end..],
            });
        }

        let found = self.regex_prefix.as_ref()?.find(content)?;
        (found.start() == 0).then(|| PrefixResolution::Matched {
            kind: PrefixKind::Regex,
            prefix: found.as_str(),
            remainder: &content[found.end()..],
        })
    }

    /// Match the string prefix, `guild_prefix` falls back to the global one
    pub fn resolve_configured<'a>(
        &self,
        content: &'a str,
        guild_prefix: Option<&str>,
    ) -> PrefixResolution<'a> {
        let prefix = guild_prefix.unwrap_or(&self.default_prefix);
        if prefix.is_empty() {
            return PrefixResolution::NotPrefixed;
        }

        let Some(head) = content.get(..prefix.len()) else {
            return PrefixResolution::NotPrefixed;
        };
        let matches = if self.case_insensitive {
            head.to_lowercase() == prefix.to_lowercase()
        } else {
            head == prefix
        };

        if matches {
            PrefixResolution::Matched {
                kind: PrefixKind::Configured,
                prefix: head,
                remainder: &content[prefix.len()..],
            }
        } else {
            PrefixResolution::NotPrefixed
        }
    }
}

/// Byte length of a leading `<@id>`, `<@!id>` or `<@&managed_role>` mention of the bot
fn mention_prefix_len(content: &str, client: &ClientSnapshot) -> Option<usize> {
    if content.len() < MIN_MENTION_LEN || !content.starts_with("<@") {
        return None;
    }

    let (offset, expected) = if content.starts_with("<@&") {
        (3, client.managed_role_id?)
    } else if content.starts_with("<@!") {
        (3, client.user_id)
    } else {
        (2, client.user_id)
    };

    let close = offset + content[offset..].find('>')?;
    let id: Snowflake = content[offset..close].parse().ok()?;
    (id == expected).then_some(close + 1)
}
