//! Infraction entity - a moderation action recorded against a member

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Snowflake;

/// Kind of moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfractionType {
    Warn,
    Mute,
    Kick,
    Ban,
    Unmute,
    Unban,
}

impl InfractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "Warn",
            Self::Mute => "Mute",
            Self::Kick => "Kick",
            Self::Ban => "Ban",
            Self::Unmute => "Unmute",
            Self::Unban => "Unban",
        }
    }

    /// Verb used in user facing messages ("You cannot warn yourself.")
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
            Self::Unmute => "unmute",
            Self::Unban => "unban",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Warn => "warned",
            Self::Mute => "muted",
            Self::Kick => "kicked",
            Self::Ban => "banned",
            Self::Unmute => "unmuted",
            Self::Unban => "unbanned",
        }
    }

    /// Preposition joining the action and the guild name
    pub fn preposition(&self) -> &'static str {
        match self {
            Self::Ban | Self::Kick | Self::Unban => "from",
            _ => "in",
        }
    }

    /// Parse from the database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Warn" => Some(Self::Warn),
            "Mute" => Some(Self::Mute),
            "Kick" => Some(Self::Kick),
            "Ban" => Some(Self::Ban),
            "Unmute" => Some(Self::Unmute),
            "Unban" => Some(Self::Unban),
            _ => None,
        }
    }
}

impl fmt::Display for InfractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored infraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Infraction {
    pub id: i64,
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub moderator_id: Snowflake,
    pub kind: InfractionType,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Infraction {
    pub const REASON_MAX_LENGTH: usize = 1000;
    pub const DEFAULT_REASON: &'static str = "Unspecified.";

    /// Whether the infraction has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Infraction data before the database assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInfraction {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub moderator_id: Snowflake,
    pub kind: InfractionType,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_type_round_trips_through_str() {
        for kind in [
            InfractionType::Warn,
            InfractionType::Mute,
            InfractionType::Kick,
            InfractionType::Ban,
            InfractionType::Unmute,
            InfractionType::Unban,
        ] {
            assert_eq!(InfractionType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(InfractionType::parse("warn"), None);
    }

    #[test]
    fn test_preposition() {
        assert_eq!(InfractionType::Warn.preposition(), "in");
        assert_eq!(InfractionType::Ban.preposition(), "from");
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut infraction = Infraction {
            id: 1,
            guild_id: Snowflake::new(1),
            user_id: Snowflake::new(2),
            moderator_id: Snowflake::new(3),
            kind: InfractionType::Warn,
            reason: Infraction::DEFAULT_REASON.into(),
            created_at: now,
            expires_at: None,
        };
        assert!(!infraction.is_expired_at(now + Duration::days(365)));

        infraction.expires_at = Some(now + Duration::hours(1));
        assert!(!infraction.is_expired_at(now));
        assert!(infraction.is_expired_at(now + Duration::hours(2)));
    }
}
