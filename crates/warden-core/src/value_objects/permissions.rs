//! Permission bitflags using the chat platform's bit layout
//!
//! Only the flags the bot reads or requires are named; unknown bits coming
//! from the platform are preserved when converting from raw values.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Platform permission flags
    ///
    /// Serialized as a decimal string, the same way the platform sends them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        /// Kick members from guild
        const KICK_MEMBERS     = 1 << 1;
        /// Ban members from guild
        const BAN_MEMBERS      = 1 << 2;
        /// Bypass all permission checks
        const ADMINISTRATOR    = 1 << 3;
        /// Create, edit, delete channels
        const MANAGE_CHANNELS  = 1 << 4;
        /// Edit guild settings
        const MANAGE_GUILD     = 1 << 5;
        /// Add emoji reactions
        const ADD_REACTIONS    = 1 << 6;
        /// Read the audit log
        const VIEW_AUDIT_LOG   = 1 << 7;
        /// View channel and read messages
        const VIEW_CHANNEL     = 1 << 10;
        /// Send messages in text channels
        const SEND_MESSAGES    = 1 << 11;
        /// Delete other users' messages
        const MANAGE_MESSAGES  = 1 << 13;
        /// Send embeds
        const EMBED_LINKS      = 1 << 14;
        /// Upload files and images
        const ATTACH_FILES     = 1 << 15;
        /// Read message history
        const READ_MESSAGE_HISTORY = 1 << 16;
        /// Create, edit, delete, assign roles
        const MANAGE_ROLES     = 1 << 28;
        /// Time out members
        const MODERATE_MEMBERS = 1 << 40;

        /// Minimum the bot needs in a channel before it reacts to commands
        const RESPOND = Self::VIEW_CHANNEL.bits() | Self::SEND_MESSAGES.bits();

        const _ = !0;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Check if the permission set has any of the given permissions
    #[inline]
    pub fn has_any(&self, permissions: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.intersects(permissions)
    }

    /// Combine permissions from multiple roles
    pub fn combine<I>(roles: I) -> Self
    where
        I: IntoIterator<Item = Permissions>,
    {
        roles.into_iter().fold(Permissions::empty(), |acc, p| acc | p)
    }

    /// Get the raw bits as i64 (for database storage)
    #[inline]
    pub fn to_i64(self) -> i64 {
        self.bits() as i64
    }

    /// Create from raw i64 bits (from database)
    #[inline]
    pub fn from_i64(bits: i64) -> Self {
        Permissions::from_bits_retain(bits as u64)
    }

    /// Parse from string representation (decimal number)
    pub fn parse(s: &str) -> Result<Self, std::num::ParseIntError> {
        s.parse::<u64>().map(Permissions::from_bits_retain)
    }

    /// Human readable names of the named flags that are set
    pub fn list(&self) -> Vec<&'static str> {
        const NAMES: &[(Permissions, &str)] = &[
            (Permissions::KICK_MEMBERS, "Kick Members"),
            (Permissions::BAN_MEMBERS, "Ban Members"),
            (Permissions::ADMINISTRATOR, "Administrator"),
            (Permissions::MANAGE_CHANNELS, "Manage Channels"),
            (Permissions::MANAGE_GUILD, "Manage Server"),
            (Permissions::ADD_REACTIONS, "Add Reactions"),
            (Permissions::VIEW_AUDIT_LOG, "View Audit Log"),
            (Permissions::VIEW_CHANNEL, "View Channel"),
            (Permissions::SEND_MESSAGES, "Send Messages"),
            (Permissions::MANAGE_MESSAGES, "Manage Messages"),
            (Permissions::EMBED_LINKS, "Embed Links"),
            (Permissions::ATTACH_FILES, "Attach Files"),
            (Permissions::READ_MESSAGE_HISTORY, "Read Message History"),
            (Permissions::MANAGE_ROLES, "Manage Roles"),
            (Permissions::MODERATE_MEMBERS, "Timeout Members"),
        ];

        NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value as u64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_retain(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_retain)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

impl From<u64> for Permissions {
    fn from(bits: u64) -> Self {
        Permissions::from_bits_retain(bits)
    }
}

impl From<Permissions> for u64 {
    fn from(perms: Permissions) -> Self {
        perms.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_bit_values() {
        assert_eq!(Permissions::ADMINISTRATOR.bits(), 0x8);
        assert_eq!(Permissions::VIEW_CHANNEL.bits(), 0x400);
        assert_eq!(Permissions::SEND_MESSAGES.bits(), 0x800);
        assert_eq!(Permissions::MANAGE_MESSAGES.bits(), 0x2000);
        assert_eq!(Permissions::MANAGE_ROLES.bits(), 0x1000_0000);
        assert_eq!(Permissions::MODERATE_MEMBERS.bits(), 0x100_0000_0000);
    }

    #[test]
    fn test_administrator_bypass() {
        let admin = Permissions::ADMINISTRATOR;
        assert!(admin.has(Permissions::VIEW_CHANNEL));
        assert!(admin.has(Permissions::MANAGE_GUILD));
        assert!(admin.has(Permissions::MODERATE_MEMBERS));
    }

    #[test]
    fn test_has_permission() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert!(perms.has(Permissions::RESPOND));
        assert!(!perms.has(Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_has_any() {
        let check = Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD;
        assert!(Permissions::VIEW_CHANNEL.has_any(check));
        assert!(!Permissions::SEND_MESSAGES.has_any(check));
    }

    #[test]
    fn test_combine_permissions() {
        let combined = Permissions::combine([
            Permissions::VIEW_CHANNEL,
            Permissions::SEND_MESSAGES,
            Permissions::MANAGE_GUILD,
        ]);
        assert!(combined.contains(Permissions::RESPOND | Permissions::MANAGE_GUILD));
    }

    #[test]
    fn test_unknown_bits_are_retained() {
        let raw = (1u64 << 50) | Permissions::VIEW_CHANNEL.bits();
        let perms = Permissions::from(raw);
        assert_eq!(u64::from(perms), raw);
        assert_eq!(Permissions::from_i64(perms.to_i64()), perms);
    }

    #[test]
    fn test_serde_as_string() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert_eq!(serde_json::to_string(&perms).unwrap(), "\"3072\"");

        let parsed: Permissions = serde_json::from_str("\"3072\"").unwrap();
        assert_eq!(parsed, perms);
        let parsed: Permissions = serde_json::from_str("3072").unwrap();
        assert_eq!(parsed, perms);
    }

    #[test]
    fn test_list_permissions() {
        let list = (Permissions::VIEW_CHANNEL | Permissions::MODERATE_MEMBERS).list();
        assert_eq!(list, vec!["View Channel", "Timeout Members"]);
    }

    #[test]
    fn test_parse() {
        let perms = Permissions::parse("8").unwrap();
        assert_eq!(perms, Permissions::ADMINISTRATOR);
        assert!(Permissions::parse("x").is_err());
    }
}
