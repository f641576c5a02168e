//! Snowflake ID - the chat platform's 64-bit identifier
//!
//! Structure:
//! - Bits 63-22: Timestamp (milliseconds since the platform epoch)
//! - Bits 21-17: Internal worker ID
//! - Bits 16-12: Internal process ID
//! - Bits 11-0:  Increment

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Platform Snowflake ID (64-bit)
///
/// Guilds, channels, users, roles and messages all share this id space.
/// Stored as BIGINT in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Platform epoch: 2015-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: i64 = 1_420_070_400_000;

    /// Create a new Snowflake from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Get the value as the unsigned form the platform API uses
    #[inline]
    pub const fn get(self) -> u64 {
        self.0 as u64
    }

    /// Check if the Snowflake is zero (uninitialized)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Extract timestamp (milliseconds since Unix epoch)
    #[inline]
    pub fn timestamp(&self) -> i64 {
        (self.0 >> 22) + Self::EPOCH
    }

    /// Convert timestamp to DateTime<Utc>
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.timestamp()).unwrap_or_default()
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.parse::<i64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }

    /// Parse a user id given either raw (`123...`) or as a mention (`<@123...>`, `<@!123...>`)
    pub fn parse_user_mention(s: &str) -> Result<Self, SnowflakeParseError> {
        let raw = s
            .strip_prefix("<@")
            .and_then(|rest| rest.strip_suffix('>'))
            .map_or(s, |inner| inner.strip_prefix('!').unwrap_or(inner));

        if !Self::is_valid_str(raw) {
            return Err(SnowflakeParseError::InvalidFormat);
        }
        Self::parse(raw)
    }

    /// Check that a string looks like a platform snowflake (17 to 19 ASCII digits)
    pub fn is_valid_str(s: &str) -> bool {
        (17..=19).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Error when parsing a Snowflake from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Snowflake {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id as i64)
    }
}

impl From<Snowflake> for i64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// Serialize as string, matching the platform's JSON representation
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a snowflake ID")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                value
                    .parse::<i64>()
                    .map(Snowflake)
                    .map_err(|_| de::Error::custom("invalid snowflake string"))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_creation() {
        let sf = Snowflake::new(123456789);
        assert_eq!(sf.into_inner(), 123456789);
        assert_eq!(sf.get(), 123456789);
    }

    #[test]
    fn test_snowflake_zero() {
        assert!(Snowflake::default().is_zero());
        assert!(!Snowflake::new(1).is_zero());
    }

    #[test]
    fn test_snowflake_parse() {
        let sf = Snowflake::parse("123456789").unwrap();
        assert_eq!(sf.into_inner(), 123456789);

        assert!(Snowflake::parse("invalid").is_err());
    }

    #[test]
    fn test_snowflake_timestamp_uses_platform_epoch() {
        // 175928847299117063 is the id used in the platform's own documentation
        let sf = Snowflake::new(175_928_847_299_117_063);
        assert_eq!(sf.timestamp(), 1_462_015_105_796);
        assert_eq!(sf.created_at().timestamp_millis(), 1_462_015_105_796);
    }

    #[test]
    fn test_parse_user_mention() {
        let expected = Snowflake::new(175_928_847_299_117_063);
        assert_eq!(Snowflake::parse_user_mention("175928847299117063").unwrap(), expected);
        assert_eq!(Snowflake::parse_user_mention("<@175928847299117063>").unwrap(), expected);
        assert_eq!(Snowflake::parse_user_mention("<@!175928847299117063>").unwrap(), expected);
        assert!(Snowflake::parse_user_mention("<@&175928847299117063>").is_err());
        assert!(Snowflake::parse_user_mention("12345").is_err());
        assert!(Snowflake::parse_user_mention("someone").is_err());
    }

    #[test]
    fn test_is_valid_str() {
        assert!(Snowflake::is_valid_str("12345678901234567"));
        assert!(Snowflake::is_valid_str("1234567890123456789"));
        assert!(!Snowflake::is_valid_str("1234567890123456"));
        assert!(!Snowflake::is_valid_str("12345678901234567890"));
        assert!(!Snowflake::is_valid_str("1234567890123456a"));
    }

    #[test]
    fn test_snowflake_serialize_json() {
        let sf = Snowflake::new(123456789012345678);
        let json = serde_json::to_string(&sf).unwrap();
        assert_eq!(json, "\"123456789012345678\"");
    }

    #[test]
    fn test_snowflake_deserialize_string() {
        let sf: Snowflake = serde_json::from_str("\"123456789012345678\"").unwrap();
        assert_eq!(sf.into_inner(), 123456789012345678);
    }

    #[test]
    fn test_snowflake_deserialize_number() {
        let sf: Snowflake = serde_json::from_str("12345").unwrap();
        assert_eq!(sf.into_inner(), 12345);
    }

    #[test]
    fn test_snowflake_ordering() {
        assert!(Snowflake::new(100) < Snowflake::new(200));
    }
}
