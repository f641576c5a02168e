//! Global (process wide) configuration
//!
//! Loaded once at startup from `warden.cfg.yml` plus `WARDEN__*` environment
//! overrides. Secrets never live in the file, they come from the environment.

use serde::Deserialize;
use std::env;
use std::path::Path;
use validator::{Validate, ValidationError};
use warden_core::Snowflake;

use super::cron_spec::CronSpec;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "warden.cfg.yml";

/// Static configuration read from the YAML file
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GlobalConfig {
    #[validate(nested)]
    pub database: DatabaseSettings,
    #[serde(default)]
    #[validate(nested)]
    pub commands: CommandSettings,
    /// Users allowed to run developer-only commands
    #[serde(default, deserialize_with = "deserialize_developers")]
    pub developers: Vec<Snowflake>,
}

/// Storage and persistence schedules
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatabaseSettings {
    #[validate(nested)]
    pub messages: MessageSettings,
    /// Full clear of the guild settings cache
    #[serde(default = "CronSpec::hourly")]
    pub config_cache_delete_cron: CronSpec,
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1, message = "max_connections must be at least 1"))]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Message buffer schedules
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageSettings {
    /// Flush the buffer into the database
    pub insert_cron: CronSpec,
    /// Remove messages older than `ttl`
    pub delete_cron: CronSpec,
    /// How long messages are kept, in milliseconds
    #[serde(default = "default_message_ttl")]
    #[validate(range(min = 1000, message = "ttl must be at least 1000 ms"))]
    pub ttl: u64,
}

/// Command prefix settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommandSettings {
    /// Prefix used outside of guilds and for guilds without a record
    #[serde(default = "default_prefix")]
    #[validate(length(min = 1, max = 10, message = "prefix must be 1-10 characters"))]
    pub prefix: String,
    /// Natural language prefix, matched case-insensitively at the start of a message
    #[serde(default = "default_regex_prefix")]
    #[validate(custom(function = "validate_regex"))]
    pub regex_prefix: String,
    #[serde(default = "default_true")]
    pub case_insensitive_prefixes: bool,
    #[serde(default = "default_true")]
    pub case_insensitive_commands: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            regex_prefix: default_regex_prefix(),
            case_insensitive_prefixes: true,
            case_insensitive_commands: true,
        }
    }
}

// Default value functions
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_message_ttl() -> u64 {
    604_800_000 // 7 days
}

fn default_prefix() -> String {
    ">".to_string()
}

fn default_regex_prefix() -> String {
    "^(hey +)?(warden|wd)[,! ]".to_string()
}

fn default_true() -> bool {
    true
}

fn validate_regex(pattern: &str) -> Result<(), ValidationError> {
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_regex"))
}

fn deserialize_developers<'de, D>(deserializer: D) -> Result<Vec<Snowflake>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let raw = Vec::<String>::deserialize(deserializer)?;
    raw.iter()
        .map(|id| {
            if !Snowflake::is_valid_str(id) {
                return Err(D::Error::custom(format!(
                    "developer id '{id}' is not a valid snowflake"
                )));
            }
            Snowflake::parse(id).map_err(D::Error::custom)
        })
        .collect()
}

impl GlobalConfig {
    /// Load the configuration file named by `WARDEN_CONFIG`, or the default path
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let path = env::var("WARDEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(path)
    }

    /// Load and validate a configuration file, applying `WARDEN__*` overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let source = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(source)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?;

        Self::finish(source)
    }

    fn finish(source: config::Config) -> Result<Self, ConfigError> {
        let config: Self = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the developer allow-list
    #[inline]
    pub fn is_developer(&self, user_id: Snowflake) -> bool {
        self.developers.contains(&user_id)
    }
}

/// Secrets taken from the environment
#[derive(Clone)]
pub struct Credentials {
    pub bot_token: String,
    pub database_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("database_url", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load credentials from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            bot_token: env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingVar("BOT_TOKEN"))?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
database:
  messages:
    insert_cron: "*/5 * * * *"
    delete_cron: "0 0 * * *"
"#;

    #[test]
    fn test_minimal_file_gets_defaults() {
        let config = GlobalConfig::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(config.database.messages.ttl, 604_800_000);
        assert_eq!(config.database.messages.insert_cron.as_str(), "0 */5 * * * *");
        assert_eq!(config.database.config_cache_delete_cron, CronSpec::hourly());
        assert_eq!(config.commands.prefix, ">");
        assert!(config.commands.case_insensitive_commands);
        assert!(config.developers.is_empty());
    }

    #[test]
    fn test_full_file() {
        let yaml = r#"
database:
  messages:
    insert_cron: "*/1 * * * *"
    delete_cron: "@daily"
    ttl: 86400000
  config_cache_delete_cron: "0 */6 * * *"
commands:
  prefix: "!"
  case_insensitive_prefixes: false
developers:
  - "123456789012345678"
"#;
        let config = GlobalConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.database.messages.ttl, 86_400_000);
        assert_eq!(config.database.messages.delete_cron.as_str(), "@daily");
        assert_eq!(config.commands.prefix, "!");
        assert!(!config.commands.case_insensitive_prefixes);
        assert!(config.is_developer(Snowflake::new(123_456_789_012_345_678)));
        assert!(!config.is_developer(Snowflake::new(1)));
    }

    #[test]
    fn test_ttl_lower_bound() {
        let yaml = format!("{MINIMAL}    ttl: 999\n");
        assert!(matches!(
            GlobalConfig::from_yaml_str(&yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_cron_rejected() {
        let yaml = r#"
database:
  messages:
    insert_cron: "every minute"
    delete_cron: "0 0 * * *"
"#;
        assert!(matches!(
            GlobalConfig::from_yaml_str(yaml),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_bad_developer_id_rejected() {
        let yaml = format!("{MINIMAL}developers:\n  - \"12345\"\n");
        assert!(GlobalConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GlobalConfig::load_from("/definitely/not/here.yml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            bot_token: "secret".into(),
            database_url: "postgres://user:pw@host/db".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret"));
        assert!(!printed.contains("pw@host"));
    }
}
