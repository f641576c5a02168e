//! Guild settings entity - per-guild command configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Role based command override
///
/// Members holding `id` may run every command in `commands`, unless they also
/// hold one of the `excluded` roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOverride {
    pub id: Snowflake,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<Snowflake>,
}

impl RoleOverride {
    /// Whether this override grants `command` to a member holding `member_roles`
    pub fn grants(&self, command: &str, member_roles: &[Snowflake]) -> bool {
        self.commands.iter().any(|c| c == command)
            && !self.excluded.iter().any(|r| member_roles.contains(r))
    }
}

/// Channel (or category) scoped command allow-list
///
/// An empty `roles` list means every member may use the listed commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelOverride {
    pub id: Snowflake,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    pub commands: Vec<String>,
}

impl ChannelOverride {
    #[inline]
    pub fn allows_command(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }

    /// Whether a member holding `member_roles` passes the role restriction
    pub fn admits(&self, member_roles: &[Snowflake]) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|r| member_roles.contains(r))
    }
}

/// Guild settings entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub id: Snowflake,
    pub prefix: String,
    pub auto_delete: bool,
    pub respond_if_no_perms: bool,
    pub respond_if_disabled: bool,
    pub respond_if_disabled_in_channel: bool,
    pub preserve_errors: bool,
    pub show_executor: bool,
    /// Milliseconds before error replies are removed
    pub error_delete_delay: i64,
    pub disabled_commands: Vec<String>,
    pub role_overrides: Vec<RoleOverride>,
    pub channel_overrides: Vec<ChannelOverride>,
    pub moderator_roles: Vec<Snowflake>,
    pub infraction_log_channel: Option<Snowflake>,
    pub infraction_log_enabled: bool,
    pub require_infraction_reason: bool,
    /// Milliseconds, 0 means no default
    pub default_mute_duration: i64,
    /// Milliseconds, 0 means warnings never expire by default
    pub default_warning_duration: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuildSettings {
    pub const DEFAULT_PREFIX: &'static str = ">";
    pub const MAX_PREFIX_LENGTH: usize = 10;

    pub const DEFAULT_ERROR_DELETE_DELAY: i64 = 7500;
    pub const MIN_ERROR_DELETE_DELAY: i64 = 1000;
    pub const MAX_ERROR_DELETE_DELAY: i64 = 30_000;

    /// Create the default settings record for a guild
    pub fn new(id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            prefix: Self::DEFAULT_PREFIX.to_string(),
            auto_delete: false,
            respond_if_no_perms: true,
            respond_if_disabled: true,
            respond_if_disabled_in_channel: true,
            preserve_errors: false,
            show_executor: true,
            error_delete_delay: Self::DEFAULT_ERROR_DELETE_DELAY,
            disabled_commands: Vec::new(),
            role_overrides: Vec::new(),
            channel_overrides: Vec::new(),
            moderator_roles: Vec::new(),
            infraction_log_channel: None,
            infraction_log_enabled: false,
            require_infraction_reason: false,
            default_mute_duration: 0,
            default_warning_duration: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands.iter().any(|c| c == command)
    }

    /// Add a command to the disabled list, returns false if it already was disabled
    pub fn disable_command(&mut self, command: &str) -> bool {
        if self.is_disabled(command) {
            return false;
        }
        self.disabled_commands.push(command.to_string());
        self.updated_at = Utc::now();
        true
    }

    /// Remove a command from the disabled list, returns false if it was not disabled
    pub fn enable_command(&mut self, command: &str) -> bool {
        let before = self.disabled_commands.len();
        self.disabled_commands.retain(|c| c != command);
        if self.disabled_commands.len() == before {
            return false;
        }
        self.updated_at = Utc::now();
        true
    }

    /// Update the command prefix
    pub fn set_prefix(&mut self, prefix: &str) -> Result<(), DomainError> {
        if prefix.is_empty() || prefix.chars().count() > Self::MAX_PREFIX_LENGTH {
            return Err(DomainError::ValidationError(format!(
                "The prefix must be between 1 and {} characters long.",
                Self::MAX_PREFIX_LENGTH
            )));
        }
        self.prefix = prefix.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Update the error delete delay, keeping it within the allowed window
    pub fn set_error_delete_delay(&mut self, delay_ms: i64) -> Result<(), DomainError> {
        if !(Self::MIN_ERROR_DELETE_DELAY..=Self::MAX_ERROR_DELETE_DELAY).contains(&delay_ms) {
            return Err(DomainError::ValidationError(format!(
                "error delete delay must be between {} and {} ms",
                Self::MIN_ERROR_DELETE_DELAY,
                Self::MAX_ERROR_DELETE_DELAY
            )));
        }
        self.error_delete_delay = delay_ms;
        self.updated_at = Utc::now();
        Ok(())
    }

    #[inline]
    pub fn is_moderator(&self, member_roles: &[Snowflake]) -> bool {
        self.moderator_roles.iter().any(|r| member_roles.contains(r))
    }

    /// Find the channel override for the first matching id in `lineage`
    ///
    /// `lineage` is the channel, then its parent, then the parent's parent.
    pub fn channel_override(&self, lineage: &[Snowflake]) -> Option<&ChannelOverride> {
        lineage
            .iter()
            .find_map(|id| self.channel_overrides.iter().find(|o| o.id == *id))
    }

    /// All role overrides configured for `role_id`
    pub fn role_overrides_for(&self, role_id: Snowflake) -> impl Iterator<Item = &RoleOverride> {
        self.role_overrides.iter().filter(move |o| o.id == role_id)
    }

    /// Infraction log channel, when logging is switched on
    pub fn infraction_log_target(&self) -> Option<Snowflake> {
        self.infraction_log_channel.filter(|_| self.infraction_log_enabled)
    }

    /// Mark the record as changed
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
