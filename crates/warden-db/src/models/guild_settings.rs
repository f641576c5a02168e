//! Guild settings database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for guilds table
#[derive(Debug, Clone, FromRow)]
pub struct GuildSettingsModel {
    pub id: i64,
    pub prefix: String,
    pub auto_delete: bool,
    pub respond_if_no_perms: bool,
    pub respond_if_disabled: bool,
    pub respond_if_disabled_in_channel: bool,
    pub preserve_errors: bool,
    pub show_executor: bool,
    pub error_delete_delay: i64,
    pub disabled_commands: Vec<String>,
    pub role_overrides: serde_json::Value,
    pub channel_overrides: serde_json::Value,
    pub moderator_roles: Vec<i64>,
    pub infraction_log_channel: Option<i64>,
    pub infraction_log_enabled: bool,
    pub require_infraction_reason: bool,
    pub default_mute_duration: i64,
    pub default_warning_duration: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

