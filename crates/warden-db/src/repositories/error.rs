//! Error handling utilities for repositories

use sqlx::Error as SqlxError;
use warden_core::error::DomainError;
use warden_core::value_objects::Snowflake;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Create a "guild settings not found" error
pub fn guild_settings_not_found(id: Snowflake) -> DomainError {
    DomainError::GuildSettingsNotFound(id)
}
