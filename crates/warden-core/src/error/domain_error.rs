//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild settings not found: {0}")]
    GuildSettingsNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid stored value for {field}: {reason}")]
    CorruptRecord { field: &'static str, reason: String },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),
}

impl DomainError {
    /// Get an error code string for logs
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::GuildSettingsNotFound(_) => "UNKNOWN_GUILD_SETTINGS",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::CorruptRecord { .. } => "CORRUPT_RECORD",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::PlatformError(_) => "PLATFORM_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GuildSettingsNotFound(_))
    }

    /// Check if this error came from infrastructure rather than domain rules
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DatabaseError(_) | Self::PlatformError(_))
    }
}
