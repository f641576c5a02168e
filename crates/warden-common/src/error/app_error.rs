//! Application error types
//!
//! Unified error handling for the process level code (startup, shutdown,
//! background jobs).

use warden_core::DomainError;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // Chat platform errors
    #[error("Platform error: {0}")]
    Platform(String),

    // Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Platform(_) => "PLATFORM_ERROR",
            Self::Scheduler(_) => "SCHEDULER_ERROR",
            Self::Domain(e) => e.code(),
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Snowflake;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Platform("gone".into()).error_code(), "PLATFORM_ERROR");
        assert_eq!(
            AppError::from(ConfigError::MissingVar("BOT_TOKEN")).error_code(),
            "CONFIG_ERROR"
        );
        assert_eq!(
            AppError::from(DomainError::GuildSettingsNotFound(Snowflake::new(1))).error_code(),
            "UNKNOWN_GUILD_SETTINGS"
        );
    }

    #[test]
    fn test_internal_hides_source_message() {
        let err = AppError::internal(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Internal error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err = AppError::from(DomainError::DatabaseError("closed".into()));
        assert_eq!(err.to_string(), "Database error: closed");
    }
}
