//! Service layer error types
//!
//! A command either fails with a message meant for the invoking user
//! ([`ServiceError::User`]) or with anything else, which is unexpected and
//! reported with a correlation id.

use std::fmt;
use warden_core::DomainError;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Shown to the invoking user verbatim
    User(String),

    /// Domain rule violation or storage failure
    Domain(DomainError),

    /// Invalid service wiring
    Validation(String),

    /// Anything else
    Unexpected(anyhow::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(msg) => write!(f, "{msg}"),
            Self::Domain(e) => write!(f, "{e}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Unexpected(e) => write!(f, "Unexpected error: {e:#}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Unexpected(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create an error shown to the user as is
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unexpected error
    pub fn unexpected(msg: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Unexpected(anyhow::anyhow!(msg))
    }

    /// Whether this error carries a message for the user
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Get the error code for logs
    pub fn error_code(&self) -> &str {
        match self {
            Self::User(_) => "USER_ERROR",
            Self::Domain(e) => e.code(),
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unexpected(_) => "UNEXPECTED_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unexpected(err)
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Snowflake;

    #[test]
    fn test_user_error_displays_verbatim() {
        let err = ServiceError::user("You cannot warn yourself.");
        assert!(err.is_user());
        assert_eq!(err.to_string(), "You cannot warn yourself.");
        assert_eq!(err.error_code(), "USER_ERROR");
    }

    #[test]
    fn test_domain_error_is_not_user_facing() {
        let err: ServiceError = DomainError::GuildSettingsNotFound(Snowflake::new(1)).into();
        assert!(!err.is_user());
        assert_eq!(err.error_code(), "UNKNOWN_GUILD_SETTINGS");
    }

    #[test]
    fn test_wiring_and_unexpected_codes() {
        let err = ServiceError::validation("platform is required");
        assert!(!err.is_user());
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = ServiceError::unexpected("boom");
        assert_eq!(err.error_code(), "UNEXPECTED_ERROR");
        assert_eq!(err.to_string(), "Unexpected error: boom");
    }
}
