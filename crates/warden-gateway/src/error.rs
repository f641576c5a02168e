//! Gateway error types

use thiserror::Error;
use warden_cache::SchedulerError;
use warden_common::{AppError, ConfigError};
use warden_core::DomainError;
use warden_service::ServiceError;

/// Errors raised while starting the bot or handling a gateway event
#[derive(Debug, Error)]
pub enum GatewayError {
    // =========================================================================
    // Startup
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Service wiring error: {0}")]
    Service(String),

    #[error("Chat client error: {0}")]
    Client(#[from] serenity::Error),

    // =========================================================================
    // Event handling
    // =========================================================================
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl From<ServiceError> for GatewayError {
    fn from(err: ServiceError) -> Self {
        Self::Service(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Config(e) => AppError::Config(e),
            GatewayError::Database(e) => AppError::Database(e.to_string()),
            GatewayError::Migration(e) => AppError::Database(e.to_string()),
            GatewayError::Client(e) => AppError::Platform(e.to_string()),
            GatewayError::Domain(e) => AppError::Domain(e),
            GatewayError::Scheduler(e) => AppError::Scheduler(e.to_string()),
            err @ GatewayError::Service(_) => AppError::internal(err),
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
