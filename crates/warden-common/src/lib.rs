//! # warden-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    CommandSettings, ConfigError, CronSpec, CronSpecError, Credentials, DatabaseSettings,
    GlobalConfig, MessageSettings, DEFAULT_CONFIG_PATH,
};
pub use error::{AppError, AppResult};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
