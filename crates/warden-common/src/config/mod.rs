//! Configuration structs

mod cron_spec;
mod global_config;

pub use cron_spec::{CronSpec, CronSpecError};
pub use global_config::{
    CommandSettings, ConfigError, Credentials, DatabaseSettings, GlobalConfig, MessageSettings,
    DEFAULT_CONFIG_PATH,
};
