//! Built-in commands

mod config;
mod ping;
mod stats;
mod warn;

use std::sync::Arc;

pub use config::ConfigCommand;
pub use ping::PingCommand;
pub use stats::StatsCommand;
pub use warn::WarnCommand;

use super::Command;

/// Every built-in command
pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(PingCommand),
        Arc::new(StatsCommand),
        Arc::new(ConfigCommand),
        Arc::new(WarnCommand),
    ]
}

/// Heartbeat in whole milliseconds, `-1` until the first heartbeat
fn heartbeat_ms(latency: Option<std::time::Duration>) -> i128 {
    latency.map_or(-1, |l| l.as_millis() as i128)
}
