//! Warden entry point
//!
//! Run with:
//! ```bash
//! cargo run -p warden-gateway
//! ```
//!
//! Static configuration comes from `warden.cfg.yml` (or `WARDEN_CONFIG`),
//! secrets from `BOT_TOKEN` and `DATABASE_URL`.

use tracing::{error, info};
use warden_common::{try_init_tracing_with_config, AppResult, Credentials, GlobalConfig, TracingConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = try_init_tracing_with_config(TracingConfig::from_env()) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(code = e.error_code(), error = %e, "Warden stopped with an error");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    info!("Starting Warden...");

    let config = GlobalConfig::load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    let credentials = Credentials::from_env()?;

    info!(
        prefix = %config.commands.prefix,
        developers = config.developers.len(),
        "Configuration loaded"
    );

    warden_gateway::run(config, credentials).await?;
    Ok(())
}
