//! Bot process setup
//!
//! Wires the database, the service layer and the platform client together,
//! runs the gateway connection and drains state on shutdown.

mod shutdown;

pub use shutdown::{drain, wait_for_signal};

use std::sync::Arc;
use std::time::Duration;

use serenity::gateway::ShardManager;
use serenity::prelude::GatewayIntents;
use serenity::Client;
use tokio::sync::mpsc;
use warden_cache::{AuditCorrelator, GuildSettingsCache, MessageBuffer, Scheduler};
use warden_common::{Credentials, GlobalConfig};
use warden_db::{
    create_pool, run_migrations, DatabaseConfig, PgGuildSettingsRepository, PgInfractionRepository,
    PgMessageRepository, PgPool, PgStoreHealth,
};
use warden_service::{
    CommandDispatcher, CommandLogger, CommandRegistry, ErrorPresenter, ServiceContext,
};

use crate::client::{GatewayHandler, SerenityPlatform};
use crate::error::GatewayResult;
use crate::events::{EventDispatcher, EVENT_BUFFER};

/// How often the heartbeat latency is copied from the shard runners
const LATENCY_PROBE_INTERVAL: Duration = Duration::from_secs(10);

fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Build the service context over PostgreSQL and the live platform
fn create_services(
    config: Arc<GlobalConfig>,
    pool: &PgPool,
    platform: Arc<SerenityPlatform>,
) -> GatewayResult<ServiceContext> {
    let guild_repo = Arc::new(PgGuildSettingsRepository::new(pool.clone()));
    let message_repo = Arc::new(PgMessageRepository::new(pool.clone()));
    let infraction_repo = Arc::new(PgInfractionRepository::new(pool.clone()));
    let store_health = Arc::new(PgStoreHealth::new(pool.clone()));

    let services = ServiceContext::builder()
        .config(config)
        .guilds(Arc::new(GuildSettingsCache::new(guild_repo)))
        .messages(Arc::new(MessageBuffer::new(message_repo)))
        .audit(Arc::new(AuditCorrelator::new()))
        .infraction_repo(infraction_repo)
        .store_health(store_health)
        .platform(platform)
        .build()?;
    Ok(services)
}

/// Run the bot until a shutdown signal arrives
pub async fn run(config: GlobalConfig, credentials: Credentials) -> GatewayResult<()> {
    let config = Arc::new(config);

    // Database
    tracing::info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::new(
        credentials.database_url.as_str(),
        &config.database,
    ))
    .await?;
    run_migrations(&pool).await?;
    tracing::info!("PostgreSQL connection established");

    // Platform client
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let mut client = Client::builder(&credentials.bot_token, intents())
        .event_handler(GatewayHandler::new(events_tx))
        .await?;
    let platform = Arc::new(SerenityPlatform::new(
        Arc::clone(&client.http),
        Arc::clone(&client.cache),
    ));

    // Services and dispatch
    let services = create_services(Arc::clone(&config), &pool, Arc::clone(&platform))?;
    let commands = CommandDispatcher::new(
        Arc::new(CommandRegistry::with_builtins()),
        services.clone(),
    )?
    .with_listener(Arc::new(CommandLogger))
    .with_listener(Arc::new(ErrorPresenter::new(services.clone())));

    let scheduler = Arc::new(Scheduler::new());
    let dispatcher = Arc::new(EventDispatcher::new(Arc::new(commands), Arc::clone(&scheduler)));
    let _dispatch_loop = dispatcher.start(events_rx);

    spawn_latency_probe(Arc::clone(&client.shard_manager), platform);

    let shard_manager = Arc::clone(&client.shard_manager);
    let messages = Arc::clone(services.messages());
    let shutdown = tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutting down...");

        shard_manager.shutdown_all().await;
        drain(&scheduler, &messages).await;
        pool.close().await;
        tracing::info!("Shutdown complete");
    });

    tracing::info!("Starting gateway connection...");
    client.start().await?;

    // The client only returns cleanly after the shards were shut down
    if let Err(e) = shutdown.await {
        tracing::error!(error = %e, "Shutdown task failed");
    }
    Ok(())
}

fn spawn_latency_probe(shard_manager: Arc<ShardManager>, platform: Arc<SerenityPlatform>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LATENCY_PROBE_INTERVAL);
        loop {
            interval.tick().await;
            let latency = shard_manager
                .runners
                .lock()
                .await
                .values()
                .find_map(|runner| runner.latency);
            platform.set_latency(latency);
        }
    });
}
