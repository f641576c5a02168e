//! Test helpers for integration tests
//!
//! Provides a fully wired bot over in-memory doubles and access to a
//! migrated test database.

use std::sync::Arc;

use anyhow::Result;
use warden_cache::Scheduler;
use warden_common::GlobalConfig;
use warden_core::entities::IncomingMessage;
use warden_core::GatewayEvent;
use warden_db::{create_pool, run_migrations, DatabaseConfig, PgPool};
use warden_gateway::handlers::on_message_create;
use warden_gateway::EventDispatcher;
use warden_service::testing::{test_config, TestServices};
use warden_service::{CommandDispatcher, CommandLogger, CommandRegistry, DispatchOutcome, ErrorPresenter};

/// The bot as the gateway runs it, over in-memory storage
pub struct TestBot {
    pub harness: TestServices,
    pub commands: Arc<CommandDispatcher>,
    pub events: EventDispatcher,
    pub scheduler: Arc<Scheduler>,
}

impl TestBot {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GlobalConfig) -> Self {
        let harness = TestServices::with_config(config);
        let services = harness.services.clone();

        let commands = CommandDispatcher::new(Arc::new(CommandRegistry::with_builtins()), services.clone())
            .expect("built-in commands and prefixes are valid")
            .with_listener(Arc::new(CommandLogger))
            .with_listener(Arc::new(ErrorPresenter::new(services)));
        let commands = Arc::new(commands);

        let scheduler = Arc::new(Scheduler::new());
        let events = EventDispatcher::new(Arc::clone(&commands), Arc::clone(&scheduler));

        Self { harness, commands, events, scheduler }
    }

    /// Deliver a message and wait for the command pipeline to finish with it
    pub async fn send(&self, message: IncomingMessage) -> DispatchOutcome {
        on_message_create(&self.commands, message)
            .await
            .expect("dispatch task panicked")
    }

    /// Deliver any gateway event
    pub async fn dispatch(&self, event: GatewayEvent) {
        self.events.dispatch(event).await;
    }
}

impl Default for TestBot {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that the database-backed tests can run
pub fn check_test_env() -> bool {
    dotenvy::dotenv().ok();

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("Skipping test: DATABASE_URL not set");
        return false;
    }

    true
}

/// A migrated pool on `DATABASE_URL`
pub async fn test_pool() -> Result<PgPool> {
    let url = std::env::var("DATABASE_URL")?;
    let config = test_config();
    let pool = create_pool(&DatabaseConfig::new(url, &config.database)).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
