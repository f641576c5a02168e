use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};
use warden_cache::Scheduler;
use warden_core::events::ReadyEvent;
use warden_service::ServiceContext;

use crate::error::GatewayResult;

/// Session ready: start the periodic jobs
///
/// The platform fires ready again after every reconnect; the jobs are only
/// registered on the first one.
pub fn on_ready(
    services: &ServiceContext,
    scheduler: &Scheduler,
    started: &AtomicBool,
    event: ReadyEvent,
) -> GatewayResult<()> {
    if started.swap(true, Ordering::SeqCst) {
        debug!(user_id = %event.user_id, "Session resumed, schedules already running");
        return Ok(());
    }

    let database = &services.config().database;
    services
        .guilds()
        .start_eviction_schedule(scheduler, &database.config_cache_delete_cron)?;
    services.messages().start_periodic_flush(
        scheduler,
        &database.messages.insert_cron,
        &database.messages.delete_cron,
        database.messages.ttl,
    )?;

    info!(
        user_id = %event.user_id,
        username = %event.username,
        guilds = event.guild_count,
        "Logged in"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_cache::{DELETE_GUILD_CACHE, DELETE_OLD_MESSAGES, STORE_NEW_MESSAGES};
    use warden_core::Snowflake;
    use warden_service::testing::{TestServices, BOT_ID};

    fn event() -> ReadyEvent {
        ReadyEvent { user_id: Snowflake::new(BOT_ID), username: "warden".to_string(), guild_count: 3 }
    }

    #[tokio::test]
    async fn test_first_ready_starts_every_job() {
        let harness = TestServices::new();
        let scheduler = Scheduler::new();
        let started = AtomicBool::new(false);

        on_ready(&harness.services, &scheduler, &started, event()).unwrap();

        for job in [STORE_NEW_MESSAGES, DELETE_OLD_MESSAGES, DELETE_GUILD_CACHE] {
            assert!(scheduler.is_scheduled(job), "{job} not scheduled");
        }
        assert_eq!(scheduler.len(), 3);
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnect_does_not_reschedule() {
        let harness = TestServices::new();
        let scheduler = Scheduler::new();
        let started = AtomicBool::new(false);

        on_ready(&harness.services, &scheduler, &started, event()).unwrap();
        on_ready(&harness.services, &scheduler, &started, event()).unwrap();

        assert_eq!(scheduler.len(), 3);
        scheduler.shutdown().await;
    }
}
