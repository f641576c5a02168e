use tracing::{debug, info};
use warden_core::events::GuildEvent;
use warden_service::ServiceContext;

use crate::error::GatewayResult;

/// Joined (or regained) a guild: make sure it has a settings record
pub async fn on_guild_create(services: &ServiceContext, event: GuildEvent) -> GatewayResult<()> {
    services.guilds().confirm(event.guild_id).await?;
    info!(guild_id = %event.guild_id, "Guild available");
    Ok(())
}

/// Left a guild: drop its cached settings, the stored record stays
pub async fn on_guild_delete(services: &ServiceContext, event: GuildEvent) -> GatewayResult<()> {
    if services.guilds().invalidate(event.guild_id) {
        debug!(guild_id = %event.guild_id, "Dropped cached settings of departed guild");
    }
    info!(guild_id = %event.guild_id, "Guild left");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::Snowflake;
    use warden_service::testing::{TestServices, GUILD_ID};

    fn event() -> GuildEvent {
        GuildEvent { guild_id: Snowflake::new(GUILD_ID) }
    }

    #[tokio::test]
    async fn test_join_creates_settings_once() {
        let harness = TestServices::new();

        on_guild_create(&harness.services, event()).await.unwrap();
        on_guild_create(&harness.services, event()).await.unwrap();

        assert_eq!(harness.guild_repo.creates(), 1);
        assert_eq!(harness.services.guilds().len(), 1);
    }

    #[tokio::test]
    async fn test_leave_drops_cached_settings() {
        let harness = TestServices::new();
        on_guild_create(&harness.services, event()).await.unwrap();

        on_guild_delete(&harness.services, event()).await.unwrap();

        assert!(harness.services.guilds().is_empty());
        assert!(harness.guild_repo.snapshot(Snowflake::new(GUILD_ID)).is_some());
    }
}
