//! PostgreSQL implementation of GuildSettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::GuildSettings;
use warden_core::traits::{GuildSettingsRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::mappers::GuildSettingsUpdate;
use crate::models::GuildSettingsModel;

use super::error::{guild_settings_not_found, map_db_error};

/// PostgreSQL implementation of GuildSettingsRepository
#[derive(Clone)]
pub struct PgGuildSettingsRepository {
    pool: PgPool,
}

impl PgGuildSettingsRepository {
    /// Create a new PgGuildSettingsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildSettingsRepository for PgGuildSettingsRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<GuildSettings>> {
        let result = sqlx::query_as::<_, GuildSettingsModel>(
            r#"
            SELECT id, prefix, auto_delete, respond_if_no_perms, respond_if_disabled,
                   respond_if_disabled_in_channel, preserve_errors, show_executor,
                   error_delete_delay, disabled_commands, role_overrides, channel_overrides,
                   moderator_roles, infraction_log_channel, infraction_log_enabled,
                   require_infraction_reason, default_mute_duration, default_warning_duration,
                   created_at, updated_at
            FROM guilds
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(GuildSettings::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn create_default(&self, id: Snowflake) -> RepoResult<GuildSettings> {
        // Racing inserts collapse onto the first row
        sqlx::query(
            r#"
            INSERT INTO guilds (id)
            VALUES ($1)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| guild_settings_not_found(id))
    }

    #[instrument(skip(self, settings), fields(guild_id = %settings.id))]
    async fn update(&self, settings: &GuildSettings) -> RepoResult<()> {
        let values = GuildSettingsUpdate::new(settings)?;

        let result = sqlx::query(
            r#"
            UPDATE guilds
            SET prefix = $2,
                auto_delete = $3,
                respond_if_no_perms = $4,
                respond_if_disabled = $5,
                respond_if_disabled_in_channel = $6,
                preserve_errors = $7,
                show_executor = $8,
                error_delete_delay = $9,
                disabled_commands = $10,
                role_overrides = $11,
                channel_overrides = $12,
                moderator_roles = $13,
                infraction_log_channel = $14,
                infraction_log_enabled = $15,
                require_infraction_reason = $16,
                default_mute_duration = $17,
                default_warning_duration = $18,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(values.id)
        .bind(values.prefix)
        .bind(settings.auto_delete)
        .bind(settings.respond_if_no_perms)
        .bind(settings.respond_if_disabled)
        .bind(settings.respond_if_disabled_in_channel)
        .bind(settings.preserve_errors)
        .bind(settings.show_executor)
        .bind(settings.error_delete_delay)
        .bind(values.disabled_commands)
        .bind(values.role_overrides)
        .bind(values.channel_overrides)
        .bind(values.moderator_roles)
        .bind(values.infraction_log_channel)
        .bind(settings.infraction_log_enabled)
        .bind(settings.require_infraction_reason)
        .bind(settings.default_mute_duration)
        .bind(settings.default_warning_duration)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(guild_settings_not_found(settings.id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgGuildSettingsRepository>();
    }
}
