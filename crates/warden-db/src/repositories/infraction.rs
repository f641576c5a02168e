//! PostgreSQL implementation of InfractionRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::{Infraction, NewInfraction};
use warden_core::traits::{InfractionRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::models::InfractionModel;

use super::error::map_db_error;

/// PostgreSQL implementation of InfractionRepository
#[derive(Clone)]
pub struct PgInfractionRepository {
    pool: PgPool,
}

impl PgInfractionRepository {
    /// Create a new PgInfractionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InfractionRepository for PgInfractionRepository {
    #[instrument(skip(self, infraction), fields(guild_id = %infraction.guild_id, user_id = %infraction.user_id))]
    async fn create(&self, infraction: &NewInfraction) -> RepoResult<Infraction> {
        let model = sqlx::query_as::<_, InfractionModel>(
            r#"
            INSERT INTO infractions (guild_id, user_id, moderator_id, kind, reason, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, guild_id, user_id, moderator_id, kind, reason, created_at, expires_at
            "#,
        )
        .bind(infraction.guild_id.into_inner())
        .bind(infraction.user_id.into_inner())
        .bind(infraction.moderator_id.into_inner())
        .bind(infraction.kind.as_str())
        .bind(&infraction.reason)
        .bind(infraction.created_at)
        .bind(infraction.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Infraction::try_from(model)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, guild_id: Snowflake, id: i64) -> RepoResult<Option<Infraction>> {
        let result = sqlx::query_as::<_, InfractionModel>(
            r#"
            SELECT id, guild_id, user_id, moderator_id, kind, reason, created_at, expires_at
            FROM infractions
            WHERE guild_id = $1 AND id = $2
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Infraction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Vec<Infraction>> {
        let results = sqlx::query_as::<_, InfractionModel>(
            r#"
            SELECT id, guild_id, user_id, moderator_id, kind, reason, created_at, expires_at
            FROM infractions
            WHERE guild_id = $1 AND user_id = $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Infraction::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM infractions
            WHERE guild_id = $1 AND id = $2
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
