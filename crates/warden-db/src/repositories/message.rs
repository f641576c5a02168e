//! PostgreSQL implementation of MessageRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::BufferedMessage;
use warden_core::traits::{MessageRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::mappers::MessageColumns;
use crate::models::MessageModel;

use super::error::map_db_error;

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT id, guild_id, channel_id, author_id, content, sticker_id, reference_id,
                   created_at, deleted
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(BufferedMessage::from))
    }

    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn upsert_many(&self, messages: &[BufferedMessage]) -> RepoResult<u64> {
        if messages.is_empty() {
            return Ok(0);
        }

        let columns = MessageColumns::new(messages);

        // A deletion that already reached the database is never undone
        let result = sqlx::query(
            r#"
            INSERT INTO messages (id, guild_id, channel_id, author_id, content, sticker_id,
                                  reference_id, created_at, deleted)
            SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::bigint[],
                                 $5::text[], $6::bigint[], $7::bigint[], $8::timestamptz[],
                                 $9::bool[])
            ON CONFLICT (id) DO UPDATE
            SET content = EXCLUDED.content,
                deleted = messages.deleted OR EXCLUDED.deleted
            "#,
        )
        .bind(columns.ids)
        .bind(columns.guild_ids)
        .bind(columns.channel_ids)
        .bind(columns.author_ids)
        .bind(columns.contents)
        .bind(columns.sticker_ids)
        .bind(columns.reference_ids)
        .bind(columns.created_ats)
        .bind(columns.deleted)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn mark_deleted(&self, id: Snowflake) -> RepoResult<Option<BufferedMessage>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            UPDATE messages
            SET deleted = TRUE
            WHERE id = $1
            RETURNING id, guild_id, channel_id, author_id, content, sticker_id, reference_id,
                      created_at, deleted
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(BufferedMessage::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn mark_many_deleted(&self, ids: &[Snowflake]) -> RepoResult<Vec<BufferedMessage>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();

        let results = sqlx::query_as::<_, MessageModel>(
            r#"
            UPDATE messages
            SET deleted = TRUE
            WHERE id = ANY($1)
            RETURNING id, guild_id, channel_id, author_id, content, sticker_id, reference_id,
                      created_at, deleted
            "#,
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(BufferedMessage::from).collect())
    }

    #[instrument(skip(self, content))]
    async fn update_content(&self, id: Snowflake, content: &str) -> RepoResult<Option<String>> {
        // Lock the row so the returned content is the value this update replaced
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE messages m
            SET content = $2
            FROM (SELECT id, content FROM messages WHERE id = $1 FOR UPDATE) old
            WHERE m.id = old.id
            RETURNING old.content
            "#,
        )
        .bind(id.into_inner())
        .bind(content)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(previous.flatten())
    }

    #[instrument(skip(self))]
    async fn mark_recent_deleted_by_author(
        &self,
        author_id: Snowflake,
        channel_id: Snowflake,
        since: DateTime<Utc>,
        limit: i64,
    ) -> RepoResult<Vec<BufferedMessage>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut results = sqlx::query_as::<_, MessageModel>(
            r#"
            UPDATE messages
            SET deleted = TRUE
            WHERE id IN (
                SELECT id FROM messages
                WHERE author_id = $1
                  AND channel_id = $2
                  AND created_at > $3
                  AND deleted = FALSE
                ORDER BY created_at DESC
                LIMIT $4
                FOR UPDATE
            )
            RETURNING id, guild_id, channel_id, author_id, content, sticker_id, reference_id,
                      created_at, deleted
            "#,
        )
        .bind(author_id.into_inner())
        .bind(channel_id.into_inner())
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        // RETURNING does not preserve the subquery order
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(results.into_iter().map(BufferedMessage::from).collect())
    }

    #[instrument(skip(self))]
    async fn delete_created_before(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM messages
            WHERE created_at <= $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
