//! Database Integration Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Environment variables: DATABASE_URL
//!
//! Run with: cargo test -p warden-integration-tests --test db_tests

use std::sync::Arc;

use chrono::Utc;
use warden_cache::{GuildSettingsCache, MessageBuffer};
use warden_core::entities::{BufferedMessage, InfractionType, NewInfraction};
use warden_core::traits::{InfractionRepository, MessageRepository, StoreHealth};
use warden_core::value_objects::Snowflake;
use warden_db::{PgGuildSettingsRepository, PgInfractionRepository, PgMessageRepository, PgStoreHealth};
use warden_integration_tests::{check_test_env, test_pool, unique_id};

fn sf(id: i64) -> Snowflake {
    Snowflake::new(id)
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_store_answers_ping() {
    if !check_test_env() {
        return;
    }

    let pool = test_pool().await.expect("Failed to connect");
    PgStoreHealth::new(pool).ping().await.unwrap();
}

// ============================================================================
// Guild settings
// ============================================================================

#[tokio::test]
async fn test_guild_settings_round_trip_through_cache() {
    if !check_test_env() {
        return;
    }

    let pool = test_pool().await.expect("Failed to connect");
    let cache = GuildSettingsCache::new(Arc::new(PgGuildSettingsRepository::new(pool.clone())));
    let guild_id = sf(unique_id());

    let created = cache.confirm(guild_id).await.unwrap();
    assert!(created.disabled_commands.is_empty());
    assert!(!created.preserve_errors);

    let mut settings = (*created).clone();
    settings.disable_command("warn");
    settings.preserve_errors = true;
    settings.moderator_roles.push(sf(unique_id()));
    cache.update(settings).await.unwrap();
    assert!(cache.is_empty());

    // A fresh cache proves the values came from the database
    let reloaded = GuildSettingsCache::new(Arc::new(PgGuildSettingsRepository::new(pool)))
        .get(guild_id)
        .await
        .unwrap();
    assert_eq!(reloaded.disabled_commands, vec!["warn".to_string()]);
    assert!(reloaded.preserve_errors);
    assert_eq!(reloaded.moderator_roles.len(), 1);
}

// ============================================================================
// Messages
// ============================================================================

fn stored_message(id: Snowflake, content: &str) -> BufferedMessage {
    BufferedMessage::new(
        id,
        sf(unique_id()),
        sf(unique_id()),
        sf(unique_id()),
        Some(content.to_string()),
        Utc::now(),
    )
}

#[tokio::test]
async fn test_flushed_messages_are_found_in_database() {
    if !check_test_env() {
        return;
    }

    let pool = test_pool().await.expect("Failed to connect");
    let repo = Arc::new(PgMessageRepository::new(pool));
    let id = sf(unique_id());

    assert_eq!(repo.upsert_many(&[stored_message(id, "first")]).await.unwrap(), 1);

    let buffer = MessageBuffer::new(repo.clone());
    assert_eq!(buffer.size(), 0);

    let found = buffer.get(id).await.unwrap().expect("message was stored");
    assert_eq!(found.content.as_deref(), Some("first"));

    let previous = buffer.update_content(id, "second".to_string()).await.unwrap();
    assert_eq!(previous, "first");

    let deleted = buffer.delete(id).await.unwrap().expect("message was stored");
    assert!(deleted.deleted);

    let row = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.content.as_deref(), Some("second"));
    assert!(row.deleted);
}

#[tokio::test]
async fn test_upsert_overwrites_existing_rows() {
    if !check_test_env() {
        return;
    }

    let pool = test_pool().await.expect("Failed to connect");
    let repo = PgMessageRepository::new(pool);
    let id = sf(unique_id());

    repo.upsert_many(&[stored_message(id, "draft")]).await.unwrap();
    let mut edited = stored_message(id, "final");
    edited.mark_deleted();
    repo.upsert_many(&[edited]).await.unwrap();

    let row = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.content.as_deref(), Some("final"));
    assert!(row.deleted);
}

// ============================================================================
// Infractions
// ============================================================================

#[tokio::test]
async fn test_infraction_ids_are_assigned_by_database() {
    if !check_test_env() {
        return;
    }

    let pool = test_pool().await.expect("Failed to connect");
    let repo = PgInfractionRepository::new(pool);
    let guild_id = sf(unique_id());
    let user_id = sf(unique_id());

    let infraction = repo
        .create(&NewInfraction {
            guild_id,
            user_id,
            moderator_id: sf(unique_id()),
            kind: InfractionType::Warn,
            reason: "Spamming.".to_string(),
            created_at: Utc::now(),
            expires_at: None,
        })
        .await
        .unwrap();

    assert!(infraction.id > 0);
    assert_eq!(infraction.kind, InfractionType::Warn);

    let history = repo.find_by_user(guild_id, user_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reason, "Spamming.");

    assert!(repo.delete(guild_id, infraction.id).await.unwrap());
    assert!(repo.find_by_id(guild_id, infraction.id).await.unwrap().is_none());
}
