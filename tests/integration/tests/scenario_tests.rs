//! End-to-end scenarios over in-memory storage
//!
//! Run with: cargo test -p warden-integration-tests --test scenario_tests

use std::time::Duration;

use warden_core::entities::{AuditLogCandidate, ChannelOverride, GuildSettings};
use warden_core::events::{GuildEvent, MessageDeleteEvent, MessageUpdateEvent};
use warden_core::value_objects::{Permissions, Snowflake};
use warden_core::GatewayEvent;
use warden_integration_tests::{admin, member_with, message_from, TestBot, MODERATOR_ID, MOD_ROLE, R1};
use warden_service::testing::{
    direct_message, guild_message, member, CHANNEL_ID, DEVELOPER_ID, GUILD_ID, MEMBER_ID, TARGET_ID,
};
use warden_service::{DispatchOutcome, Identifier};

fn sf(id: i64) -> Snowflake {
    Snowflake::new(id)
}

fn denied_with(outcome: &DispatchOutcome) -> Option<Identifier> {
    match outcome {
        DispatchOutcome::Denied(denial) => Some(denial.identifier),
        _ => None,
    }
}

fn warn_text() -> String {
    format!(">warn <@{TARGET_ID}>")
}

// ============================================================================
// Disabling a command
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_disabled_command_denial_is_cleaned_up() {
    let bot = TestBot::new();
    let guilds = bot.harness.services.guilds();

    // First access materializes the defaults
    let settings = guilds.get(sf(GUILD_ID)).await.unwrap();
    assert!(settings.disabled_commands.is_empty());
    assert_eq!(bot.harness.guild_repo.creates(), 1);

    let outcome = bot.send(message_from(10, admin(), ">config disable warn")).await;
    assert_eq!(outcome, DispatchOutcome::Succeeded);
    assert_eq!(
        bot.harness.platform.messages(),
        vec!["The `warn` command has been disabled."]
    );
    let stored = bot.harness.guild_repo.snapshot(sf(GUILD_ID)).unwrap();
    assert_eq!(stored.disabled_commands, vec!["warn".to_string()]);
    assert!(guilds.is_empty(), "update must drop the cached copy");

    bot.harness.platform.clear();
    let invocation = guild_message(11, MEMBER_ID, &warn_text());
    let outcome = bot.send(invocation.clone()).await;

    assert_eq!(denied_with(&outcome), Some(Identifier::CommandDisabled));
    assert_eq!(
        bot.harness.platform.messages(),
        vec!["This command is disabled in this server."]
    );
    assert!(bot.harness.infraction_repo.all().is_empty());

    tokio::time::sleep(Duration::from_millis(7400)).await;
    assert!(bot.harness.platform.deleted().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let deleted = bot.harness.platform.deleted();
    assert_eq!(deleted.len(), 2);
    assert!(deleted.contains(&invocation.id));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_command_denial_is_preserved() {
    let bot = TestBot::new();
    let mut settings = GuildSettings::new(sf(GUILD_ID));
    settings.disable_command("warn");
    settings.preserve_errors = true;
    bot.harness.guild_repo.put(settings);

    let outcome = bot.send(guild_message(10, MEMBER_ID, &warn_text())).await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert_eq!(denied_with(&outcome), Some(Identifier::CommandDisabled));
    assert_eq!(bot.harness.platform.messages().len(), 1);
    assert!(bot.harness.platform.deleted().is_empty());
}

#[tokio::test]
async fn test_reenabled_command_runs_again() {
    let bot = TestBot::new();
    bot.harness.platform.add_member(GUILD_ID, member(TARGET_ID, &[]));
    let moderator = || member_with(MODERATOR_ID, &[(MOD_ROLE, 5)], Permissions::MODERATE_MEMBERS);
    let mut settings = GuildSettings::new(sf(GUILD_ID));
    settings.moderator_roles.push(sf(MOD_ROLE));
    settings.disable_command("warn");
    bot.harness.guild_repo.put(settings);

    let outcome = bot.send(message_from(10, moderator(), &warn_text())).await;
    assert_eq!(denied_with(&outcome), Some(Identifier::CommandDisabled));

    let outcome = bot.send(message_from(11, admin(), ">settings enable strike")).await;
    assert_eq!(outcome, DispatchOutcome::Succeeded);

    let outcome = bot.send(message_from(12, moderator(), &warn_text())).await;
    assert_eq!(outcome, DispatchOutcome::Succeeded);
    assert_eq!(bot.harness.infraction_repo.all().len(), 1);
}

// ============================================================================
// Developer commands
// ============================================================================

#[tokio::test]
async fn test_developer_command_is_refused_without_storage_access() {
    let bot = TestBot::new();

    let outcome = bot.send(guild_message(10, MEMBER_ID, "wd stats")).await;

    assert_eq!(denied_with(&outcome), Some(Identifier::Silent));
    assert_eq!(bot.harness.guild_repo.calls(), 0);
    assert!(bot.harness.platform.messages().is_empty());
}

#[tokio::test]
async fn test_developer_command_runs_for_developers() {
    let bot = TestBot::new();

    let outcome = bot.send(direct_message(10, DEVELOPER_ID, ">stats")).await;

    assert_eq!(outcome, DispatchOutcome::Succeeded);
    assert!(bot
        .harness
        .platform
        .messages()
        .iter()
        .any(|text| text.starts_with("**Statistics Report**")));
}

// ============================================================================
// Channel overrides
// ============================================================================

fn guild_with_warn_override() -> GuildSettings {
    let mut settings = GuildSettings::new(sf(GUILD_ID));
    settings.channel_overrides.push(ChannelOverride {
        id: sf(CHANNEL_ID),
        roles: vec![sf(R1)],
        commands: vec!["warn".to_string()],
    });
    settings
}

#[tokio::test]
async fn test_channel_override_requires_listed_role() {
    let bot = TestBot::new();
    bot.harness.guild_repo.put(guild_with_warn_override());
    bot.harness.platform.add_member(GUILD_ID, member(TARGET_ID, &[]));

    let outsider = member_with(MEMBER_ID, &[], Permissions::MODERATE_MEMBERS);
    let outcome = bot.send(message_from(10, outsider, &warn_text())).await;
    assert_eq!(denied_with(&outcome), Some(Identifier::CommandDisabledInChannel));
    assert_eq!(
        bot.harness.platform.messages(),
        vec!["This command cannot be used in this channel."]
    );

    bot.harness.platform.clear();
    let listed = member_with(MEMBER_ID, &[(R1, 1)], Permissions::MODERATE_MEMBERS);
    let outcome = bot.send(message_from(11, listed, &warn_text())).await;

    assert_eq!(outcome, DispatchOutcome::Succeeded);
    let infractions = bot.harness.infraction_repo.all();
    assert_eq!(infractions.len(), 1);
    assert_eq!(infractions[0].user_id, sf(TARGET_ID));
    assert!(bot
        .harness
        .platform
        .messages()
        .contains(&format!("Warning `#1` issued for <@{TARGET_ID}> (`{TARGET_ID}`)")));
}

#[tokio::test]
async fn test_moderators_skip_channel_overrides() {
    let bot = TestBot::new();
    let mut settings = guild_with_warn_override();
    settings.moderator_roles.push(sf(MOD_ROLE));
    bot.harness.guild_repo.put(settings);
    bot.harness.platform.add_member(GUILD_ID, member(TARGET_ID, &[]));

    let moderator = member_with(MODERATOR_ID, &[(MOD_ROLE, 5)], Permissions::MODERATE_MEMBERS);
    let outcome = bot.send(message_from(10, moderator, &warn_text())).await;

    assert_eq!(outcome, DispatchOutcome::Succeeded);
}

// ============================================================================
// Message lifecycle
// ============================================================================

#[tokio::test]
async fn test_message_lifecycle_reaches_storage() {
    let bot = TestBot::new();
    let services = &bot.harness.services;

    bot.dispatch(GatewayEvent::GuildCreate(GuildEvent { guild_id: sf(GUILD_ID) })).await;
    assert_eq!(bot.harness.guild_repo.creates(), 1);

    // Plain chatter is buffered even though it is not a command
    let outcome = bot.send(guild_message(10, MEMBER_ID, "hello <@!200000000000000002>")).await;
    assert_eq!(outcome, DispatchOutcome::NotPrefixed);
    assert_eq!(services.messages().size(), 1);

    bot.dispatch(GatewayEvent::MessageUpdate(MessageUpdateEvent {
        id: sf(10),
        channel_id: sf(CHANNEL_ID),
        guild_id: Some(sf(GUILD_ID)),
        content: Some("hello again".to_string()),
    }))
    .await;

    bot.harness.platform.set_audit_entry(Some(AuditLogCandidate {
        executor_id: sf(MODERATOR_ID),
        target_id: sf(MEMBER_ID),
        channel_id: sf(CHANNEL_ID),
        created_at: chrono::Utc::now(),
        count: 1,
    }));
    bot.dispatch(GatewayEvent::MessageDelete(MessageDeleteEvent {
        id: sf(10),
        channel_id: sf(CHANNEL_ID),
        guild_id: Some(sf(GUILD_ID)),
    }))
    .await;
    assert_eq!(
        services.audit().current().map(|entry| entry.executor_id),
        Some(sf(MODERATOR_ID))
    );

    assert_eq!(services.messages().store().await.unwrap(), 1);
    let row = bot.harness.message_repo.row(sf(10)).unwrap();
    assert_eq!(row.content.as_deref(), Some("hello again"));
    assert!(row.deleted);
    assert_eq!(services.messages().size(), 0);

    bot.dispatch(GatewayEvent::GuildDelete(GuildEvent { guild_id: sf(GUILD_ID) })).await;
    assert!(services.guilds().is_empty());
}

#[tokio::test]
async fn test_ping_answers_in_direct_messages() {
    let bot = TestBot::new();

    let outcome = bot.send(direct_message(10, MEMBER_ID, ">ping")).await;

    assert_eq!(outcome, DispatchOutcome::Succeeded);
    assert_eq!(bot.harness.platform.messages(), vec!["Pinging..."]);
    assert_eq!(bot.harness.services.messages().size(), 0);
}
