use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use warden_core::entities::{
    GuildSettings, IncomingMessage, Infraction, InfractionType, MemberSnapshot, NewInfraction,
};
use warden_core::value_objects::{Permissions, Snowflake};

use crate::commands::{
    format_duration, parse_duration, Args, Command, CommandCategory, CommandContext,
    CommandMetadata, DurationArg,
};
use crate::services::{ServiceError, ServiceResult};

static METADATA: CommandMetadata = CommandMetadata {
    aliases: &["w", "strike"],
    description: "Warn a member.",
    usage: Some("<user> [duration|permanent] [reason]"),
    required_user_permissions: Permissions::MODERATE_MEMBERS,
    ..CommandMetadata::new("warn", CommandCategory::Moderation)
};

const KIND: InfractionType = InfractionType::Warn;

pub struct WarnCommand;

#[async_trait]
impl Command for WarnCommand {
    fn metadata(&self) -> &CommandMetadata {
        &METADATA
    }

    async fn message_run(&self, ctx: &CommandContext, mut args: Args) -> ServiceResult<()> {
        let message = ctx.message.as_ref();
        let (Some(guild_id), Some(settings), Some(executor)) =
            (message.guild_id, ctx.settings.as_deref(), message.member.as_ref())
        else {
            return Err(ServiceError::user("This command can only be used in a server."));
        };

        let raw_target = args.next().ok_or_else(|| {
            ServiceError::user(format!("You must provide a member to {}.", KIND.verb()))
        })?;
        let target_id = Snowflake::parse_user_mention(&raw_target)
            .map_err(|_| ServiceError::user("That is not a valid member."))?;
        let target = ctx
            .services
            .platform()
            .fetch_member(guild_id, target_id)
            .await?
            .ok_or_else(|| ServiceError::user("That is not a valid member."))?;

        check_target(message, executor, &target)?;

        let duration = take_duration(&mut args, settings);
        let reason = take_reason(&mut args, settings)?;

        if settings.auto_delete {
            if let Err(e) = ctx
                .services
                .platform()
                .delete_message(message.channel_id(), message.id)
                .await
            {
                debug!(error = %e, message_id = %message.id, "Failed to delete invoking message");
            }
        }

        let created_at = Utc::now();
        let infraction = ctx
            .services
            .infraction_repo()
            .create(&NewInfraction {
                guild_id,
                user_id: target_id,
                moderator_id: message.author.id,
                kind: KIND,
                reason,
                created_at,
                expires_at: duration.map(|ms| created_at + chrono::Duration::milliseconds(ms)),
            })
            .await?;

        info!(
            guild_id = %guild_id,
            infraction_id = infraction.id,
            user_id = %target_id,
            moderator_id = %message.author.id,
            "Warning issued"
        );

        let notice = direct_notice(message, settings, &infraction, duration);
        if let Err(e) = ctx.services.platform().send_direct(target_id, &notice).await {
            debug!(error = %e, user_id = %target_id, "Could not notify warned member");
        }

        if let Some(log_channel) = settings.infraction_log_target() {
            let entry = log_entry(&infraction);
            if let Err(e) = ctx.services.platform().send(log_channel, &entry).await {
                warn!(error = %e, channel_id = %log_channel, "Failed to post infraction log");
            }
        }

        ctx.services
            .platform()
            .send(
                message.channel_id(),
                &format!(
                    "Warning `#{}` issued for <@{target_id}> (`{target_id}`)",
                    infraction.id
                ),
            )
            .await?;
        Ok(())
    }
}

/// Reject targets the executor may not act on
fn check_target(
    message: &IncomingMessage,
    executor: &MemberSnapshot,
    target: &MemberSnapshot,
) -> ServiceResult<()> {
    let verb = KIND.verb();

    if target.user_id == message.author.id {
        return Err(ServiceError::user(format!("You cannot {verb} yourself.")));
    }
    if target.user_id == message.client.user_id {
        return Err(ServiceError::user(format!("You cannot {verb} me.")));
    }
    if target.is_owner {
        return Err(ServiceError::user(format!("You cannot {verb} the server owner.")));
    }
    if !executor.outranks(target) {
        return Err(ServiceError::user(format!(
            "You cannot {verb} someone with higher or equal roles than you."
        )));
    }
    if target.is_administrator {
        return Err(ServiceError::user(format!("You cannot {verb} an administrator.")));
    }
    Ok(())
}

/// Milliseconds until expiry, `None` for a warning that never expires
///
/// Only consumes the next argument when it parses as a duration.
fn take_duration(args: &mut Args, settings: &GuildSettings) -> Option<i64> {
    match args.peek().and_then(parse_duration) {
        Some(DurationArg::Permanent) => {
            args.next();
            None
        }
        Some(DurationArg::Finite(ms)) if ms > 0 => {
            args.next();
            Some(ms)
        }
        _ => (settings.default_warning_duration > 0).then_some(settings.default_warning_duration),
    }
}

fn take_reason(args: &mut Args, settings: &GuildSettings) -> ServiceResult<String> {
    let Some(reason) = args.rest().filter(|r| !r.is_empty()) else {
        if settings.require_infraction_reason {
            return Err(ServiceError::user("You must provide a reason for this warning."));
        }
        return Ok(Infraction::DEFAULT_REASON.to_string());
    };

    let length = reason.chars().count();
    if length > Infraction::REASON_MAX_LENGTH {
        return Err(ServiceError::user(format!(
            "The reason cannot exceed {} characters ({length} provided).",
            Infraction::REASON_MAX_LENGTH
        )));
    }
    Ok(reason)
}

fn direct_notice(
    message: &IncomingMessage,
    settings: &GuildSettings,
    infraction: &Infraction,
    duration: Option<i64>,
) -> String {
    let guild = message.guild_name.as_deref().unwrap_or("a server");
    let mut notice = format!(
        "You have been {} {} **{guild}**.\nReason: {}\nDuration: {}",
        KIND.past_tense(),
        KIND.preposition(),
        infraction.reason,
        duration.map_or_else(|| "Permanent".to_string(), format_duration),
    );
    if settings.show_executor {
        notice.push_str(&format!("\nModerator: {}", message.author.username));
    }
    notice
}

fn log_entry(infraction: &Infraction) -> String {
    format!(
        "**{}** `#{}`\nMember: <@{user}> (`{user}`)\nModerator: <@{moderator}> (`{moderator}`)\nReason: {}\nExpires: {}",
        infraction.kind,
        infraction.id,
        infraction.reason,
        infraction.expires_at.map_or_else(|| "Never".to_string(), relative_timestamp),
        user = infraction.user_id,
        moderator = infraction.moderator_id,
    )
}

fn relative_timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{guild_message, member, PlatformCall, TestServices, GUILD_ID, MEMBER_ID, TARGET_ID};

    const MOD_ROLE: i64 = 500_000_000_000_000_010;
    const MEMBER_ROLE: i64 = 500_000_000_000_000_001;
    const LOG_CHANNEL: i64 = 400_000_000_000_000_009;

    fn harness_with(configure: impl FnOnce(&mut GuildSettings)) -> TestServices {
        let harness = TestServices::new();
        let mut settings = GuildSettings::new(Snowflake::new(GUILD_ID));
        configure(&mut settings);
        harness.guild_repo.put(settings);
        harness
            .platform
            .add_member(GUILD_ID, member(TARGET_ID, &[(MEMBER_ROLE, 1)]));
        harness
    }

    async fn run_as(harness: &TestServices, mut message: IncomingMessage, params: &str) -> ServiceResult<()> {
        if message.member.as_ref().is_some_and(|m| m.roles.is_empty()) {
            message.member = Some(member(MEMBER_ID, &[(MOD_ROLE, 10)]));
        }
        let ctx = harness.command_context(message, "warn").await;
        WarnCommand.message_run(&ctx, Args::new(params)).await
    }

    async fn run(harness: &TestServices, params: &str) -> ServiceResult<()> {
        let message = guild_message(10, MEMBER_ID, &format!(">warn {params}"));
        run_as(harness, message, params).await
    }

    fn user_message(result: ServiceResult<()>) -> String {
        match result {
            Err(ServiceError::User(message)) => message,
            other => panic!("expected a user error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_warn_with_duration_and_reason() {
        let harness = harness_with(|_| {});

        run(&harness, "<@200000000000000002> 1d spamming links").await.unwrap();

        let stored = harness.infraction_repo.all();
        assert_eq!(stored.len(), 1);
        let infraction = &stored[0];
        assert_eq!(infraction.kind, InfractionType::Warn);
        assert_eq!(infraction.user_id, Snowflake::new(TARGET_ID));
        assert_eq!(infraction.moderator_id, Snowflake::new(MEMBER_ID));
        assert_eq!(infraction.reason, "spamming links");
        assert_eq!(
            infraction.expires_at,
            Some(infraction.created_at + chrono::Duration::days(1))
        );

        assert_eq!(
            harness.platform.messages(),
            vec!["Warning `#1` issued for <@200000000000000002> (`200000000000000002`)"]
        );
        assert!(harness
            .platform
            .calls()
            .iter()
            .any(|c| matches!(c, PlatformCall::Direct { user_id, .. } if *user_id == Snowflake::new(TARGET_ID))));
    }

    #[tokio::test]
    async fn test_default_reason_and_guild_default_duration() {
        let harness = harness_with(|s| s.default_warning_duration = 3_600_000);

        run(&harness, "200000000000000002").await.unwrap();

        let infraction = &harness.infraction_repo.all()[0];
        assert_eq!(infraction.reason, "Unspecified.");
        assert_eq!(
            infraction.expires_at,
            Some(infraction.created_at + chrono::Duration::hours(1))
        );
    }

    #[tokio::test]
    async fn test_permanent_overrides_default_duration() {
        let harness = harness_with(|s| s.default_warning_duration = 3_600_000);

        run(&harness, "<@!200000000000000002> permanent being rude").await.unwrap();

        let infraction = &harness.infraction_repo.all()[0];
        assert_eq!(infraction.expires_at, None);
        assert_eq!(infraction.reason, "being rude");
    }

    #[tokio::test]
    async fn test_invalid_targets() {
        let harness = harness_with(|_| {});

        assert_eq!(user_message(run(&harness, "").await), "You must provide a member to warn.");
        assert_eq!(user_message(run(&harness, "nobody").await), "That is not a valid member.");
        assert_eq!(
            user_message(run(&harness, "200000000000000077").await),
            "That is not a valid member."
        );

        harness.platform.add_member(GUILD_ID, member(MEMBER_ID, &[(MOD_ROLE, 10)]));
        assert_eq!(
            user_message(run(&harness, "200000000000000001").await),
            "You cannot warn yourself."
        );
        assert!(harness.infraction_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_cannot_warn_the_bot() {
        let harness = harness_with(|_| {});
        let bot = 200_000_000_000_000_099;
        harness.platform.add_member(GUILD_ID, member(bot, &[]));

        let mut message = guild_message(10, MEMBER_ID, ">warn 200000000000000099");
        message.client.user_id = Snowflake::new(bot);

        assert_eq!(
            user_message(run_as(&harness, message, "200000000000000099").await),
            "You cannot warn me."
        );
    }

    #[tokio::test]
    async fn test_hierarchy_checks() {
        let harness = harness_with(|_| {});
        let owner = 200_000_000_000_000_011;
        let senior = 200_000_000_000_000_012;
        let admin = 200_000_000_000_000_013;

        let mut owner_member = member(owner, &[]);
        owner_member.is_owner = true;
        harness.platform.add_member(GUILD_ID, owner_member);
        harness.platform.add_member(GUILD_ID, member(senior, &[(500_000_000_000_000_020, 20)]));
        let mut admin_member = member(admin, &[(MEMBER_ROLE, 1)]);
        admin_member.is_administrator = true;
        harness.platform.add_member(GUILD_ID, admin_member);

        assert_eq!(
            user_message(run(&harness, "200000000000000011").await),
            "You cannot warn the server owner."
        );
        assert_eq!(
            user_message(run(&harness, "200000000000000012").await),
            "You cannot warn someone with higher or equal roles than you."
        );
        assert_eq!(
            user_message(run(&harness, "200000000000000013").await),
            "You cannot warn an administrator."
        );
    }

    #[tokio::test]
    async fn test_reason_rules() {
        let harness = harness_with(|s| s.require_infraction_reason = true);
        assert_eq!(
            user_message(run(&harness, "200000000000000002 2h").await),
            "You must provide a reason for this warning."
        );

        let long = "a".repeat(1001);
        assert_eq!(
            user_message(run(&harness, &format!("200000000000000002 {long}")).await),
            "The reason cannot exceed 1000 characters (1001 provided)."
        );
        assert!(harness.infraction_repo.all().is_empty());
    }

    #[tokio::test]
    async fn test_auto_delete_and_infraction_log() {
        let harness = harness_with(|s| {
            s.auto_delete = true;
            s.infraction_log_channel = Some(Snowflake::new(LOG_CHANNEL));
            s.infraction_log_enabled = true;
        });
        harness.platform.fail_direct(true);

        run(&harness, "200000000000000002 spam").await.unwrap();

        assert_eq!(harness.platform.deleted(), vec![Snowflake::new(10)]);
        let calls = harness.platform.calls();
        let log = calls.iter().find_map(|c| match c {
            PlatformCall::Send { channel_id, content } if *channel_id == Snowflake::new(LOG_CHANNEL) => {
                Some(content.clone())
            }
            _ => None,
        });
        let log = log.expect("infraction log posted");
        assert!(log.starts_with("**Warn** `#1`"));
        assert!(log.contains("Reason: spam"));
        assert!(log.ends_with("Expires: Never"));
        assert!(!calls.iter().any(|c| matches!(c, PlatformCall::Direct { .. })));
    }
}
