//! GuildSettings entity <-> model mapper

use serde::de::DeserializeOwned;
use serde::Serialize;
use warden_core::entities::{ChannelOverride, GuildSettings, RoleOverride};
use warden_core::error::DomainError;
use warden_core::value_objects::Snowflake;

use crate::models::GuildSettingsModel;

/// Decode a JSONB override list
fn decode_overrides<T: DeserializeOwned>(
    field: &'static str,
    value: serde_json::Value,
) -> Result<Vec<T>, DomainError> {
    serde_json::from_value(value).map_err(|e| DomainError::CorruptRecord {
        field,
        reason: e.to_string(),
    })
}

fn encode_overrides<T: Serialize>(
    field: &'static str,
    overrides: &[T],
) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(overrides)
        .map_err(|e| DomainError::ValidationError(format!("cannot encode {field}: {e}")))
}

/// Convert GuildSettingsModel to GuildSettings entity
///
/// Fails when an override list does not have the expected shape, so a bad
/// row is never read (and later written back) as an empty list.
impl TryFrom<GuildSettingsModel> for GuildSettings {
    type Error = DomainError;

    fn try_from(model: GuildSettingsModel) -> Result<Self, Self::Error> {
        let role_overrides: Vec<RoleOverride> =
            decode_overrides("guilds.role_overrides", model.role_overrides)?;
        let channel_overrides: Vec<ChannelOverride> =
            decode_overrides("guilds.channel_overrides", model.channel_overrides)?;

        Ok(GuildSettings {
            id: Snowflake::new(model.id),
            prefix: model.prefix,
            auto_delete: model.auto_delete,
            respond_if_no_perms: model.respond_if_no_perms,
            respond_if_disabled: model.respond_if_disabled,
            respond_if_disabled_in_channel: model.respond_if_disabled_in_channel,
            preserve_errors: model.preserve_errors,
            show_executor: model.show_executor,
            error_delete_delay: model.error_delete_delay,
            disabled_commands: model.disabled_commands,
            role_overrides,
            channel_overrides,
            moderator_roles: model.moderator_roles.into_iter().map(Snowflake::new).collect(),
            infraction_log_channel: model.infraction_log_channel.map(Snowflake::new),
            infraction_log_enabled: model.infraction_log_enabled,
            require_infraction_reason: model.require_infraction_reason,
            default_mute_duration: model.default_mute_duration,
            default_warning_duration: model.default_warning_duration,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// GuildSettings values prepared for an UPDATE
pub struct GuildSettingsUpdate<'a> {
    pub id: i64,
    pub prefix: &'a str,
    pub disabled_commands: &'a [String],
    pub role_overrides: serde_json::Value,
    pub channel_overrides: serde_json::Value,
    pub moderator_roles: Vec<i64>,
    pub infraction_log_channel: Option<i64>,
}

impl<'a> GuildSettingsUpdate<'a> {
    pub fn new(settings: &'a GuildSettings) -> Result<Self, DomainError> {
        Ok(Self {
            id: settings.id.into_inner(),
            prefix: &settings.prefix,
            disabled_commands: &settings.disabled_commands,
            role_overrides: encode_overrides("guilds.role_overrides", &settings.role_overrides)?,
            channel_overrides: encode_overrides(
                "guilds.channel_overrides",
                &settings.channel_overrides,
            )?,
            moderator_roles: settings
                .moderator_roles
                .iter()
                .map(|r| r.into_inner())
                .collect(),
            infraction_log_channel: settings.infraction_log_channel.map(Snowflake::into_inner),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn model(role_overrides: serde_json::Value) -> GuildSettingsModel {
        model_with(role_overrides, json!([]))
    }

    fn model_with(
        role_overrides: serde_json::Value,
        channel_overrides: serde_json::Value,
    ) -> GuildSettingsModel {
        GuildSettingsModel {
            id: 1,
            prefix: "!".into(),
            auto_delete: false,
            respond_if_no_perms: true,
            respond_if_disabled: true,
            respond_if_disabled_in_channel: true,
            preserve_errors: false,
            show_executor: true,
            error_delete_delay: 7500,
            disabled_commands: vec!["warn".into()],
            role_overrides,
            channel_overrides,
            moderator_roles: vec![5],
            infraction_log_channel: None,
            infraction_log_enabled: false,
            require_infraction_reason: false,
            default_mute_duration: 0,
            default_warning_duration: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_model_to_entity() {
        let settings = GuildSettings::try_from(model(json!([
            { "id": "123456789012345678", "commands": ["warn"] }
        ])))
        .unwrap();
        assert_eq!(settings.prefix, "!");
        assert!(settings.is_disabled("warn"));
        assert_eq!(settings.role_overrides.len(), 1);
        assert_eq!(settings.moderator_roles, vec![Snowflake::new(5)]);
    }

    #[test]
    fn test_malformed_role_overrides_are_rejected() {
        let err = GuildSettings::try_from(model(json!({ "not": "a list" }))).unwrap_err();
        assert!(matches!(
            err,
            DomainError::CorruptRecord { field: "guilds.role_overrides", .. }
        ));
    }

    #[test]
    fn test_one_bad_channel_override_rejects_the_row() {
        let channels = json!([
            { "id": "123456789012345678", "roles": [], "commands": ["warn"] },
            { "id": 42, "commands": "warn" }
        ]);
        let err = GuildSettings::try_from(model_with(json!([]), channels)).unwrap_err();
        assert_eq!(err.code(), "CORRUPT_RECORD");
    }

    #[test]
    fn test_update_values() {
        let mut settings = GuildSettings::new(Snowflake::new(9));
        settings.moderator_roles = vec![Snowflake::new(3)];
        let update = GuildSettingsUpdate::new(&settings).unwrap();
        assert_eq!(update.id, 9);
        assert_eq!(update.moderator_roles, vec![3]);
        assert_eq!(update.role_overrides, json!([]));
    }
}
