//! Infraction entity <-> model mapper

use warden_core::entities::{Infraction, InfractionType};
use warden_core::error::DomainError;
use warden_core::value_objects::Snowflake;

use crate::models::InfractionModel;

/// Convert InfractionModel to Infraction entity
///
/// Fails when the stored kind is not a known infraction type.
impl TryFrom<InfractionModel> for Infraction {
    type Error = DomainError;

    fn try_from(model: InfractionModel) -> Result<Self, Self::Error> {
        let kind = InfractionType::parse(&model.kind).ok_or_else(|| DomainError::CorruptRecord {
            field: "infractions.kind",
            reason: format!("unknown infraction type '{}'", model.kind),
        })?;

        Ok(Infraction {
            id: model.id,
            guild_id: Snowflake::new(model.guild_id),
            user_id: Snowflake::new(model.user_id),
            moderator_id: Snowflake::new(model.moderator_id),
            kind,
            reason: model.reason,
            created_at: model.created_at,
            expires_at: model.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(kind: &str) -> InfractionModel {
        InfractionModel {
            id: 7,
            guild_id: 1,
            user_id: 2,
            moderator_id: 3,
            kind: kind.to_string(),
            reason: "spam".into(),
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn test_known_kind() {
        let infraction = Infraction::try_from(model("Warn")).unwrap();
        assert_eq!(infraction.kind, InfractionType::Warn);
        assert_eq!(infraction.user_id, Snowflake::new(2));
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!(
            Infraction::try_from(model("Yell")),
            Err(DomainError::CorruptRecord { .. })
        ));
    }
}
