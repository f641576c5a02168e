//! Infraction database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for infractions table
#[derive(Debug, Clone, FromRow)]
pub struct InfractionModel {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub moderator_id: i64,
    pub kind: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
