//! Audit log candidate - the newest "message deleted" audit log entry

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// A message-delete audit log entry as reported by the platform
///
/// The platform merges consecutive deletions by the same executor, in the
/// same channel, of messages from the same author into one entry and bumps
/// `count` instead of creating a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogCandidate {
    pub executor_id: Snowflake,
    pub target_id: Snowflake,
    pub channel_id: Snowflake,
    pub created_at: DateTime<Utc>,
    pub count: u32,
}

impl AuditLogCandidate {
    /// Whether both entries describe the same (channel, target, executor) triple
    #[inline]
    pub fn same_triple(&self, other: &AuditLogCandidate) -> bool {
        self.channel_id == other.channel_id
            && self.target_id == other.target_id
            && self.executor_id == other.executor_id
    }
}
