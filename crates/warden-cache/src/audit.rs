//! Deletion blame from message-delete audit log entries
//!
//! The platform folds repeated deletions into one audit entry and bumps its
//! count. The correlator remembers the last entry it saw so it can tell a
//! fresh deletion apart from a stale entry that merely matches.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use warden_core::entities::AuditLogCandidate;
use warden_core::value_objects::Snowflake;

/// A first-sight entry older than this is not trusted
pub const FRESH_ENTRY_WINDOW_MS: i64 = 3000;

#[derive(Debug, Default)]
pub struct AuditCorrelator {
    last: Mutex<Option<AuditLogCandidate>>,
}

impl AuditCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute a deletion to the executor of `candidate`, if the entry is trustworthy
    pub fn attribute_deletion(&self, candidate: AuditLogCandidate) -> Option<Snowflake> {
        self.attribute_deletion_at(candidate, Utc::now())
    }

    pub fn attribute_deletion_at(
        &self,
        candidate: AuditLogCandidate,
        now: DateTime<Utc>,
    ) -> Option<Snowflake> {
        let mut last = self.last.lock();

        if let Some(state) = last.as_mut().filter(|state| state.same_triple(&candidate)) {
            // Same streak: only a single step forward is this deletion
            if state.count.checked_add(1) == Some(candidate.count) {
                state.count = candidate.count;
                return Some(candidate.executor_id);
            }
            return None;
        }

        *last = Some(candidate);
        let age_ms = (now - candidate.created_at).num_milliseconds();
        (candidate.count == 1 && age_ms < FRESH_ENTRY_WINDOW_MS).then_some(candidate.executor_id)
    }

    /// Last entry seen
    pub fn current(&self) -> Option<AuditLogCandidate> {
        *self.last.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(executor: i64, count: u32, created_at: DateTime<Utc>) -> AuditLogCandidate {
        AuditLogCandidate {
            executor_id: Snowflake::new(executor),
            target_id: Snowflake::new(2),
            channel_id: Snowflake::new(3),
            created_at,
            count,
        }
    }

    #[test]
    fn test_fresh_single_entry_then_increment() {
        let correlator = AuditCorrelator::new();
        let now = Utc::now();

        assert_eq!(
            correlator.attribute_deletion_at(candidate(1, 1, now), now),
            Some(Snowflake::new(1))
        );
        assert_eq!(
            correlator.attribute_deletion_at(
                candidate(1, 2, now),
                now + Duration::milliseconds(10)
            ),
            Some(Snowflake::new(1))
        );
        assert_eq!(correlator.current().map(|c| c.count), Some(2));
    }

    #[test]
    fn test_stale_entry_is_not_trusted() {
        let correlator = AuditCorrelator::new();
        let now = Utc::now();

        let stale = candidate(1, 1, now - Duration::milliseconds(5000));
        assert_eq!(correlator.attribute_deletion_at(stale, now), None);
        assert_eq!(correlator.current(), Some(stale));
    }

    #[test]
    fn test_first_sight_with_count_above_one() {
        let correlator = AuditCorrelator::new();
        let now = Utc::now();
        assert_eq!(correlator.attribute_deletion_at(candidate(1, 3, now), now), None);
    }

    #[test]
    fn test_count_jump_or_repeat_is_unattributed() {
        let correlator = AuditCorrelator::new();
        let now = Utc::now();
        correlator.attribute_deletion_at(candidate(1, 1, now), now);

        assert_eq!(correlator.attribute_deletion_at(candidate(1, 3, now), now), None);
        assert_eq!(correlator.attribute_deletion_at(candidate(1, 1, now), now), None);
        assert_eq!(correlator.current().map(|c| c.count), Some(1));
    }

    #[test]
    fn test_new_triple_resets_state() {
        let correlator = AuditCorrelator::new();
        let now = Utc::now();
        correlator.attribute_deletion_at(candidate(1, 1, now), now);
        correlator.attribute_deletion_at(candidate(1, 2, now), now);

        assert_eq!(
            correlator.attribute_deletion_at(candidate(9, 1, now), now),
            Some(Snowflake::new(9))
        );
        assert_eq!(correlator.current().map(|c| c.executor_id), Some(Snowflake::new(9)));
    }
}
