//! Test fixtures and data generators
//!
//! Members and messages for the scenario tests. Ids of the shared test
//! guild come from `warden_service::testing`.

use std::sync::atomic::{AtomicI64, Ordering};

use warden_core::entities::{IncomingMessage, MemberSnapshot};
use warden_core::value_objects::Permissions;
use warden_service::testing::{guild_message, member};

pub const ADMIN_ID: i64 = 200_000_000_000_000_101;
pub const MODERATOR_ID: i64 = 200_000_000_000_000_102;

pub const MOD_ROLE: i64 = 500_000_000_000_000_101;
pub const R1: i64 = 500_000_000_000_000_102;

/// Base for ids written to a shared database
const DATABASE_ID_BASE: i64 = 900_000_000_000_000_000;

/// Counter for unique test data
static COUNTER: AtomicI64 = AtomicI64::new(1);

/// An id no other test run uses
pub fn unique_id() -> i64 {
    let run = i64::from(std::process::id()) * 1_000_000;
    DATABASE_ID_BASE + run + COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A guild administrator
pub fn admin() -> MemberSnapshot {
    MemberSnapshot { is_administrator: true, ..member(ADMIN_ID, &[]) }
}

/// A member holding `roles` with `permissions` in the invocation channel
pub fn member_with(user_id: i64, roles: &[(i64, i32)], permissions: Permissions) -> MemberSnapshot {
    MemberSnapshot {
        channel_permissions: Some(Permissions::RESPOND | permissions),
        ..member(user_id, roles)
    }
}

/// A guild message sent by `author`
pub fn message_from(id: i64, author: MemberSnapshot, content: &str) -> IncomingMessage {
    let author_id = author.user_id.into_inner();
    let mut message = guild_message(id, author_id, content);
    message.member = Some(author);
    message
}
