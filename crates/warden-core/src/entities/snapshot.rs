//! Platform snapshots - the slice of gateway state the bot needs per message
//!
//! The gateway adapter builds these from its cache so the command pipeline
//! never talks to the platform client directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Permissions, Snowflake};

/// Message author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub id: Snowflake,
    pub username: String,
    pub bot: bool,
}

/// A role held by a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub id: Snowflake,
    pub position: i32,
}

/// Guild member state relevant to permission checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub user_id: Snowflake,
    pub roles: Vec<RoleSnapshot>,
    pub is_owner: bool,
    /// Guild level administrator permission
    pub is_administrator: bool,
    /// Effective permissions in the invocation channel, `None` when they could not be computed
    pub channel_permissions: Option<Permissions>,
}

impl MemberSnapshot {
    pub fn role_ids(&self) -> Vec<Snowflake> {
        self.roles.iter().map(|r| r.id).collect()
    }

    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.roles.iter().any(|r| r.id == role_id)
    }

    /// Roles ordered from highest to lowest rank
    ///
    /// Equal positions are broken by id, older (smaller) ids rank higher.
    pub fn roles_by_rank(&self) -> Vec<RoleSnapshot> {
        let mut roles = self.roles.clone();
        roles.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));
        roles
    }

    /// Highest role held, `None` for members with only the default role
    pub fn highest_role(&self) -> Option<RoleSnapshot> {
        self.roles_by_rank().into_iter().next()
    }

    /// Whether this member outranks `other` in the role hierarchy
    pub fn outranks(&self, other: &MemberSnapshot) -> bool {
        if self.is_owner {
            return true;
        }
        if other.is_owner {
            return false;
        }
        match (self.highest_role(), other.highest_role()) {
            (Some(mine), Some(theirs)) => {
                mine.position > theirs.position
                    || (mine.position == theirs.position && mine.id < theirs.id)
            }
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Invocation channel with its ancestry (thread -> channel -> category)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub id: Snowflake,
    pub parent_id: Option<Snowflake>,
    pub grandparent_id: Option<Snowflake>,
}

impl ChannelSnapshot {
    pub fn new(id: Snowflake) -> Self {
        Self { id, parent_id: None, grandparent_id: None }
    }

    /// The channel, then its parent, then the parent's parent
    pub fn lineage(&self) -> Vec<Snowflake> {
        std::iter::once(self.id)
            .chain(self.parent_id)
            .chain(self.grandparent_id)
            .collect()
    }
}

/// The bot's own standing in the invocation channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub user_id: Snowflake,
    /// Role the platform created for the bot in this guild
    pub managed_role_id: Option<Snowflake>,
    /// `None` outside guilds
    pub channel_permissions: Option<Permissions>,
    pub member: Option<MemberSnapshot>,
}

/// An inbound message, normalized away from the platform client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub guild_name: Option<String>,
    pub channel: ChannelSnapshot,
    pub author: AuthorSnapshot,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sticker_id: Option<Snowflake>,
    pub reference_id: Option<Snowflake>,
    /// Present for guild messages
    pub member: Option<MemberSnapshot>,
    pub client: ClientSnapshot,
}

impl IncomingMessage {
    #[inline]
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }

    #[inline]
    pub fn channel_id(&self) -> Snowflake {
        self.channel.id
    }

    /// Member role ids, empty outside guilds
    pub fn member_role_ids(&self) -> Vec<Snowflake> {
        self.member.as_ref().map(MemberSnapshot::role_ids).unwrap_or_default()
    }

    /// Whether the bot may read and answer in the invocation channel
    pub fn client_can_respond(&self) -> bool {
        if !self.in_guild() {
            return true;
        }
        self.client
            .channel_permissions
            .is_some_and(|p| p.has(Permissions::RESPOND))
    }
}
