//! Conversions from serenity models into core snapshots
//!
//! Permission math runs on [`RoleTable`] and [`Overwrite`] so it does not
//! depend on which serenity type (cached guild, partial guild) the roles
//! came from.

use std::collections::HashMap;

use serenity::model::channel::{GuildChannel, Message, PermissionOverwriteType};
use serenity::model::guild::{Guild, Role};
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use warden_core::entities::{
    AuthorSnapshot, ChannelSnapshot, ClientSnapshot, IncomingMessage, MemberSnapshot, RoleSnapshot,
};
use warden_core::value_objects::{Permissions, Snowflake};

#[inline]
pub fn snowflake(id: impl Into<u64>) -> Snowflake {
    Snowflake::from(id.into())
}

#[inline]
pub fn permissions(bits: serenity::model::Permissions) -> Permissions {
    Permissions::from_bits_retain(bits.bits())
}

fn role_ids(roles: &[RoleId]) -> Vec<Snowflake> {
    roles.iter().map(|&id| snowflake(id)).collect()
}

// ============================================================================
// Roles
// ============================================================================

/// A guild role as far as permission checks are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleEntry {
    pub position: i32,
    pub permissions: Permissions,
    /// Set on the role the platform manages for a bot
    pub bot_id: Option<Snowflake>,
}

/// Roles of one guild with its owner
#[derive(Debug, Clone)]
pub struct RoleTable {
    guild_id: Snowflake,
    owner_id: Snowflake,
    roles: HashMap<Snowflake, RoleEntry>,
}

impl RoleTable {
    pub fn new(guild_id: Snowflake, owner_id: Snowflake) -> Self {
        Self { guild_id, owner_id, roles: HashMap::new() }
    }

    pub fn from_roles<'a>(
        guild_id: GuildId,
        owner_id: UserId,
        roles: impl IntoIterator<Item = &'a Role>,
    ) -> Self {
        let mut table = Self::new(snowflake(guild_id), snowflake(owner_id));
        for role in roles {
            table.insert(
                snowflake(role.id),
                RoleEntry {
                    position: i32::from(role.position),
                    permissions: permissions(role.permissions),
                    bot_id: role.tags.bot_id.map(snowflake),
                },
            );
        }
        table
    }

    pub fn from_guild(guild: &Guild) -> Self {
        Self::from_roles(guild.id, guild.owner_id, guild.roles.values())
    }

    pub fn insert(&mut self, id: Snowflake, entry: RoleEntry) {
        self.roles.insert(id, entry);
    }

    /// The @everyone role shares the guild's id
    fn everyone(&self) -> Permissions {
        self.roles
            .get(&self.guild_id)
            .map_or_else(Permissions::empty, |role| role.permissions)
    }

    /// Guild level permissions of a member
    pub fn base_permissions(&self, user_id: Snowflake, role_ids: &[Snowflake]) -> Permissions {
        if user_id == self.owner_id {
            return Permissions::all();
        }
        let held = role_ids
            .iter()
            .filter_map(|id| self.roles.get(id))
            .map(|role| role.permissions);
        Permissions::combine(std::iter::once(self.everyone()).chain(held))
    }

    /// Permissions in a channel, applying overwrites in platform order:
    /// @everyone, then all held roles together, then the member
    pub fn channel_permissions(
        &self,
        user_id: Snowflake,
        role_ids: &[Snowflake],
        overwrites: &[Overwrite],
    ) -> Permissions {
        let base = self.base_permissions(user_id, role_ids);
        if base.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }

        let mut effective = base;
        if let Some(everyone) = overwrites
            .iter()
            .find(|o| o.target == OverwriteTarget::Role(self.guild_id))
        {
            effective = everyone.apply(effective);
        }

        let (allow, deny) = overwrites
            .iter()
            .filter(|o| matches!(o.target, OverwriteTarget::Role(id) if role_ids.contains(&id)))
            .fold((Permissions::empty(), Permissions::empty()), |(allow, deny), o| {
                (allow | o.allow, deny | o.deny)
            });
        effective = (effective & !deny) | allow;

        if let Some(member) = overwrites
            .iter()
            .find(|o| o.target == OverwriteTarget::Member(user_id))
        {
            effective = member.apply(effective);
        }
        effective
    }

    /// Role the platform created for the given bot
    pub fn managed_role(&self, bot_id: Snowflake) -> Option<Snowflake> {
        self.roles
            .iter()
            .find(|(_, role)| role.bot_id == Some(bot_id))
            .map(|(&id, _)| id)
    }

    /// Member snapshot, with channel permissions when the channel is known
    pub fn member(
        &self,
        user_id: Snowflake,
        role_ids: &[Snowflake],
        overwrites: Option<&[Overwrite]>,
    ) -> MemberSnapshot {
        let roles = role_ids
            .iter()
            .filter(|&&id| id != self.guild_id)
            .filter_map(|&id| {
                self.roles
                    .get(&id)
                    .map(|role| RoleSnapshot { id, position: role.position })
            })
            .collect();

        MemberSnapshot {
            user_id,
            roles,
            is_owner: user_id == self.owner_id,
            is_administrator: self
                .base_permissions(user_id, role_ids)
                .contains(Permissions::ADMINISTRATOR),
            channel_permissions: overwrites
                .map(|overwrites| self.channel_permissions(user_id, role_ids, overwrites)),
        }
    }
}

// ============================================================================
// Channels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteTarget {
    Role(Snowflake),
    Member(Snowflake),
}

/// A channel permission overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overwrite {
    pub target: OverwriteTarget,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl Overwrite {
    fn apply(&self, permissions: Permissions) -> Permissions {
        (permissions & !self.deny) | self.allow
    }
}

fn overwrites(channel: &GuildChannel) -> Vec<Overwrite> {
    channel
        .permission_overwrites
        .iter()
        .filter_map(|o| {
            let target = match o.kind {
                PermissionOverwriteType::Role(id) => OverwriteTarget::Role(snowflake(id)),
                PermissionOverwriteType::Member(id) => OverwriteTarget::Member(snowflake(id)),
                _ => return None,
            };
            Some(Overwrite { target, allow: permissions(o.allow), deny: permissions(o.deny) })
        })
        .collect()
}

/// A channel's ancestry and the overwrites that govern it
///
/// Threads take their permissions from the parent channel.
#[derive(Debug, Clone)]
pub struct ChannelContext {
    pub snapshot: ChannelSnapshot,
    pub overwrites: Vec<Overwrite>,
}

pub fn channel_context(guild: &Guild, channel_id: ChannelId) -> Option<ChannelContext> {
    if let Some(channel) = guild.channels.get(&channel_id) {
        return Some(ChannelContext {
            snapshot: ChannelSnapshot {
                id: snowflake(channel.id),
                parent_id: channel.parent_id.map(snowflake),
                grandparent_id: None,
            },
            overwrites: overwrites(channel),
        });
    }

    let thread = guild.threads.iter().find(|t| t.id == channel_id)?;
    let parent = thread.parent_id.and_then(|id| guild.channels.get(&id));
    Some(ChannelContext {
        snapshot: ChannelSnapshot {
            id: snowflake(thread.id),
            parent_id: thread.parent_id.map(snowflake),
            grandparent_id: parent.and_then(|p| p.parent_id).map(snowflake),
        },
        overwrites: parent.map(overwrites).unwrap_or_default(),
    })
}

// ============================================================================
// Messages
// ============================================================================

/// Normalize a serenity message
///
/// `guild` is the cached guild the message was sent in. Without it the
/// member and the bot's channel permissions stay unknown, and the message
/// is ignored by the command pipeline.
pub fn incoming_message(msg: &Message, guild: Option<&Guild>, bot_id: UserId) -> IncomingMessage {
    let mut message = IncomingMessage {
        id: snowflake(msg.id),
        guild_id: msg.guild_id.map(snowflake),
        guild_name: None,
        channel: ChannelSnapshot::new(snowflake(msg.channel_id)),
        author: AuthorSnapshot {
            id: snowflake(msg.author.id),
            username: msg.author.name.clone(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        created_at: snowflake(msg.id).created_at(),
        sticker_id: msg.sticker_items.first().map(|s| snowflake(s.id)),
        reference_id: msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(snowflake),
        member: None,
        client: ClientSnapshot {
            user_id: snowflake(bot_id),
            managed_role_id: None,
            channel_permissions: None,
            member: None,
        },
    };

    let Some(guild) = guild.filter(|g| Some(g.id) == msg.guild_id) else {
        return message;
    };

    let table = RoleTable::from_guild(guild);
    let channel = channel_context(guild, msg.channel_id);
    if let Some(channel) = &channel {
        message.channel = channel.snapshot;
    }
    let overwrites = channel.as_ref().map(|c| c.overwrites.as_slice());

    let author_roles = guild
        .members
        .get(&msg.author.id)
        .map(|m| role_ids(&m.roles))
        .or_else(|| msg.member.as_ref().map(|m| role_ids(&m.roles)))
        .unwrap_or_default();

    message.guild_name = Some(guild.name.clone());
    message.member = Some(table.member(message.author.id, &author_roles, overwrites));
    message.client.managed_role_id = table.managed_role(message.client.user_id);
    if let Some(bot) = guild.members.get(&bot_id) {
        let bot = table.member(message.client.user_id, &role_ids(&bot.roles), overwrites);
        message.client.channel_permissions = bot.channel_permissions;
        message.client.member = Some(bot);
    }
    message
}
