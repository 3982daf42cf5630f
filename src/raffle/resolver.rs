//! Entity resolution
//!
//! The raffle core only stores ids. Whether an id still points at a live
//! user or role is answered by an [`EntityResolver`], which the bot backs
//! with the serenity cache.

use poise::serenity_prelude::{self as serenity, GuildId, RoleId, UserId};
use std::sync::Arc;

/// Looks up users and roles by id
#[cfg_attr(test, mockall::automock)]
pub trait EntityResolver: Send + Sync {
    /// Display name of the user, or `None` if the user cannot be found
    fn resolve_user(&self, user_id: u64) -> Option<String>;

    /// Name of the role in the guild, or `None` if it does not exist there
    fn resolve_role(&self, guild_id: u64, role_id: u64) -> Option<String>;

    /// Whether every member of the guild is known, so a missing user
    /// really has left rather than just not being loaded yet
    fn users_complete(&self, guild_id: u64) -> bool;
}

/// Large guilds arrive with a partial member list until it is chunked
#[must_use]
pub fn member_cache_complete(cached_members: usize, member_count: u64) -> bool {
    u64::try_from(cached_members).is_ok_and(|cached| cached >= member_count)
}

/// Resolver backed by the gateway cache
#[derive(Clone)]
pub struct CacheResolver {
    cache: Arc<serenity::Cache>,
}

impl CacheResolver {
    #[must_use]
    pub fn new(cache: Arc<serenity::Cache>) -> Self {
        Self { cache }
    }
}

impl EntityResolver for CacheResolver {
    fn resolve_user(&self, user_id: u64) -> Option<String> {
        // Snowflakes are never zero; serenity ids panic on it
        if user_id == 0 {
            return None;
        }
        self.cache
            .user(UserId::new(user_id))
            .map(|user| user.name.clone())
    }

    fn resolve_role(&self, guild_id: u64, role_id: u64) -> Option<String> {
        if guild_id == 0 || role_id == 0 {
            return None;
        }
        let guild = self.cache.guild(GuildId::new(guild_id))?;
        guild
            .roles
            .get(&RoleId::new(role_id))
            .map(|role| role.name.clone())
    }

    fn users_complete(&self, guild_id: u64) -> bool {
        if guild_id == 0 {
            return false;
        }
        self.cache
            .guild(GuildId::new(guild_id))
            .is_some_and(|guild| member_cache_complete(guild.members.len(), guild.member_count))
    }
}
