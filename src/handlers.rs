use crate::raffle::member_cache_complete;
use crate::{Data, EVENT_TARGET};
use poise::serenity_prelude::{
    self as serenity, ChunkGuildFilter, Context, EventHandler, Guild, GuildId, Ready,
};
use tracing::{debug, error, info, warn};

pub struct Handler {
    pub data: Data,
}

impl Handler {
    #[must_use]
    pub fn new(data: Data) -> Self {
        Self { data }
    }

    /// Whether a guild the bot was just added to should be left again.
    /// Guilds arriving on reconnect or startup are not new joins.
    pub async fn should_leave(&self, guild_id: GuildId, is_new: Option<bool>) -> bool {
        is_new == Some(true) && self.data.blocklist.contains(guild_id.get()).await
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready, but the cache may not be fully populated yet.
    async fn ready(&self, ctx: Context, ready: Ready) {
        let user_name = ready.user.name.clone();
        let shard_id = ctx.shard_id;
        info!(target: EVENT_TARGET, "Connected as {user_name}, shard {shard_id}");
    }

    /// Called when the cache is fully populated.
    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        let guild_count_cache = ctx.cache.guild_count();
        let guild_count = guilds.len();
        if guild_count != guild_count_cache {
            warn!(
                target: EVENT_TARGET,
                "Cache guild count mismatch: {guild_count_cache} (cache) vs {guild_count} (actual)"
            );
        }
        info!(target: EVENT_TARGET, "Cache ready! The bot is in {guild_count} guild(s)");
    }

    /// Leave blocklisted guilds as soon as the bot is added to them, and
    /// request the full member list of every other guild.
    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if !self.should_leave(guild.id, is_new).await {
            if !member_cache_complete(guild.members.len(), guild.member_count) {
                debug!(
                    target: EVENT_TARGET,
                    guild_id = guild.id.get(),
                    cached = guild.members.len(),
                    member_count = guild.member_count,
                    "Requesting guild member chunks"
                );
                ctx.shard
                    .chunk_guild(guild.id, None, false, ChunkGuildFilter::None, None);
            }
            return;
        }
        match guild.id.leave(&ctx.http).await {
            Ok(()) => info!(
                target: EVENT_TARGET,
                guild_id = guild.id.get(),
                guild_name = %guild.name,
                event = "blocklist_leave",
                "Left blocklisted guild"
            ),
            Err(e) => error!(
                target: EVENT_TARGET,
                guild_id = guild.id.get(),
                error = %e,
                "Failed to leave blocklisted guild"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_implements_event_handler() {
        fn assert_impl<T: EventHandler>() {}
        assert_impl::<Handler>();
    }

    #[tokio::test]
    async fn test_should_leave_only_new_blocklisted_guilds() {
        let data = Data::new();
        data.blocklist.add(42).await.unwrap();
        let handler = Handler::new(data.clone());

        assert!(handler.should_leave(GuildId::new(42), Some(true)).await);
        assert!(!handler.should_leave(GuildId::new(42), Some(false)).await);
        assert!(!handler.should_leave(GuildId::new(42), None).await);
        assert!(!handler.should_leave(GuildId::new(7), Some(true)).await);
    }

    #[tokio::test]
    async fn test_handler_sees_blocklist_updates() {
        let data = Data::new();
        let handler = Handler::new(data.clone());
        assert!(!handler.should_leave(GuildId::new(5), Some(true)).await);

        data.blocklist.add(5).await.unwrap();
        assert!(handler.should_leave(GuildId::new(5), Some(true)).await);
    }
}
