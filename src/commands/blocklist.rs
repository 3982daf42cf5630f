//! `guildblocklist` command group, for bot owners

use crate::blocklist::{BlocklistError, BlocklistResult};
use crate::{Context, Error};

/// Reply with the user-facing blocklist errors; storage errors propagate
async fn report(ctx: Context<'_>, result: BlocklistResult<()>, success: &str) -> Result<(), Error> {
    match result {
        Ok(()) => {
            ctx.say(success).await?;
            Ok(())
        }
        Err(e @ (BlocklistError::AlreadyBlocked | BlocklistError::NotBlocked)) => {
            ctx.say(e.to_string()).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Render the `list` reply
#[must_use]
pub fn render_list(guilds: &[u64]) -> String {
    if guilds.is_empty() {
        return "There are no blocklisted guilds.".to_string();
    }
    let plural = if guilds.len() == 1 { "" } else { "s" };
    let ids: Vec<String> = guilds.iter().map(|id| format!("`{id}`")).collect();
    format!("**Blocklisted guild{plural}:**\n\n{}", ids.join(", "))
}

/// Guild blocklist management.
#[poise::command(
    prefix_command,
    owners_only,
    aliases("gbl", "guildblacklist"),
    subcommands("add", "remove", "list", "clear"),
    subcommand_required
)]
pub async fn guildblocklist(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a guild to the guild blocklist.
#[poise::command(prefix_command, owners_only)]
pub async fn add(ctx: Context<'_>, guild: u64) -> Result<(), Error> {
    let added = ctx.data().blocklist.add(guild).await;
    report(ctx, added, "Guild added to blocklist.").await
}

/// Remove a guild from the guild blocklist.
#[poise::command(prefix_command, owners_only)]
pub async fn remove(ctx: Context<'_>, guild: u64) -> Result<(), Error> {
    let removed = ctx.data().blocklist.remove(guild).await;
    report(ctx, removed, "Guild removed from blocklist.").await
}

/// Lists guilds on the blocklist.
#[poise::command(prefix_command, owners_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guilds = ctx.data().blocklist.list().await;
    ctx.say(render_list(&guilds)).await?;
    Ok(())
}

/// Clears the guild blocklist.
#[poise::command(prefix_command, owners_only)]
pub async fn clear(ctx: Context<'_>) -> Result<(), Error> {
    let cleared = ctx.data().blocklist.clear().await;
    report(ctx, cleared, "Guild blocklist cleared.").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guildblocklist_command_definition() {
        let cmd = guildblocklist();
        assert_eq!(cmd.name, "guildblocklist");
        assert!(cmd.owners_only);
        assert!(cmd.aliases.iter().any(|a| a == "gbl"));
        assert!(cmd.aliases.iter().any(|a| a == "guildblacklist"));
        let names: Vec<&str> = cmd.subcommands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["add", "remove", "list", "clear"]);
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render_list(&[]), "There are no blocklisted guilds.");
        assert_eq!(render_list(&[42]), "**Blocklisted guild:**\n\n`42`");
        assert_eq!(render_list(&[1, 2]), "**Blocklisted guilds:**\n\n`1`, `2`");
    }
}
