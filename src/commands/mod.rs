use crate::{Context, Data, Error};

pub mod blocklist;
pub mod raffle;

/// Show help for a command, or list every command
#[poise::command(prefix_command, track_edits)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to get help for"] command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "Type `help <command>` for more on a command.",
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}

/// Every command the bot registers
#[must_use]
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![help(), raffle::raffle(), blocklist::guildblocklist()]
}
