//! `raffle` command group

use crate::formatting::{MESSAGE_PAGE_LENGTH, code_block, error_block, humanize_list, pagify, shorten};
use crate::raffle::{
    CacheResolver, Component, ConditionChange, ConditionValue, EntityResolver, ParseContext,
    Participant, RaffleDefinition, RaffleEngine, RaffleError, RaffleResult, parse,
};
use crate::{Context, Error};
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, GuildId, Mentionable, UserId};
use std::fmt::Write as _;
use std::future::Future;
use std::time::Duration;

/// How long `create` waits for the definition message
const DEFINITION_TIMEOUT: Duration = Duration::from_secs(250);
/// How long `teardown` waits for a yes or no
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
const DRAW_SUSPENSE: Duration = Duration::from_secs(2);
const LIST_PAGE_LENGTH: usize = 1024;
const LIST_DESCRIPTION_LENGTH: usize = 50;

/// Shown by `create` as a starting point
pub const EXAMPLE_DEFINITION: &str = "\
name: Example
description: This is a description for the raffle.
account_age: 30
join_age: 10
roles_needed_to_enter:
  - 1234567890
prevented_users:
  - 1234567890
maximum_entries: 15";

fn to_utc(timestamp: serenity::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_default()
}

fn guild(ctx: Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Error::from("This command can only be used in a server."))
}

fn resolver(ctx: Context<'_>) -> CacheResolver {
    CacheResolver::new(ctx.serenity_context().cache.clone())
}

/// Send user-facing raffle errors as a reply. Returns `None` when the
/// command should stop; store failures go to the framework's error hook.
async fn report<T>(ctx: Context<'_>, result: RaffleResult<T>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RaffleError::Parse(e)) => {
            ctx.say(error_block(e.kind(), &e)).await?;
            Ok(None)
        }
        Err(RaffleError::Lifecycle(e)) => {
            ctx.say(e.to_string()).await?;
            Ok(None)
        }
        Err(RaffleError::Store(e)) => Err(e.into()),
    }
}

/// Drop entries, prevented users and role requirements that no longer
/// resolve. Skipped when the guild is not cached yet.
async fn refresh(ctx: Context<'_>, guild_id: GuildId) -> Result<(), Error> {
    let cached = ctx.cache().guild(guild_id).is_some();
    if cached {
        ctx.data()
            .raffles
            .reconcile(guild_id.get(), &resolver(ctx))
            .await?;
    }
    Ok(())
}

async fn participant(ctx: Context<'_>) -> Result<Participant, Error> {
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not look up your membership in this server.")?;
    Ok(Participant {
        user_id: member.user.id.get(),
        roles: member.roles.iter().map(|role| role.get()).collect(),
        account_created_at: to_utc(member.user.id.created_at()),
        joined_guild_at: member.joined_at.map(to_utc),
    })
}

fn user_label(resolver: &dyn EntityResolver, user_id: u64) -> String {
    resolver
        .resolve_user(user_id)
        .unwrap_or_else(|| user_id.to_string())
}

/// Body of the `info` reply
#[must_use]
pub fn describe(raffle: &RaffleDefinition, guild_id: u64, resolver: &dyn EntityResolver) -> String {
    let mut message = String::new();
    if !raffle.is_accepting_entries() {
        message.push_str("This raffle is no longer accepting entries.\n");
    }
    let _ = write!(
        message,
        "\nRaffle name: {}\nDescription: {}\nOwner: {} ({})\nEntries: {}",
        raffle.name,
        raffle
            .description
            .as_deref()
            .unwrap_or("No description was provided."),
        user_label(resolver, raffle.owner),
        raffle.owner,
        raffle.entries.len(),
    );

    if !raffle.has_conditions() {
        message.push_str("\nConditions: None");
        return message;
    }
    if let Some(roles) = &raffle.roles_needed {
        let names: Vec<String> = roles
            .iter()
            .map(|role| {
                resolver
                    .resolve_role(guild_id, *role)
                    .unwrap_or_else(|| role.to_string())
            })
            .collect();
        let _ = write!(message, "\nRoles Required: {}", names.join(", "));
    }
    if let Some(days) = raffle.account_age_days {
        let _ = write!(message, "\nAccount age requirement in days: {days}");
    }
    if let Some(days) = raffle.join_age_days {
        let _ = write!(message, "\nGuild join age requirement in days: {days}");
    }
    if let Some(users) = &raffle.prevented_users {
        let names: Vec<String> = users.iter().map(|u| user_label(resolver, *u)).collect();
        let _ = write!(message, "\nPrevented Users: {}", names.join(", "));
    }
    message
}

/// One line per raffle for `list`
#[must_use]
pub fn summary_lines(raffles: &[RaffleDefinition]) -> String {
    raffles
        .iter()
        .map(|raffle| {
            let description = raffle.description.as_deref().unwrap_or_default();
            format!(
                "**{}** {}",
                raffle.key(),
                shorten(description, LIST_DESCRIPTION_LENGTH)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn change_reply(subject: &str, change: ConditionChange) -> String {
    match change {
        ConditionChange::Updated => format!("{subject} updated for this raffle."),
        ConditionChange::Removed => format!("{subject} removed from this raffle."),
    }
}

fn is_yes_or_no(content: &str) -> Option<bool> {
    match content.trim().to_lowercase().as_str() {
        "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Manage raffles for your server.
#[poise::command(
    prefix_command,
    guild_only,
    subcommands(
        "create",
        "join",
        "leave",
        "mention",
        "end",
        "kick",
        "list",
        "teardown",
        "raw",
        "members",
        "draw",
        "info",
        "conditions",
        "edit"
    ),
    subcommand_required
)]
pub async fn raffle(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn create(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    ctx.say(format!(
        "Now you need to create your raffle using YAML.\n\
         The `name` field is required, whilst you can also add an optional \
         description and various conditions. See below for an example:{}",
        code_block(EXAMPLE_DEFINITION, "yaml")
    ))
    .await?;

    let reply = serenity::MessageCollector::new(ctx.serenity_context())
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(DEFINITION_TIMEOUT)
        .next()
        .await;
    let Some(reply) = reply else {
        ctx.say("You took too long to respond.").await?;
        return Ok(());
    };

    let resolver = resolver(ctx);
    let parse_ctx = ParseContext {
        guild_id: guild_id.get(),
        guild_created_at: to_utc(guild_id.created_at()),
        owner: ctx.author().id.get(),
        now: Utc::now(),
        resolver: &resolver,
    };
    let parsed = parse(&reply.content, &parse_ctx).map_err(RaffleError::from);
    let Some(definition) = report(ctx, parsed).await? else {
        return Ok(());
    };

    let created = ctx.data().raffles.create(guild_id.get(), definition).await;
    if let Some(key) = report(ctx, created).await? {
        ctx.say(format!(
            "Raffle created. Type `{}raffle join {key}` to join the raffle.",
            ctx.prefix()
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Look the raffle up before the entrant, so an unknown raffle is reported
/// ahead of any membership lookup failure
async fn join_raffle<F, Fut>(
    engine: &RaffleEngine,
    guild_id: u64,
    name: &str,
    entrant: F,
    now: DateTime<Utc>,
) -> Result<RaffleResult<()>, Error>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Participant, Error>>,
{
    if let Err(e) = engine.get(guild_id, name).await {
        return Ok(Err(e));
    }
    let entrant = entrant().await?;
    Ok(engine.join(guild_id, name, &entrant, now).await)
}

/// Join a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn join(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    let joined = join_raffle(
        &ctx.data().raffles,
        guild_id.get(),
        &raffle,
        || participant(ctx),
        Utc::now(),
    )
    .await?;
    if report(ctx, joined).await?.is_some() {
        ctx.say(format!(
            "{} you have been added to the raffle!",
            ctx.author().display_name()
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Leave a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn leave(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let left = ctx
        .data()
        .raffles
        .leave(guild_id.get(), &raffle, ctx.author().id.get())
        .await;
    if report(ctx, left).await?.is_some() {
        ctx.say(format!(
            "{} you have been removed from the raffle.",
            ctx.author().mention()
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Mention all the users entered into a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn mention(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let targets = ctx
        .data()
        .raffles
        .mention_targets(guild_id.get(), &raffle, ctx.author().id.get())
        .await;
    if let Some(targets) = report(ctx, targets).await? {
        let mentions: Vec<String> = targets
            .into_iter()
            .map(|user| UserId::new(user).mention().to_string())
            .collect();
        for page in pagify(&humanize_list(&mentions), MESSAGE_PAGE_LENGTH) {
            ctx.say(page).await?;
        }
    }
    refresh(ctx, guild_id).await
}

/// End a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn end(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    let notice = ctx.say(format!("Ending the `{raffle}` raffle...")).await?;
    ctx.defer().await?;
    let ended = ctx
        .data()
        .raffles
        .end(guild_id.get(), &raffle, ctx.author().id.get())
        .await;
    if report(ctx, ended).await?.is_some() {
        // The notice may already be gone
        let _ = notice.delete(ctx).await;
        ctx.say("Raffle ended.").await?;
    }
    refresh(ctx, guild_id).await
}

/// Kick a user from your raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn kick(ctx: Context<'_>, raffle: String, member: serenity::Member) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let kicked = ctx
        .data()
        .raffles
        .kick(
            guild_id.get(),
            &raffle,
            ctx.author().id.get(),
            member.user.id.get(),
        )
        .await;
    if report(ctx, kicked).await?.is_some() {
        ctx.say("User removed from the raffle.").await?;
    }
    refresh(ctx, guild_id).await
}

/// List the currently ongoing raffles.
#[poise::command(prefix_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let Some(raffles) = report(ctx, ctx.data().raffles.list(guild_id.get()).await).await? else {
        return Ok(());
    };
    if raffles.is_empty() {
        ctx.say("There are no ongoing raffles.").await?;
        return refresh(ctx, guild_id).await;
    }

    let pages = pagify(&summary_lines(&raffles), LIST_PAGE_LENGTH);
    let total = pages.len();
    let pages: Vec<String> = pages
        .into_iter()
        .enumerate()
        .map(|(index, page)| {
            format!("**Current raffles**\n{page}\n\nPage {}/{total}", index + 1)
        })
        .collect();
    let pages: Vec<&str> = pages.iter().map(String::as_str).collect();
    poise::builtins::paginate(ctx, &pages).await?;
    refresh(ctx, guild_id).await
}

/// End ALL ongoing raffles.
///
/// Requires the Manage Server permission.
#[poise::command(prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn teardown(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let Some(raffles) = report(ctx, ctx.data().raffles.list(guild_id.get()).await).await? else {
        return Ok(());
    };
    if raffles.is_empty() {
        ctx.say("There are no ongoing raffles in this guild.").await?;
        return Ok(());
    }

    let prompt = ctx
        .say("Are you sure you want to tear down all ongoing raffles in this guild? (yes/no)")
        .await?;
    let answer = serenity::MessageCollector::new(ctx.serenity_context())
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .filter(|message| is_yes_or_no(&message.content).is_some())
        .timeout(CONFIRM_TIMEOUT)
        .next()
        .await;
    let Some(answer) = answer else {
        ctx.say("You took too long to respond.").await?;
        return Ok(());
    };
    let _ = prompt.delete(ctx).await;

    if is_yes_or_no(&answer.content) == Some(true) {
        let removed = ctx.data().raffles.teardown(guild_id.get()).await;
        if report(ctx, removed).await?.is_some() {
            ctx.say("Raffles cleared.").await?;
        }
    } else {
        ctx.say("No changes have been made.").await?;
    }
    refresh(ctx, guild_id).await
}

/// View the raw data for a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn raw(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let found = ctx.data().raffles.get(guild_id.get(), &raffle).await;
    if let Some(found) = report(ctx, found).await? {
        for page in pagify(&found.to_yaml()?, MESSAGE_PAGE_LENGTH) {
            ctx.say(code_block(&page, "yaml")).await?;
        }
    }
    refresh(ctx, guild_id).await
}

/// Get all the members of a raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn members(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let Some(found) = report(ctx, ctx.data().raffles.get(guild_id.get(), &raffle).await).await?
    else {
        return Ok(());
    };

    let resolver = resolver(ctx);
    let names: Vec<String> = found
        .entries
        .iter()
        .map(|user| user_label(&resolver, *user))
        .collect();
    match names.as_slice() {
        [] => {
            ctx.say(crate::raffle::LifecycleError::NoEntries.to_string())
                .await?;
        }
        [only] => {
            ctx.say(format!("Looks like its only {only} in here!")).await?;
        }
        _ => {
            let pages = pagify(&humanize_list(&names), MESSAGE_PAGE_LENGTH);
            let pages: Vec<&str> = pages.iter().map(String::as_str).collect();
            poise::builtins::paginate(ctx, &pages).await?;
        }
    }
    refresh(ctx, guild_id).await
}

/// Draw a raffle and select a winner.
#[poise::command(prefix_command, guild_only)]
pub async fn draw(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    let drawn = ctx.data().raffles.draw(guild_id.get(), &raffle).await;
    let Some(winner) = report(ctx, drawn).await? else {
        return Ok(());
    };

    ctx.say("Picking a winner from the pool...").await?;
    ctx.defer().await?;
    tokio::time::sleep(DRAW_SUSPENSE).await;
    ctx.say(format!(
        "Congratulations {}, you have won the {raffle} raffle! :tada:",
        UserId::new(winner).mention()
    ))
    .await?;
    refresh(ctx, guild_id).await
}

/// Get information about a certain raffle.
#[poise::command(prefix_command, guild_only)]
pub async fn info(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    let found = ctx.data().raffles.get(guild_id.get(), &raffle).await;
    if let Some(found) = report(ctx, found).await? {
        let message = describe(&found, guild_id.get(), &resolver(ctx));
        ctx.say(code_block(&message, "yaml")).await?;
    }
    refresh(ctx, guild_id).await
}

/// Get information about how conditions work.
#[poise::command(prefix_command, guild_only)]
pub async fn conditions(ctx: Context<'_>) -> Result<(), Error> {
    let message = Component::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    ctx.say(code_block(&message, "yaml")).await?;
    Ok(())
}

/// Edit the settings for a raffle.
#[poise::command(
    prefix_command,
    guild_only,
    subcommands(
        "accage",
        "joinage",
        "description",
        "maxentries",
        "prevented",
        "rolesreq"
    ),
    subcommand_required
)]
pub async fn edit(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Stop unless the author owns the raffle
async fn owns(ctx: Context<'_>, guild_id: GuildId, raffle: &str) -> Result<bool, Error> {
    let checked = ctx
        .data()
        .raffles
        .check_owner(guild_id.get(), raffle, ctx.author().id.get())
        .await;
    Ok(report(ctx, checked).await?.is_some())
}

/// Parse a numeric condition argument, replying on failure
async fn number_value(ctx: Context<'_>, value: &str) -> Result<Option<ConditionValue<u64>>, Error> {
    report(
        ctx,
        ConditionValue::<u64>::parse_number(value).map_err(RaffleError::from),
    )
    .await
}

/// Edit the account age requirement for a raffle.
///
/// Use `0` or `false` to disable this condition.
#[poise::command(prefix_command, guild_only)]
pub async fn accage(ctx: Context<'_>, raffle: String, new_account_age: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let Some(value) = number_value(ctx, &new_account_age).await? else {
        return Ok(());
    };
    let edited = ctx
        .data()
        .raffles
        .edit_account_age(guild_id.get(), &raffle, value, Utc::now())
        .await;
    if let Some(change) = report(ctx, edited).await? {
        ctx.say(change_reply("Account age requirement", change)).await?;
    }
    refresh(ctx, guild_id).await
}

/// Edit the join age requirement for a raffle.
///
/// Use `0` or `false` to disable this condition.
#[poise::command(prefix_command, guild_only)]
pub async fn joinage(ctx: Context<'_>, raffle: String, new_join_age: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let Some(value) = number_value(ctx, &new_join_age).await? else {
        return Ok(());
    };
    let edited = ctx
        .data()
        .raffles
        .edit_join_age(
            guild_id.get(),
            &raffle,
            value,
            to_utc(guild_id.created_at()),
            Utc::now(),
        )
        .await;
    if let Some(change) = report(ctx, edited).await? {
        ctx.say(change_reply("Join age requirement", change)).await?;
    }
    refresh(ctx, guild_id).await
}

/// Edit the description for a raffle.
///
/// Use `0` or `false` to remove the description.
#[poise::command(prefix_command, guild_only)]
pub async fn description(
    ctx: Context<'_>,
    raffle: String,
    #[rest] description: String,
) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let edited = ctx
        .data()
        .raffles
        .edit_description(
            guild_id.get(),
            &raffle,
            ConditionValue::<String>::parse_text(&description),
        )
        .await;
    if let Some(change) = report(ctx, edited).await? {
        ctx.say(change_reply("Description", change)).await?;
    }
    refresh(ctx, guild_id).await
}

/// Edit the max entries requirement for a raffle.
///
/// Use `0` or `false` to disable this condition.
#[poise::command(prefix_command, guild_only)]
pub async fn maxentries(
    ctx: Context<'_>,
    raffle: String,
    maximum_entries: String,
) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let Some(value) = number_value(ctx, &maximum_entries).await? else {
        return Ok(());
    };
    let edited = ctx
        .data()
        .raffles
        .edit_maximum_entries(guild_id.get(), &raffle, value)
        .await;
    if let Some(change) = report(ctx, edited).await? {
        ctx.say(change_reply("Maximum entries condition", change))
            .await?;
    }
    refresh(ctx, guild_id).await
}

/// Manage prevented users in a raffle.
#[poise::command(
    prefix_command,
    guild_only,
    subcommands("prevented_add", "prevented_remove", "prevented_clear"),
    subcommand_required
)]
pub async fn prevented(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a member to the prevented list of a raffle.
#[poise::command(prefix_command, guild_only, rename = "add")]
pub async fn prevented_add(
    ctx: Context<'_>,
    raffle: String,
    member: serenity::Member,
) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let added = ctx
        .data()
        .raffles
        .add_prevented(guild_id.get(), &raffle, member.user.id.get())
        .await;
    if report(ctx, added).await?.is_some() {
        ctx.say(format!(
            "{} added to the prevented list for this raffle.",
            member.user.name
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Remove a member from the prevented list of a raffle.
#[poise::command(prefix_command, guild_only, rename = "remove", aliases("del"))]
pub async fn prevented_remove(
    ctx: Context<'_>,
    raffle: String,
    member: serenity::Member,
) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let removed = ctx
        .data()
        .raffles
        .remove_prevented(guild_id.get(), &raffle, member.user.id.get())
        .await;
    if report(ctx, removed).await?.is_some() {
        ctx.say(format!(
            "{} removed from the prevented list for this raffle.",
            member.user.name
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Clear the prevented list for a raffle.
#[poise::command(prefix_command, guild_only, rename = "clear")]
pub async fn prevented_clear(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let cleared = ctx
        .data()
        .raffles
        .clear_prevented(guild_id.get(), &raffle)
        .await;
    if report(ctx, cleared).await?.is_some() {
        ctx.say("Prevented list cleared for this raffle.").await?;
    }
    refresh(ctx, guild_id).await
}

/// Manage role requirements in a raffle.
#[poise::command(
    prefix_command,
    guild_only,
    subcommands("rolesreq_add", "rolesreq_remove", "rolesreq_clear"),
    subcommand_required
)]
pub async fn rolesreq(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a role to the role requirements list of a raffle.
#[poise::command(prefix_command, guild_only, rename = "add")]
pub async fn rolesreq_add(ctx: Context<'_>, raffle: String, role: serenity::Role) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let added = ctx
        .data()
        .raffles
        .add_required_role(guild_id.get(), &raffle, role.id.get())
        .await;
    if report(ctx, added).await?.is_some() {
        ctx.say(format!(
            "{} added to the role requirement list for this raffle.",
            role.name
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Remove a role from the role requirements list of a raffle.
#[poise::command(prefix_command, guild_only, rename = "remove", aliases("del"))]
pub async fn rolesreq_remove(
    ctx: Context<'_>,
    raffle: String,
    role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let removed = ctx
        .data()
        .raffles
        .remove_required_role(guild_id.get(), &raffle, role.id.get())
        .await;
    if report(ctx, removed).await?.is_some() {
        ctx.say(format!(
            "{} removed from the role requirement list for this raffle.",
            role.name
        ))
        .await?;
    }
    refresh(ctx, guild_id).await
}

/// Clear the role requirement list for a raffle.
#[poise::command(prefix_command, guild_only, rename = "clear")]
pub async fn rolesreq_clear(ctx: Context<'_>, raffle: String) -> Result<(), Error> {
    let guild_id = guild(ctx)?;
    ctx.defer().await?;
    if !owns(ctx, guild_id, &raffle).await? {
        return Ok(());
    }
    let cleared = ctx
        .data()
        .raffles
        .clear_required_roles(guild_id.get(), &raffle)
        .await;
    if report(ctx, cleared).await?.is_some() {
        ctx.say("Role requirement list cleared for this raffle.")
            .await?;
    }
    refresh(ctx, guild_id).await
}
