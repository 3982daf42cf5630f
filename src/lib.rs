pub mod blocklist;
pub mod commands;
pub mod config;
pub mod data;
pub mod formatting;
pub mod handlers;
pub mod logging;
pub mod raffle;

pub const BOT_NAME: &str = "raffle_cogs";
pub const COMMAND_TARGET: &str = "raffle_cogs::command";
pub const ERROR_TARGET: &str = "raffle_cogs::error";
pub const EVENT_TARGET: &str = "raffle_cogs::handlers";
pub const RAFFLE_TARGET: &str = "raffle_cogs::raffle";
pub const CONSOLE_TARGET: &str = "raffle_cogs";

pub use data::{Data, DataInner};
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
