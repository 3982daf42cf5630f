use poise::serenity_prelude::{self as serenity};
use raffle_cogs::config::BotConfig;
use raffle_cogs::{Data, Error, commands, handlers, logging};
use serenity::GatewayIntents;
use tracing::{error, info};

/// Main function to run the bot
async fn async_main() -> Result<(), Error> {
    let config = BotConfig::from_env()?;
    logging::init(&config.log_dir)?;

    let data = Data::load(&config).await?;
    let handler = handlers::Handler::new(data.clone());

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                mention_as_prefix: true,
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_start(ctx);
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    logging::log_command_end(ctx);
                })
            },
            on_error: |error| Box::pin(logging::on_error(error)),
            ..Default::default()
        })
        .setup(|_ctx, ready, _framework| {
            Box::pin(async move {
                logging::log_console(&format!("Logged in as {}", ready.user.name));
                Ok(data)
            })
        })
        .build();

    // Members are needed to check role and join age conditions
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;
    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .event_handler(handler)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    client.start().await?;
    Ok(())
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error building runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(async_main()) {
        error!("Error: {err}");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
