use std::error::Error;
use std::net::SocketAddr;

use dotenvy::dotenv;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

mod config;
mod flow;
mod handlers;
mod render;
mod state;
mod store;
mod utils;

use config::{load_tariffs_from_path, DeliveryMode, CONFIG};
use flow::{FlowCommand, FlowSettings};
use handlers::{callbacks, commands, messages};
use render::Renderer;
use state::AppState;
use store::Store;
use utils::logging::init_logging;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start(String),
    Help,
    Card,
    Portrait,
    Profile,
    Tariffs,
    Cancel,
    Admin,
}

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

fn is_slash_command(message: &Message) -> bool {
    message
        .text()
        .is_some_and(|text| text.trim_start().starts_with('/'))
}

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();
    let _guards = init_logging();

    let bot = Bot::new(CONFIG.bot_token.clone());
    info!("Starting Nano Banana Pro demo bot");

    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(err) => {
            warn!("get_me failed, invite links disabled: {err}");
            None
        }
    };

    let settings = FlowSettings {
        admin_id: CONFIG.admin_id,
        referral_bonus: CONFIG.referral_bonus,
        tariffs: load_tariffs_from_path(&CONFIG.tariffs_config_path),
        bot_username,
    };
    let state = AppState::new(
        Store::new(CONFIG.demo_token_balance),
        Renderer::with_font_path(CONFIG.render_font_path.as_deref()),
        settings,
    );

    let command_handler = dptree::entry()
        .filter_command::<Command>()
        .endpoint(handle_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::filter(|msg: Message| is_slash_command(&msg)).endpoint(handle_unknown_command))
        .branch(dptree::filter(|msg: Message| messages::has_image(&msg)).endpoint(handle_photo))
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text))
        .endpoint(ignore_message);

    let callback_handler = Update::filter_callback_query().endpoint(handle_callback_query);

    let handler = dptree::entry()
        .branch(message_handler)
        .branch(callback_handler);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match CONFIG.delivery_mode {
        DeliveryMode::Webhook => {
            let url = CONFIG.webhook_url()?;
            let address = SocketAddr::from(([0, 0, 0, 0], CONFIG.port));
            info!("Webhook mode: listening on {address}, public URL {url}");
            let listener = webhooks::axum(
                bot,
                webhooks::Options::new(address, url).drop_pending_updates(),
            )
            .await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        DeliveryMode::Polling => {
            bot.delete_webhook().drop_pending_updates(true).await?;
            info!("Polling mode");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

async fn handle_command(
    bot: Bot,
    state: AppState,
    message: Message,
    command: Command,
) -> HandlerResult {
    let flow_command = match command {
        Command::Start(payload) => FlowCommand::start_with_payload(&payload),
        Command::Help => FlowCommand::Help,
        Command::Card => FlowCommand::ProductCard,
        Command::Portrait => FlowCommand::PersonalPhoto,
        Command::Profile => FlowCommand::Profile,
        Command::Tariffs => FlowCommand::Tariffs,
        Command::Cancel => FlowCommand::Cancel,
        Command::Admin => {
            commands::admin_handler(bot, state, message).await?;
            return Ok(());
        }
    };
    commands::flow_command_handler(bot, state, message, flow_command).await?;
    Ok(())
}

async fn handle_unknown_command(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    commands::unknown_command_handler(bot, state, message).await?;
    Ok(())
}

async fn handle_photo(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    messages::photo_handler(bot, state, message).await?;
    Ok(())
}

async fn handle_text(bot: Bot, state: AppState, message: Message) -> HandlerResult {
    messages::text_handler(bot, state, message).await?;
    Ok(())
}

async fn handle_callback_query(bot: Bot, state: AppState, query: CallbackQuery) -> HandlerResult {
    callbacks::callback_handler(bot, state, query).await?;
    Ok(())
}

async fn ignore_message(_message: Message) -> HandlerResult {
    Ok(())
}
