use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, info};

use crate::flow::FlowCommand;
use crate::handlers::replies::deliver;
use crate::state::AppState;
use crate::utils::telegram::message_user_id;
use crate::utils::timing::start_message_timer;

pub fn unknown_command_name(text: &str, bot_username: Option<&str>) -> Option<String> {
    let rest = text.trim_start().strip_prefix('/')?;
    let head = rest.split_whitespace().next().unwrap_or("");
    let (name, addressee) = match head.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (head, None),
    };
    if let (Some(addressee), Some(own)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(own) {
            return None;
        }
    }
    let name = name.to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub async fn flow_command_handler(
    bot: Bot,
    state: AppState,
    message: Message,
    command: FlowCommand,
) -> Result<()> {
    let mut timer = start_message_timer(command.name(), &message);
    let Some(user_id) = message_user_id(&message) else {
        timer.mark_status("ignored", Some("no sender".to_string()));
        return Ok(());
    };

    info!(user_id, command = command.name(), "Command received");
    let replies = state
        .run_flow(move |flow| flow.on_command(user_id, command))
        .await?;
    deliver(&bot, message.chat.id, &replies).await;
    Ok(())
}

pub async fn unknown_command_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let bot_username = state.settings.bot_username.as_deref();
    let Some(name) = message
        .text()
        .and_then(|text| unknown_command_name(text, bot_username))
    else {
        return Ok(());
    };
    debug!(command = %name, "Unknown command");
    flow_command_handler(bot, state, message, FlowCommand::Unknown(name)).await
}

pub async fn admin_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let mut timer = start_message_timer("admin", &message);
    let Some(user_id) = message_user_id(&message) else {
        return Ok(());
    };

    let reply = state
        .run_flow(move |flow| flow.on_admin_command(user_id))
        .await?;
    match reply {
        Some(reply) => deliver(&bot, message.chat.id, &[reply]).await,
        None => timer.mark_status("ignored", Some("not admin".to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN_BOT: Option<&str> = Some("banana_demo_bot");

    #[test]
    fn extracts_command_name_without_bot_suffix() {
        assert_eq!(
            unknown_command_name("/Stats@Banana_Demo_Bot now", OWN_BOT).as_deref(),
            Some("stats")
        );
        assert_eq!(unknown_command_name("/foo", OWN_BOT).as_deref(), Some("foo"));
    }

    #[test]
    fn commands_for_other_bots_are_skipped() {
        assert_eq!(unknown_command_name("/stats@other_bot", OWN_BOT), None);
        assert_eq!(unknown_command_name("/start@other_bot ref5", OWN_BOT), None);
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(unknown_command_name("hello /foo", OWN_BOT), None);
        assert_eq!(unknown_command_name("/", OWN_BOT), None);
        assert_eq!(unknown_command_name("/@banana_demo_bot", OWN_BOT), None);
    }
}
