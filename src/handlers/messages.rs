use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::handlers::files::{fetch_image, incoming_image};
use crate::handlers::replies::deliver;
use crate::state::AppState;
use crate::utils::telegram::{message_user_id, start_upload_photo_heartbeat};
use crate::utils::timing::start_message_timer;

pub fn has_image(message: &Message) -> bool {
    incoming_image(message).is_some()
}

pub async fn photo_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let mut timer = start_message_timer("photo", &message);
    let Some(user_id) = message_user_id(&message) else {
        return Ok(());
    };
    let Some(image) = incoming_image(&message) else {
        return Ok(());
    };

    let awaiting = state
        .run_flow(move |flow| flow.awaits_photo(user_id))
        .await?;
    if !awaiting {
        debug!(user_id, "Photo arrived outside a photo step");
        timer.mark_status("ignored", Some("not awaiting photo".to_string()));
        return Ok(());
    }

    let _heartbeat = start_upload_photo_heartbeat(bot.clone(), message.chat.id);
    let bytes = fetch_image(&bot, &image).await;
    if bytes.is_empty() {
        timer.mark_status("degraded", Some("photo unavailable".to_string()));
    }
    let caption = message.caption().map(str::to_string);

    let replies = state
        .run_flow(move |flow| flow.on_photo(user_id, bytes, caption))
        .await?;
    deliver(&bot, message.chat.id, &replies).await;
    Ok(())
}

pub async fn text_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let _timer = start_message_timer("text", &message);
    let Some(user_id) = message_user_id(&message) else {
        return Ok(());
    };
    let Some(text) = message.text().map(str::to_string) else {
        return Ok(());
    };

    let replies = state
        .run_flow(move |flow| flow.on_text(user_id, text))
        .await?;
    deliver(&bot, message.chat.id, &replies).await;
    Ok(())
}
