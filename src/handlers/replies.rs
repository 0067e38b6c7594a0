use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use teloxide::RequestError;
use tracing::{debug, warn};

use crate::flow::{Keyboard, Reply};

const TELEGRAM_RETRY_ATTEMPTS: usize = 3;

pub fn build_keyboard(keyboard: &Keyboard) -> Option<InlineKeyboardMarkup> {
    if keyboard.is_empty() {
        return None;
    }
    let rows = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    InlineKeyboardButton::callback(button.label.clone(), button.action.token())
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Some(InlineKeyboardMarkup::new(rows))
}

fn telegram_retryable_error(err: &RequestError) -> bool {
    matches!(
        err,
        RequestError::Network(_) | RequestError::RetryAfter(_) | RequestError::Io(_)
    )
}

async fn wait_before_retry(err: &RequestError, delay: &mut Duration) {
    if let RequestError::RetryAfter(wait) = err {
        tokio::time::sleep(wait.duration()).await;
    } else {
        tokio::time::sleep(*delay).await;
        *delay *= 2;
    }
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> Result<()> {
    let mut delay = Duration::from_secs_f32(1.5);
    for attempt in 0..TELEGRAM_RETRY_ATTEMPTS {
        let outcome = match reply {
            Reply::Text { text, keyboard } => {
                let mut request = bot.send_message(chat_id, text.clone());
                if let Some(markup) = build_keyboard(keyboard) {
                    request = request.reply_markup(markup);
                }
                request.await.map(|_| ())
            }
            Reply::Photo {
                png,
                file_name,
                caption,
                keyboard,
            } => {
                let input = InputFile::memory(png.clone()).file_name(file_name.clone());
                let mut request = bot.send_photo(chat_id, input);
                if let Some(caption) = caption {
                    request = request.caption(caption.clone());
                }
                if let Some(markup) = build_keyboard(keyboard) {
                    request = request.reply_markup(markup);
                }
                request.await.map(|_| ())
            }
        };

        match outcome {
            Ok(()) => return Ok(()),
            Err(err) => {
                if !telegram_retryable_error(&err) || attempt + 1 == TELEGRAM_RETRY_ATTEMPTS {
                    return Err(err.into());
                }
                warn!("send attempt {} failed: {err}", attempt + 1);
                wait_before_retry(&err, &mut delay).await;
            }
        }
    }

    Ok(())
}

/// Replaces a text message in place. Returns false when Telegram refuses,
/// e.g. the original carries a photo or is too old to edit.
async fn edit_text(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
    keyboard: &Keyboard,
) -> bool {
    let mut request = bot.edit_message_text(chat_id, message_id, text.to_string());
    if let Some(markup) = build_keyboard(keyboard) {
        request = request.reply_markup(markup);
    }
    match request.await {
        Ok(_) => true,
        Err(err) => {
            debug!("edit_message_text failed, sending instead: {err}");
            false
        }
    }
}

pub async fn deliver(bot: &Bot, chat_id: ChatId, replies: &[Reply]) {
    for reply in replies {
        if let Err(err) = send_reply(bot, chat_id, reply).await {
            warn!("Failed to deliver reply to chat {}: {err}", chat_id.0);
        }
    }
}

pub async fn deliver_editing(bot: &Bot, chat_id: ChatId, message_id: MessageId, replies: &[Reply]) {
    let Some((first, rest)) = replies.split_first() else {
        return;
    };
    let edited = match first {
        Reply::Text { text, keyboard } => edit_text(bot, chat_id, message_id, text, keyboard).await,
        Reply::Photo { .. } => false,
    };
    if edited {
        deliver(bot, chat_id, rest).await;
    } else {
        deliver(bot, chat_id, replies).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::texts;

    #[test]
    fn empty_keyboard_has_no_markup() {
        assert!(build_keyboard(&Vec::new()).is_none());
    }

    #[test]
    fn keyboard_rows_keep_callback_tokens() {
        let markup = build_keyboard(&texts::main_menu()).expect("menu markup");
        assert_eq!(markup.inline_keyboard.len(), 4);
        let tokens: Vec<String> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(tokens, vec!["profile", "card", "face", "buy"]);
    }
}
