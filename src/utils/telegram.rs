use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tokio::task::JoinHandle;
use tracing::warn;

const CHAT_ACTION_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(4);

pub fn message_user_id(message: &Message) -> Option<i64> {
    message
        .from()
        .and_then(|user| i64::try_from(user.id.0).ok())
}

pub fn callback_user_id(query: &CallbackQuery) -> i64 {
    i64::try_from(query.from.id.0).unwrap_or_default()
}

pub struct ChatActionHeartbeat {
    task_handle: Option<JoinHandle<()>>,
}

impl Drop for ChatActionHeartbeat {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

pub fn start_upload_photo_heartbeat(bot: Bot, chat_id: ChatId) -> ChatActionHeartbeat {
    let task_handle = tokio::spawn(async move {
        loop {
            if let Err(err) = bot.send_chat_action(chat_id, ChatAction::UploadPhoto).await {
                warn!("send_chat_action failed: {err}");
                return;
            }
            tokio::time::sleep(CHAT_ACTION_HEARTBEAT_INTERVAL).await;
        }
    });

    ChatActionHeartbeat {
        task_handle: Some(task_handle),
    }
}
