use std::time::Instant;

use chrono::{DateTime, Utc};
use teloxide::types::{CallbackQuery, Message};
use tracing::info;

use crate::utils::logging::TIMING_TARGET;
use crate::utils::telegram::{callback_user_id, message_user_id};

const LOGGED_TEXT_LIMIT: usize = 300;

#[derive(Debug)]
pub struct EventTimer {
    event: String,
    chat_id: Option<i64>,
    user_id: Option<i64>,
    text: Option<String>,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status: String,
    detail: Option<String>,
    completed: bool,
}

fn clip_text(value: &str) -> String {
    let flattened = value.replace('\n', " ");
    if flattened.chars().count() <= LOGGED_TEXT_LIMIT {
        return flattened;
    }
    flattened.chars().take(LOGGED_TEXT_LIMIT).collect()
}

impl EventTimer {
    fn new(event: &str, chat_id: Option<i64>, user_id: Option<i64>, text: Option<String>) -> Self {
        EventTimer {
            event: event.to_string(),
            chat_id,
            user_id,
            text,
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status: "success".to_string(),
            detail: None,
            completed: false,
        }
    }

    pub fn from_message(event: &str, message: &Message) -> Self {
        let text = message
            .text()
            .or_else(|| message.caption())
            .map(clip_text);
        EventTimer::new(event, Some(message.chat.id.0), message_user_id(message), text)
    }

    pub fn from_callback(query: &CallbackQuery) -> Self {
        let chat_id = query.message.as_ref().map(|message| message.chat().id.0);
        EventTimer::new(
            "callback",
            chat_id,
            Some(callback_user_id(query)),
            query.data.as_deref().map(clip_text),
        )
    }

    fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            event = "update_received",
            kind = %self.event,
            chat_id = ?self.chat_id,
            user_id = ?self.user_id,
            received_at = %self.started_at.to_rfc3339(),
            text = ?self.text
        );
    }

    pub fn mark_status(&mut self, status: &str, detail: Option<String>) {
        self.status = status.to_string();
        self.detail = detail;
    }

    pub fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            event = "update_completed",
            kind = %self.event,
            chat_id = ?self.chat_id,
            user_id = ?self.user_id,
            started_at = %self.started_at.to_rfc3339(),
            completed_at = %Utc::now().to_rfc3339(),
            duration_s = duration,
            status = %self.status,
            detail = %self.detail.clone().unwrap_or_default()
        );
    }
}

impl Drop for EventTimer {
    fn drop(&mut self) {
        self.complete();
    }
}

pub fn start_message_timer(event: &str, message: &Message) -> EventTimer {
    let timer = EventTimer::from_message(event, message);
    timer.log_received();
    timer
}

pub fn start_callback_timer(query: &CallbackQuery) -> EventTimer {
    let timer = EventTimer::from_callback(query);
    timer.log_received();
    timer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_text_flattens_and_limits() {
        assert_eq!(clip_text("a\nb"), "a b");
        assert_eq!(clip_text(&"x".repeat(500)).chars().count(), LOGGED_TEXT_LIMIT);
    }
}
