use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::flow::CallbackAction;
use crate::handlers::replies::{deliver, deliver_editing};
use crate::state::AppState;
use crate::utils::telegram::{callback_user_id, start_upload_photo_heartbeat};
use crate::utils::timing::start_callback_timer;

fn edits_in_place(action: Option<&CallbackAction>) -> bool {
    matches!(
        action,
        Some(
            CallbackAction::Profile
                | CallbackAction::ProductCard
                | CallbackAction::PersonalPhoto
                | CallbackAction::Tariffs
                | CallbackAction::Back
        )
    )
}

pub async fn callback_handler(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    let mut timer = start_callback_timer(&query);
    if let Err(err) = bot.answer_callback_query(query.id.clone()).await {
        debug!("answer_callback_query failed: {err}");
    }

    let Some(token) = query.data.clone() else {
        timer.mark_status("ignored", Some("no data".to_string()));
        return Ok(());
    };
    let Some(origin) = query.message.as_ref() else {
        timer.mark_status("ignored", Some("no message".to_string()));
        return Ok(());
    };
    let chat_id = origin.chat().id;
    let message_id = origin.id();
    let user_id = callback_user_id(&query);
    let action = CallbackAction::parse(&token);

    let _heartbeat = action
        .as_ref()
        .filter(|action| action.renders())
        .map(|_| start_upload_photo_heartbeat(bot.clone(), chat_id));

    let edit = edits_in_place(action.as_ref());
    let replies = state
        .run_flow(move |flow| flow.on_callback(user_id, &token))
        .await?;

    if edit {
        deliver_editing(&bot, chat_id, message_id, &replies).await;
    } else {
        deliver(&bot, chat_id, &replies).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::actions::CardKind;

    #[test]
    fn only_navigation_edits_in_place() {
        assert!(edits_in_place(Some(&CallbackAction::Back)));
        assert!(edits_in_place(Some(&CallbackAction::Tariffs)));
        assert!(!edits_in_place(Some(&CallbackAction::CardType(CardKind::Plain))));
        assert!(!edits_in_place(Some(&CallbackAction::FourAngles)));
        assert!(!edits_in_place(None));
    }
}
