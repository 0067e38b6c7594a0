use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::flow::session::Session;
use crate::store::models::UserRecord;

pub struct Store {
    users: Mutex<HashMap<i64, UserRecord>>,
    sessions: Mutex<HashMap<i64, Session>>,
    starting_tokens: i64,
}

impl Store {
    pub fn new(starting_tokens: i64) -> Self {
        Store {
            users: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            starting_tokens,
        }
    }

    /// Returns the user's record, creating it on first contact. The flag is
    /// true when the record was created by this call.
    pub fn ensure_user(&self, user_id: i64) -> (UserRecord, bool) {
        let mut users = self.users.lock();
        if let Some(record) = users.get(&user_id) {
            return (record.clone(), false);
        }
        let record = UserRecord::new(user_id, self.starting_tokens);
        users.insert(user_id, record.clone());
        debug!(user_id, "Registered new user");
        (record, true)
    }

    pub fn user(&self, user_id: i64) -> Option<UserRecord> {
        self.users.lock().get(&user_id).cloned()
    }

    pub fn update_user<F>(&self, user_id: i64, update: F) -> Option<UserRecord>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut users = self.users.lock();
        let record = users.get_mut(&user_id)?;
        update(record);
        Some(record.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }

    pub fn session(&self, user_id: i64) -> Session {
        self.sessions
            .lock()
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn save_session(&self, user_id: i64, session: Session) {
        let mut sessions = self.sessions.lock();
        if session.is_blank() {
            sessions.remove(&user_id);
        } else {
            sessions.insert(user_id, session);
        }
    }

    pub fn active_flows(&self) -> usize {
        self.sessions
            .lock()
            .values()
            .filter(|session| !session.state.is_idle())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::session::{ConversationState, PortraitDraft};

    #[test]
    fn creates_users_once_with_starting_balance() {
        let store = Store::new(10);
        let (record, created) = store.ensure_user(7);
        assert!(created);
        assert_eq!(record.tokens, 10);

        let (_, created_again) = store.ensure_user(7);
        assert!(!created_again);
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn update_user_ignores_unknown_ids() {
        let store = Store::new(0);
        assert!(store.update_user(1, |record| record.tokens += 5).is_none());

        store.ensure_user(1);
        let updated = store.update_user(1, |record| record.tokens += 5);
        assert_eq!(updated.map(|record| record.tokens), Some(5));
    }

    #[test]
    fn blank_sessions_are_not_kept() {
        let store = Store::new(0);
        store.save_session(
            3,
            Session {
                state: ConversationState::AwaitingPersonalPhoto,
                last_portrait: None,
            },
        );
        assert_eq!(store.active_flows(), 1);

        store.save_session(3, Session::default());
        assert_eq!(store.active_flows(), 0);
        assert_eq!(store.session(3), Session::default());
    }

    #[test]
    fn retained_draft_is_not_an_active_flow() {
        let store = Store::new(0);
        store.save_session(
            4,
            Session {
                state: ConversationState::Idle,
                last_portrait: Some(PortraitDraft {
                    prompt: "studio light".to_string(),
                    photo: vec![1, 2, 3],
                }),
            },
        );
        assert_eq!(store.active_flows(), 0);
        assert!(store.session(4).last_portrait.is_some());
    }
}
