use tracing::{debug, info};

use crate::flow::actions::{Angle, CallbackAction, FlowCommand};
use crate::flow::reply::{Button, Reply};
use crate::flow::session::PortraitDraft;
use crate::flow::texts;
use crate::flow::transition::{transition, Effect, Event, Transition};
use crate::render::{Placeholder, Renderer};
use crate::store::{Store, Tariff};

#[derive(Debug, Clone, Default)]
pub struct FlowSettings {
    pub admin_id: Option<i64>,
    pub referral_bonus: i64,
    pub tariffs: Vec<Tariff>,
    pub bot_username: Option<String>,
}

pub struct FlowController<'a> {
    store: &'a Store,
    renderer: &'a Renderer,
    settings: &'a FlowSettings,
}

impl<'a> FlowController<'a> {
    pub fn new(store: &'a Store, renderer: &'a Renderer, settings: &'a FlowSettings) -> Self {
        FlowController {
            store,
            renderer,
            settings,
        }
    }

    pub fn on_command(&self, user_id: i64, command: FlowCommand) -> Vec<Reply> {
        let (_, created) = self.store.ensure_user(user_id);
        if let FlowCommand::Start {
            referrer: Some(referrer),
        } = &command
        {
            if created {
                self.register_referral(user_id, *referrer);
            }
        }
        self.dispatch(user_id, Event::Command(command))
    }

    pub fn on_callback(&self, user_id: i64, token: &str) -> Vec<Reply> {
        self.store.ensure_user(user_id);
        let Some(action) = CallbackAction::parse(token) else {
            debug!(user_id, token, "Unrecognized callback token");
            return vec![Reply::text(texts::INACTIVE_BUTTON_TEXT)];
        };
        self.dispatch(user_id, Event::Callback(action))
    }

    pub fn on_photo(&self, user_id: i64, bytes: Vec<u8>, caption: Option<String>) -> Vec<Reply> {
        self.store.ensure_user(user_id);
        self.dispatch(user_id, Event::Photo { bytes, caption })
    }

    pub fn on_text(&self, user_id: i64, text: String) -> Vec<Reply> {
        self.store.ensure_user(user_id);
        self.dispatch(user_id, Event::Text(text))
    }

    pub fn awaits_photo(&self, user_id: i64) -> bool {
        self.store.session(user_id).state.awaits_photo()
    }

    /// Admin statistics. Anyone but the configured admin gets no reply at all.
    pub fn on_admin_command(&self, user_id: i64) -> Option<Reply> {
        if self.settings.admin_id != Some(user_id) {
            debug!(user_id, "Ignoring admin command from non-admin");
            return None;
        }
        Some(Reply::text(format!(
            "Admin panel active\nUsers: {}\nActive flows: {}\nStatus: online",
            self.store.user_count(),
            self.store.active_flows()
        )))
    }

    fn dispatch(&self, user_id: i64, event: Event) -> Vec<Reply> {
        let current = self.store.session(user_id);
        let from = current.state.label();
        let event_kind = event.kind();
        let Transition { session, effects } = transition(&current, event);

        let to = session.state.label();
        if from != to {
            info!(user_id, from, to, event = event_kind, "Conversation state changed");
        }
        self.store.save_session(user_id, session);

        effects
            .into_iter()
            .flat_map(|effect| self.execute(user_id, effect))
            .collect()
    }

    fn execute(&self, user_id: i64, effect: Effect) -> Vec<Reply> {
        match effect {
            Effect::Send(reply) => vec![reply],
            Effect::ShowProfile => vec![self.profile_reply(user_id)],
            Effect::ShowTariffs => vec![self.tariffs_reply()],
            Effect::Purchase(tariff_id) => vec![self.purchase(user_id, &tariff_id)],
            Effect::RenderCard { kind, photo } => {
                let badges = texts::card_badges(kind);
                let png = self.renderer.render_placeholder(&Placeholder {
                    prompt: texts::card_prompt(kind),
                    extra_lines: &badges,
                    reference: Some(photo.as_slice()),
                });
                info!(user_id, card = kind.slug(), "Rendered product card");
                vec![Reply::Photo {
                    png,
                    file_name: format!("card_{}.png", kind.slug()),
                    caption: Some(texts::RESULT_CAPTION.to_string()),
                    keyboard: Vec::new(),
                }]
            }
            Effect::RenderPortrait { draft } => {
                let png = self.renderer.render(&draft.prompt, Some(draft.photo.as_slice()));
                info!(user_id, "Rendered portrait");
                vec![Reply::Photo {
                    png,
                    file_name: "portrait.png".to_string(),
                    caption: Some(texts::RESULT_CAPTION.to_string()),
                    keyboard: texts::portrait_follow_up(),
                }]
            }
            Effect::RenderAngles { draft } => self.render_angles(user_id, &draft),
        }
    }

    fn render_angles(&self, user_id: i64, draft: &PortraitDraft) -> Vec<Reply> {
        let replies = Angle::ALL
            .iter()
            .map(|angle| {
                let prompt = format!("{} ({} view)", draft.prompt, angle.label());
                Reply::Photo {
                    png: self.renderer.render(&prompt, Some(draft.photo.as_slice())),
                    file_name: format!("angle_{}.png", angle.label()),
                    caption: Some(format!("Angle: {}", angle.label())),
                    keyboard: Vec::new(),
                }
            })
            .collect::<Vec<_>>();
        info!(user_id, count = replies.len(), "Rendered four-angle session");
        replies
    }

    fn register_referral(&self, user_id: i64, referrer: i64) {
        if referrer == user_id || self.store.user(referrer).is_none() {
            debug!(user_id, referrer, "Ignoring referral payload");
            return;
        }
        self.store.update_user(user_id, |record| {
            record.referred_by = Some(referrer);
        });
        let bonus = self.settings.referral_bonus;
        self.store.update_user(referrer, |record| {
            record.referrals += 1;
            record.tokens += bonus;
        });
        info!(user_id, referrer, bonus, "Referral registered");
    }

    fn invite_link(&self, user_id: i64) -> String {
        match self.settings.bot_username.as_deref() {
            Some(username) if !username.is_empty() => {
                format!("https://t.me/{username}?start=ref{user_id}")
            }
            _ => format!("/start ref{user_id}"),
        }
    }

    fn profile_reply(&self, user_id: i64) -> Reply {
        let (record, _) = self.store.ensure_user(user_id);
        Reply::text_with_keyboard(
            format!(
                "👤 ID: {}\n💎 Plan: Free (demo)\n⚡ Balance: {} tokens\n👥 Referrals: {}\n🔗 Invite: {}",
                record.user_id,
                record.tokens,
                record.referrals,
                self.invite_link(user_id)
            ),
            texts::back_only(),
        )
    }

    fn tariffs_reply(&self) -> Reply {
        let mut lines = vec!["💳 Plans:".to_string()];
        let mut keyboard = Vec::new();
        for tariff in &self.settings.tariffs {
            lines.push(format!(
                "{} - {}₽ ({} tokens)",
                tariff.name, tariff.price_rub, tariff.tokens
            ));
            keyboard.push(vec![Button::new(
                format!("{} - {}₽", tariff.name, tariff.price_rub),
                CallbackAction::Buy(tariff.id.clone()),
            )]);
        }
        keyboard.extend(texts::back_only());
        Reply::text_with_keyboard(lines.join("\n"), keyboard)
    }

    fn purchase(&self, user_id: i64, tariff_id: &str) -> Reply {
        let Some(tariff) = self
            .settings
            .tariffs
            .iter()
            .find(|tariff| tariff.id == tariff_id)
        else {
            return Reply::text_with_keyboard(texts::UNKNOWN_TARIFF_TEXT, texts::back_only());
        };

        let credited = tariff.tokens;
        let balance = self
            .store
            .update_user(user_id, |record| record.tokens += credited)
            .map(|record| record.tokens)
            .unwrap_or_default();
        info!(user_id, tariff = %tariff.id, credited, "Demo purchase");
        Reply::text_with_keyboard(
            format!(
                "✅ {} activated: +{} tokens, balance {}.\nDemo mode, no payment was taken.",
                tariff.name, credited, balance
            ),
            texts::back_only(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::actions::CardKind;
    use crate::flow::session::{ConversationState, Session};
    use crate::render::{Background, TextPainter};
    use crate::store::default_tariffs;
    use image::Rgb;

    const ADMIN: i64 = 1;

    struct Harness {
        store: Store,
        renderer: Renderer,
        settings: FlowSettings,
    }

    impl Harness {
        fn new() -> Self {
            Harness {
                store: Store::new(10),
                renderer: Renderer::new(TextPainter::Bitmap, Background::Fixed(Rgb([20, 120, 200]))),
                settings: FlowSettings {
                    admin_id: Some(ADMIN),
                    referral_bonus: 5,
                    tariffs: default_tariffs(),
                    bot_username: Some("banana_demo_bot".to_string()),
                },
            }
        }

        fn flow(&self) -> FlowController<'_> {
            FlowController::new(&self.store, &self.renderer, &self.settings)
        }
    }

    fn button_count(reply: &Reply) -> usize {
        match reply {
            Reply::Text { keyboard, .. } | Reply::Photo { keyboard, .. } => {
                keyboard.iter().map(Vec::len).sum()
            }
        }
    }

    #[test]
    fn product_card_walkthrough() {
        let harness = Harness::new();
        let flow = harness.flow();

        let replies = flow.on_command(10, FlowCommand::Start { referrer: None });
        assert_eq!(replies.len(), 1);
        assert_eq!(button_count(&replies[0]), 4);

        let replies = flow.on_callback(10, "card");
        assert_eq!(
            harness.store.session(10).state,
            ConversationState::AwaitingProductPhoto
        );
        assert_eq!(replies[0].caption_or_text(), Some(texts::PRODUCT_PHOTO_PROMPT));

        let replies = flow.on_photo(10, vec![0xde, 0xad], None);
        assert!(matches!(
            harness.store.session(10).state,
            ConversationState::AwaitingCardType { .. }
        ));
        assert_eq!(button_count(&replies[0]), 2);

        let replies = flow.on_callback(10, &CallbackAction::CardType(CardKind::Infographic).token());
        assert_eq!(replies.len(), 1);
        assert!(replies[0].is_photo());
        assert!(harness.store.session(10).state.is_idle());
    }

    #[test]
    fn commands_never_touch_other_users_sessions() {
        let harness = Harness::new();
        let flow = harness.flow();
        flow.on_command(20, FlowCommand::ProductCard);
        flow.on_photo(20, vec![1, 2, 3], None);
        let before = harness.store.session(20);

        for command in [
            FlowCommand::Start { referrer: None },
            FlowCommand::ProductCard,
            FlowCommand::PersonalPhoto,
            FlowCommand::Cancel,
            FlowCommand::Help,
            FlowCommand::Unknown("dance".to_string()),
        ] {
            flow.on_command(21, command);
            assert_eq!(harness.store.session(20), before);
        }
    }

    #[test]
    fn photo_without_pending_flow_does_nothing() {
        let harness = Harness::new();
        let flow = harness.flow();
        assert!(!flow.awaits_photo(30));
        let replies = flow.on_photo(30, vec![1, 2, 3], Some("card".to_string()));
        assert!(replies.is_empty());
        assert_eq!(harness.store.session(30), Session::default());
    }

    #[test]
    fn undecodable_photo_still_produces_a_portrait() {
        let harness = Harness::new();
        let flow = harness.flow();
        flow.on_command(40, FlowCommand::PersonalPhoto);
        assert!(flow.awaits_photo(40));

        let replies = flow.on_photo(40, b"garbage".to_vec(), Some("astronaut".to_string()));
        assert_eq!(replies.len(), 1);
        assert!(replies[0].is_photo());
        assert_eq!(button_count(&replies[0]), 2);
    }

    #[test]
    fn four_angle_session_emits_four_labelled_images() {
        let harness = Harness::new();
        let flow = harness.flow();
        harness.store.ensure_user(50);
        harness.store.save_session(
            50,
            Session {
                state: ConversationState::Idle,
                last_portrait: Some(PortraitDraft {
                    prompt: "P".to_string(),
                    photo: b"X".to_vec(),
                }),
            },
        );

        let replies = flow.on_callback(50, "session:angles");
        assert_eq!(replies.len(), 4);
        assert!(replies.iter().all(Reply::is_photo));

        let captions = replies
            .iter()
            .filter_map(Reply::caption_or_text)
            .collect::<Vec<_>>();
        assert_eq!(
            captions,
            vec![
                "Angle: front",
                "Angle: profile",
                "Angle: three-quarter",
                "Angle: back"
            ]
        );
        assert_eq!(harness.store.session(50), Session::default());
    }

    #[test]
    fn admin_query_is_silent_for_everyone_else() {
        let harness = Harness::new();
        let flow = harness.flow();
        flow.on_command(60, FlowCommand::Start { referrer: None });
        flow.on_command(61, FlowCommand::Start { referrer: None });

        assert!(flow.on_admin_command(60).is_none());

        let reply = flow.on_admin_command(ADMIN).expect("admin gets a reply");
        let text = reply.caption_or_text().unwrap_or_default();
        assert!(text.contains("Users: 2"), "unexpected admin text: {text}");
    }

    #[test]
    fn admin_query_without_configured_admin_is_silent() {
        let mut harness = Harness::new();
        harness.settings.admin_id = None;
        assert!(harness.flow().on_admin_command(ADMIN).is_none());
    }

    #[test]
    fn referral_credits_referrer_once() {
        let harness = Harness::new();
        let flow = harness.flow();
        flow.on_command(70, FlowCommand::Start { referrer: None });

        flow.on_command(71, FlowCommand::Start { referrer: Some(70) });
        flow.on_command(71, FlowCommand::Start { referrer: Some(70) });

        let referrer = harness.store.user(70).expect("referrer exists");
        assert_eq!(referrer.referrals, 1);
        assert_eq!(referrer.tokens, 15);
        assert_eq!(harness.store.user(71).and_then(|user| user.referred_by), Some(70));
    }

    #[test]
    fn self_referral_is_ignored() {
        let harness = Harness::new();
        let flow = harness.flow();
        flow.on_command(80, FlowCommand::Start { referrer: Some(80) });
        let record = harness.store.user(80).expect("user exists");
        assert_eq!(record.referrals, 0);
        assert_eq!(record.referred_by, None);
    }

    #[test]
    fn demo_purchase_credits_tariff_tokens() {
        let harness = Harness::new();
        let flow = harness.flow();
        let replies = flow.on_callback(90, "buy:pro");
        assert_eq!(harness.store.user(90).map(|user| user.tokens), Some(210));
        assert!(replies[0]
            .caption_or_text()
            .is_some_and(|text| text.contains("Pro")));

        let replies = flow.on_callback(90, "buy:platinum");
        assert_eq!(replies[0].caption_or_text(), Some(texts::UNKNOWN_TARIFF_TEXT));
    }

    #[test]
    fn profile_shows_invite_link() {
        let harness = Harness::new();
        let replies = harness.flow().on_command(100, FlowCommand::Profile);
        let text = replies[0].caption_or_text().unwrap_or_default();
        assert!(text.contains("https://t.me/banana_demo_bot?start=ref100"));
        assert!(text.contains("Balance: 10 tokens"));
    }

    #[test]
    fn unparseable_callback_gets_neutral_notice() {
        let harness = Harness::new();
        let replies = harness.flow().on_callback(110, "image_res:old|2K");
        assert_eq!(replies, vec![Reply::text(texts::INACTIVE_BUTTON_TEXT)]);
        assert!(harness.store.session(110).is_blank());
    }

    #[test]
    fn tariffs_menu_lists_every_plan_and_back() {
        let harness = Harness::new();
        let replies = harness.flow().on_callback(120, "buy");
        assert_eq!(button_count(&replies[0]), harness.settings.tariffs.len() + 1);
    }
}
