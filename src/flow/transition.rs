use crate::flow::actions::{CallbackAction, CardKind, FlowCommand};
use crate::flow::reply::Reply;
use crate::flow::session::{ConversationState, PortraitDraft, Session};
use crate::flow::texts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(FlowCommand),
    Callback(CallbackAction),
    Photo {
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    Text(String),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Command(_) => "command",
            Event::Callback(_) => "callback",
            Event::Photo { .. } => "photo",
            Event::Text(_) => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(Reply),
    ShowProfile,
    ShowTariffs,
    Purchase(String),
    RenderCard { kind: CardKind, photo: Vec<u8> },
    RenderPortrait { draft: PortraitDraft },
    RenderAngles { draft: PortraitDraft },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(session: Session, effects: Vec<Effect>) -> Self {
        Transition { session, effects }
    }

    fn unchanged(session: &Session, effects: Vec<Effect>) -> Self {
        Transition {
            session: session.clone(),
            effects,
        }
    }

    fn inactive_button(session: &Session) -> Self {
        Self::unchanged(
            session,
            vec![Effect::Send(Reply::text(texts::INACTIVE_BUTTON_TEXT))],
        )
    }
}

pub fn transition(session: &Session, event: Event) -> Transition {
    match event {
        Event::Command(command) => on_command(session, command),
        Event::Callback(action) => on_callback(session, action),
        Event::Photo { bytes, caption } => on_photo(session, bytes, caption),
        Event::Text(text) => on_text(session, text),
    }
}

fn welcome() -> Effect {
    Effect::Send(Reply::text_with_keyboard(
        texts::WELCOME_TEXT,
        texts::main_menu(),
    ))
}

fn on_command(session: &Session, command: FlowCommand) -> Transition {
    let base = if command.resets_session() {
        Session::default()
    } else {
        session.clone()
    };

    match command {
        FlowCommand::Start { .. } => Transition::to(base, vec![welcome()]),
        FlowCommand::Help | FlowCommand::Unknown(_) => {
            Transition::to(base, vec![Effect::Send(Reply::text(texts::HELP_TEXT))])
        }
        FlowCommand::ProductCard => start_product_card(),
        FlowCommand::PersonalPhoto => start_personal_photo(),
        FlowCommand::Profile => Transition::to(base, vec![Effect::ShowProfile]),
        FlowCommand::Tariffs => Transition::to(base, vec![Effect::ShowTariffs]),
        FlowCommand::Cancel => Transition::to(
            base,
            vec![Effect::Send(Reply::text(texts::CANCELLED_TEXT))],
        ),
    }
}

fn start_product_card() -> Transition {
    Transition::to(
        Session::in_state(ConversationState::AwaitingProductPhoto),
        vec![Effect::Send(Reply::text_with_keyboard(
            texts::PRODUCT_PHOTO_PROMPT,
            texts::back_only(),
        ))],
    )
}

fn start_personal_photo() -> Transition {
    Transition::to(
        Session::in_state(ConversationState::AwaitingPersonalPhoto),
        vec![Effect::Send(Reply::text_with_keyboard(
            texts::PERSONAL_PHOTO_PROMPT,
            texts::back_only(),
        ))],
    )
}

fn on_callback(session: &Session, action: CallbackAction) -> Transition {
    match action {
        CallbackAction::Back => Transition::to(Session::default(), vec![welcome()]),
        CallbackAction::Profile => Transition::unchanged(session, vec![Effect::ShowProfile]),
        CallbackAction::Tariffs => Transition::unchanged(session, vec![Effect::ShowTariffs]),
        CallbackAction::Buy(tariff_id) => {
            Transition::unchanged(session, vec![Effect::Purchase(tariff_id)])
        }
        CallbackAction::ProductCard if session.state.is_idle() => start_product_card(),
        CallbackAction::PersonalPhoto if session.state.is_idle() => start_personal_photo(),
        CallbackAction::CardType(kind) => match &session.state {
            ConversationState::AwaitingCardType { photo } => Transition::to(
                Session::default(),
                vec![Effect::RenderCard {
                    kind,
                    photo: photo.clone(),
                }],
            ),
            _ => Transition::inactive_button(session),
        },
        CallbackAction::FourAngles => match (&session.state, &session.last_portrait) {
            (ConversationState::Idle, Some(draft)) => Transition::to(
                Session::default(),
                vec![Effect::RenderAngles {
                    draft: draft.clone(),
                }],
            ),
            _ => Transition::inactive_button(session),
        },
        CallbackAction::EditPrompt => match (&session.state, &session.last_portrait) {
            (ConversationState::Idle, Some(draft)) => Transition::to(
                Session::in_state(ConversationState::EditingPrompt {
                    draft: draft.clone(),
                }),
                vec![Effect::Send(Reply::text_with_keyboard(
                    texts::EDIT_PROMPT_TEXT,
                    texts::back_only(),
                ))],
            ),
            _ => Transition::inactive_button(session),
        },
        CallbackAction::ProductCard | CallbackAction::PersonalPhoto => {
            Transition::inactive_button(session)
        }
    }
}

fn on_photo(session: &Session, bytes: Vec<u8>, caption: Option<String>) -> Transition {
    match session.state {
        ConversationState::AwaitingProductPhoto => Transition::to(
            Session::in_state(ConversationState::AwaitingCardType { photo: bytes }),
            vec![Effect::Send(Reply::text_with_keyboard(
                texts::CARD_TYPE_PROMPT,
                texts::card_type_choice(),
            ))],
        ),
        ConversationState::AwaitingPersonalPhoto => {
            let prompt = caption
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| texts::DEFAULT_PORTRAIT_PROMPT.to_string());
            portrait_rendered(PortraitDraft {
                prompt,
                photo: bytes,
            })
        }
        _ => Transition::unchanged(session, Vec::new()),
    }
}

fn on_text(session: &Session, text: String) -> Transition {
    let ConversationState::EditingPrompt { draft } = &session.state else {
        return Transition::unchanged(session, Vec::new());
    };

    let prompt = text.trim();
    if prompt.is_empty() {
        return Transition::unchanged(
            session,
            vec![Effect::Send(Reply::text(texts::EDIT_PROMPT_TEXT))],
        );
    }

    portrait_rendered(PortraitDraft {
        prompt: prompt.to_string(),
        photo: draft.photo.clone(),
    })
}

fn portrait_rendered(draft: PortraitDraft) -> Transition {
    Transition::to(
        Session {
            state: ConversationState::Idle,
            last_portrait: Some(draft.clone()),
        },
        vec![Effect::RenderPortrait { draft }],
    )
}
