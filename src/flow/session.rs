#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitDraft {
    pub prompt: String,
    pub photo: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingProductPhoto,
    AwaitingCardType {
        photo: Vec<u8>,
    },
    AwaitingPersonalPhoto,
    EditingPrompt {
        draft: PortraitDraft,
    },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }

    pub fn awaits_photo(&self) -> bool {
        matches!(
            self,
            ConversationState::AwaitingProductPhoto | ConversationState::AwaitingPersonalPhoto
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::AwaitingProductPhoto => "awaiting_product_photo",
            ConversationState::AwaitingCardType { .. } => "awaiting_card_type",
            ConversationState::AwaitingPersonalPhoto => "awaiting_personal_photo",
            ConversationState::EditingPrompt { .. } => "editing_prompt",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: ConversationState,
    pub last_portrait: Option<PortraitDraft>,
}

impl Session {
    pub fn in_state(state: ConversationState) -> Self {
        Session {
            state,
            last_portrait: None,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.state.is_idle() && self.last_portrait.is_none()
    }
}
