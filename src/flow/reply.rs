use crate::flow::actions::CallbackAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Button {
            label: label.into(),
            action,
        }
    }
}

pub type Keyboard = Vec<Vec<Button>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text {
        text: String,
        keyboard: Keyboard,
    },
    Photo {
        png: Vec<u8>,
        file_name: String,
        caption: Option<String>,
        keyboard: Keyboard,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    pub fn text_with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Reply::Text {
            text: text.into(),
            keyboard,
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self, Reply::Photo { .. })
    }

    pub fn caption_or_text(&self) -> Option<&str> {
        match self {
            Reply::Text { text, .. } => Some(text),
            Reply::Photo { caption, .. } => caption.as_deref(),
        }
    }
}
