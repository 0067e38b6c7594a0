use crate::flow::actions::{CallbackAction, CardKind};
use crate::flow::reply::{Button, Keyboard};

pub const WELCOME_TEXT: &str = "🚀 Nano Banana Pro demo is ready!\nPick an option:";
pub const PRODUCT_PHOTO_PROMPT: &str = "📦 Send a photo of your product on a light background.";
pub const PERSONAL_PHOTO_PROMPT: &str =
    "🤳 Send your selfie. Add a caption to describe the style you want.";
pub const CARD_TYPE_PROMPT: &str = "Photo received. Which card do you need?";
pub const EDIT_PROMPT_TEXT: &str = "✏️ Send a new description for your portrait.";
pub const INACTIVE_BUTTON_TEXT: &str = "This button is no longer active. Use /start to open the menu.";
pub const CANCELLED_TEXT: &str = "Cancelled. Use /start to open the menu.";
pub const RESULT_CAPTION: &str = "Done! (demo version)";
pub const DEFAULT_PORTRAIT_PROMPT: &str = "Personal photo session";
pub const UNKNOWN_TARIFF_TEXT: &str = "This plan is not available anymore.";

pub const HELP_TEXT: &str = "Nano Banana Pro demo commands:

/start - Open the main menu
/card - Create a product card from a photo
/portrait - Start a personal photo session
/profile - Show your profile and invite link
/tariffs - Show available plans
/cancel - Cancel the current action
/help - Show this help message";

pub fn card_prompt(kind: CardKind) -> &'static str {
    match kind {
        CardKind::Infographic => "Product card with infographic",
        CardKind::Plain => "Product card",
    }
}

pub fn card_badges(kind: CardKind) -> Vec<String> {
    match kind {
        CardKind::Infographic => vec![
            "+ Premium quality".to_string(),
            "+ Fast delivery".to_string(),
            "+ 1 year warranty".to_string(),
        ],
        CardKind::Plain => Vec::new(),
    }
}

pub fn main_menu() -> Keyboard {
    vec![
        vec![Button::new("My profile", CallbackAction::Profile)],
        vec![Button::new("Product card", CallbackAction::ProductCard)],
        vec![Button::new("Personal photo session", CallbackAction::PersonalPhoto)],
        vec![Button::new("Buy a plan", CallbackAction::Tariffs)],
    ]
}

pub fn back_only() -> Keyboard {
    vec![vec![Button::new("Back", CallbackAction::Back)]]
}

pub fn card_type_choice() -> Keyboard {
    vec![vec![
        Button::new(
            CardKind::Infographic.label(),
            CallbackAction::CardType(CardKind::Infographic),
        ),
        Button::new(CardKind::Plain.label(), CallbackAction::CardType(CardKind::Plain)),
    ]]
}

pub fn portrait_follow_up() -> Keyboard {
    vec![vec![
        Button::new("Four-angle session", CallbackAction::FourAngles),
        Button::new("Edit prompt", CallbackAction::EditPrompt),
    ]]
}
