const CARD_TYPE_PREFIX: &str = "card_type:";
const BUY_PREFIX: &str = "buy:";
const REFERRAL_PREFIX: &str = "ref";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    Start { referrer: Option<i64> },
    Help,
    ProductCard,
    PersonalPhoto,
    Profile,
    Tariffs,
    Cancel,
    Unknown(String),
}

impl FlowCommand {
    pub fn start_with_payload(payload: &str) -> Self {
        let referrer = payload
            .trim()
            .strip_prefix(REFERRAL_PREFIX)
            .and_then(|id| id.parse::<i64>().ok());
        FlowCommand::Start { referrer }
    }

    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            FlowCommand::Start { .. }
                | FlowCommand::ProductCard
                | FlowCommand::PersonalPhoto
                | FlowCommand::Cancel
        )
    }

    pub fn name(&self) -> &str {
        match self {
            FlowCommand::Start { .. } => "start",
            FlowCommand::Help => "help",
            FlowCommand::ProductCard => "card",
            FlowCommand::PersonalPhoto => "portrait",
            FlowCommand::Profile => "profile",
            FlowCommand::Tariffs => "tariffs",
            FlowCommand::Cancel => "cancel",
            FlowCommand::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Infographic,
    Plain,
}

impl CardKind {
    pub fn slug(self) -> &'static str {
        match self {
            CardKind::Infographic => "infographic",
            CardKind::Plain => "plain",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardKind::Infographic => "With infographic",
            CardKind::Plain => "Plain",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Angle {
    Front,
    Profile,
    ThreeQuarter,
    Back,
}

impl Angle {
    pub const ALL: [Angle; 4] = [Angle::Front, Angle::Profile, Angle::ThreeQuarter, Angle::Back];

    pub fn label(self) -> &'static str {
        match self {
            Angle::Front => "front",
            Angle::Profile => "profile",
            Angle::ThreeQuarter => "three-quarter",
            Angle::Back => "back",
        }
    }
}

/// Inline-button action. `token` and `parse` are the callback data wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Profile,
    ProductCard,
    PersonalPhoto,
    Tariffs,
    Back,
    CardType(CardKind),
    Buy(String),
    FourAngles,
    EditPrompt,
}

impl CallbackAction {
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some(kind) = token.strip_prefix(CARD_TYPE_PREFIX) {
            return match kind {
                "infographic" => Some(CallbackAction::CardType(CardKind::Infographic)),
                "plain" => Some(CallbackAction::CardType(CardKind::Plain)),
                _ => None,
            };
        }
        if let Some(tariff_id) = token.strip_prefix(BUY_PREFIX) {
            if tariff_id.is_empty() {
                return None;
            }
            return Some(CallbackAction::Buy(tariff_id.to_string()));
        }
        match token {
            "profile" => Some(CallbackAction::Profile),
            "card" => Some(CallbackAction::ProductCard),
            "face" => Some(CallbackAction::PersonalPhoto),
            "buy" => Some(CallbackAction::Tariffs),
            "back" => Some(CallbackAction::Back),
            "session:angles" => Some(CallbackAction::FourAngles),
            "session:edit" => Some(CallbackAction::EditPrompt),
            _ => None,
        }
    }

    pub fn token(&self) -> String {
        match self {
            CallbackAction::Profile => "profile".to_string(),
            CallbackAction::ProductCard => "card".to_string(),
            CallbackAction::PersonalPhoto => "face".to_string(),
            CallbackAction::Tariffs => "buy".to_string(),
            CallbackAction::Back => "back".to_string(),
            CallbackAction::CardType(kind) => format!("{CARD_TYPE_PREFIX}{}", kind.slug()),
            CallbackAction::Buy(tariff_id) => format!("{BUY_PREFIX}{tariff_id}"),
            CallbackAction::FourAngles => "session:angles".to_string(),
            CallbackAction::EditPrompt => "session:edit".to_string(),
        }
    }

    pub fn renders(&self) -> bool {
        matches!(
            self,
            CallbackAction::CardType(_) | CallbackAction::FourAngles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_menu_tokens() {
        assert_eq!(CallbackAction::parse("card"), Some(CallbackAction::ProductCard));
        assert_eq!(CallbackAction::parse("face"), Some(CallbackAction::PersonalPhoto));
        assert_eq!(CallbackAction::parse("buy"), Some(CallbackAction::Tariffs));
        assert_eq!(
            CallbackAction::parse("card_type:infographic"),
            Some(CallbackAction::CardType(CardKind::Infographic))
        );
        assert_eq!(
            CallbackAction::parse("buy:pro"),
            Some(CallbackAction::Buy("pro".to_string()))
        );
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(CallbackAction::parse("card_type:glossy"), None);
        assert_eq!(CallbackAction::parse("buy:"), None);
        assert_eq!(CallbackAction::parse("image_res:abc|2K"), None);
    }

    #[test]
    fn tokens_parse_back_to_the_same_action() {
        let action = CallbackAction::Buy("unlimited".to_string());
        assert_eq!(CallbackAction::parse(&action.token()), Some(action));
    }

    #[test]
    fn start_payload_extracts_referrer() {
        assert_eq!(
            FlowCommand::start_with_payload("ref42"),
            FlowCommand::Start { referrer: Some(42) }
        );
        assert_eq!(
            FlowCommand::start_with_payload(""),
            FlowCommand::Start { referrer: None }
        );
        assert_eq!(
            FlowCommand::start_with_payload("promo"),
            FlowCommand::Start { referrer: None }
        );
    }
}
