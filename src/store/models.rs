use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub tokens: i64,
    pub referrals: u32,
    pub referred_by: Option<i64>,
}

impl UserRecord {
    pub fn new(user_id: i64, tokens: i64) -> Self {
        UserRecord {
            user_id,
            tokens,
            referrals: 0,
            referred_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    pub id: String,
    pub name: String,
    pub price_rub: u32,
    pub tokens: i64,
}

pub fn default_tariffs() -> Vec<Tariff> {
    vec![
        Tariff {
            id: "basic".to_string(),
            name: "Basic".to_string(),
            price_rub: 490,
            tokens: 50,
        },
        Tariff {
            id: "pro".to_string(),
            name: "Pro".to_string(),
            price_rub: 1490,
            tokens: 200,
        },
        Tariff {
            id: "unlimited".to_string(),
            name: "Unlimited".to_string(),
            price_rub: 2990,
            tokens: 1000,
        },
    ]
}
