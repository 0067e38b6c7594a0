use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::store::{default_tariffs, Tariff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Polling,
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
struct TariffsFile {
    tariffs: Vec<TariffEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TariffEntry {
    id: String,
    name: String,
    price_rub: u32,
    #[serde(default)]
    tokens: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub logs_dir: PathBuf,
    pub admin_id: Option<i64>,
    pub delivery_mode: DeliveryMode,
    pub webhook_host: String,
    pub webhook_path: String,
    pub port: u16,
    pub render_font_path: Option<PathBuf>,
    pub demo_token_balance: i64,
    pub referral_bonus: i64,
    pub tariffs_config_path: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}

fn parse_admin_id(value: &str) -> Option<i64> {
    match value.trim().parse::<i64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(id),
    }
}

fn parse_delivery_mode(value: &str, webhook_host: &str) -> Result<DeliveryMode> {
    match value.trim().to_lowercase().as_str() {
        "" if webhook_host.trim().is_empty() => Ok(DeliveryMode::Polling),
        "" => Ok(DeliveryMode::Webhook),
        "polling" | "poll" | "long-poll" => Ok(DeliveryMode::Polling),
        "webhook" => Ok(DeliveryMode::Webhook),
        other => Err(anyhow!(
            "Unknown DELIVERY_MODE '{other}', expected 'polling' or 'webhook'"
        )),
    }
}

fn normalize_webhook_path(value: &str) -> String {
    let trimmed = value.trim().trim_matches('/');
    if trimmed.is_empty() {
        return "/webhook".to_string();
    }
    format!("/{trimmed}")
}

fn parse_tariffs(raw: &str) -> Result<Vec<Tariff>> {
    let parsed: TariffsFile = serde_json::from_str(raw)?;
    let mut tariffs = Vec::new();
    for entry in parsed.tariffs {
        let id = entry.id.trim();
        let name = entry.name.trim();
        if id.is_empty() || name.is_empty() {
            continue;
        }
        tariffs.push(Tariff {
            id: id.to_string(),
            name: name.to_string(),
            price_rub: entry.price_rub,
            tokens: entry.tokens.unwrap_or(0).max(0),
        });
    }
    Ok(tariffs)
}

pub fn load_tariffs_from_path(path: &Path) -> Vec<Tariff> {
    if !path.exists() {
        info!(
            "Tariff config not found at {}, using built-in plans",
            path.display()
        );
        return default_tariffs();
    }

    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read tariff config at {}: {}", path.display(), err);
            return default_tariffs();
        }
    };

    match parse_tariffs(&raw) {
        Ok(tariffs) if !tariffs.is_empty() => {
            info!("Loaded {} tariff(s) from {}", tariffs.len(), path.display());
            tariffs
        }
        Ok(_) => {
            warn!("Tariff config at {} lists no plans", path.display());
            default_tariffs()
        }
        Err(err) => {
            warn!("Failed to parse tariff config at {}: {}", path.display(), err);
            default_tariffs()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(anyhow!("BOT_TOKEN is required"));
        }

        let webhook_host = env::var("WEBHOOK_HOST")
            .or_else(|_| env::var("RENDER_EXTERNAL_HOSTNAME"))
            .unwrap_or_default()
            .trim()
            .to_string();
        let delivery_mode = parse_delivery_mode(&env_string("DELIVERY_MODE", ""), &webhook_host)?;
        if delivery_mode == DeliveryMode::Webhook && webhook_host.is_empty() {
            return Err(anyhow!(
                "Webhook mode needs WEBHOOK_HOST or RENDER_EXTERNAL_HOSTNAME"
            ));
        }

        let render_font_path = env::var("RENDER_FONT_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            bot_token,
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            logs_dir: PathBuf::from(env_string("LOGS_DIR", "logs")),
            admin_id: parse_admin_id(&env_string("ADMIN_ID", "0")),
            delivery_mode,
            webhook_host,
            webhook_path: normalize_webhook_path(&env_string("WEBHOOK_PATH", "/webhook")),
            port: env_u16("PORT", 10000),
            render_font_path,
            demo_token_balance: env_i64("DEMO_TOKEN_BALANCE", 10),
            referral_bonus: env_i64("REFERRAL_BONUS", 5),
            tariffs_config_path: PathBuf::from(env_string("TARIFFS_CONFIG_PATH", "tariffs.json")),
        })
    }

    pub fn webhook_url(&self) -> Result<Url> {
        let host = self
            .webhook_host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Url::parse(&format!("https://{host}{}", self.webhook_path))
            .map_err(|err| anyhow!("Invalid webhook URL for host '{host}': {err}"))
    }
}
