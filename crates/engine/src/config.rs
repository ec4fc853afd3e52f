use std::time::Duration;

use courier_shared::schemas::HIDDEN_API_KEY;
use courier_shared::widget::DEFAULT_WELCOME_MESSAGE;
use courier_shared::{ConfigUpdate, PublicWidgetConfig, RedactedConfig, WidgetPresentation};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::bridge::PollPolicy;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// bcrypt hash of `password`.
pub const DEFAULT_ADMIN_PASSWORD_HASH: &str =
    "$2a$10$92IXUNpkjO0rOQ5byMi.Ye4oKoEa3Ro9llC/.og/at2.uheWG/igi";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

/// Process settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub assistant_id: String,
    pub openai_base_url: String,
    pub admin_password_hash: String,
    /// `None` means a random secret is generated for this process.
    pub token_secret: Option<String>,
    pub token_ttl: Duration,
    pub allowed_origins: AllowedOrigins,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let poll = PollPolicy {
            interval: Duration::from_millis(parse_or(
                "CHAT_POLL_INTERVAL_MS",
                get("CHAT_POLL_INTERVAL_MS"),
                1000u64,
                "a number of milliseconds",
            )?),
            max_attempts: parse_or(
                "CHAT_POLL_MAX_ATTEMPTS",
                get("CHAT_POLL_MAX_ATTEMPTS"),
                30u32,
                "a whole number",
            )?,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), 3001u16, "a port number")?,
            api_key: get("OPENAI_API_KEY").unwrap_or_default(),
            assistant_id: get("ASSISTANT_ID").unwrap_or_default(),
            openai_base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            admin_password_hash: get("ADMIN_PASSWORD_HASH")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD_HASH.to_string()),
            token_secret: get("JWT_SECRET"),
            token_ttl: token_ttl(get("ADMIN_TOKEN_TTL_HOURS"))?,
            allowed_origins: AllowedOrigins::parse(&get("ALLOWED_ORIGINS").unwrap_or_default()),
            poll,
            request_timeout: Duration::from_secs(parse_or(
                "ASSISTANT_REQUEST_TIMEOUT_SECS",
                get("ASSISTANT_REQUEST_TIMEOUT_SECS"),
                60u64,
                "a number of seconds",
            )?),
        })
    }

    pub fn initial_configuration(&self) -> Configuration {
        Configuration {
            api_key: self.api_key.clone(),
            assistant_id: self.assistant_id.clone(),
            ..Configuration::default()
        }
    }
}

/// Token lifetime in whole hours. It must fit a signed seconds timestamp.
fn token_ttl(raw: Option<String>) -> Result<Duration, SettingsError> {
    const NAME: &str = "ADMIN_TOKEN_TTL_HOURS";
    const EXPECTED: &str = "a number of hours";

    let hours = parse_or(NAME, raw.clone(), 24u64, EXPECTED)?;
    hours
        .checked_mul(3600)
        .filter(|secs| i64::try_from(*secs).is_ok())
        .map(Duration::from_secs)
        .ok_or_else(|| SettingsError::Invalid {
            name: NAME,
            expected: EXPECTED,
            value: raw.unwrap_or_default(),
        })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
    expected: &'static str,
) -> Result<T, SettingsError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| SettingsError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

/// The mutable, process-lifetime configuration an operator edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub api_key: String,
    pub assistant_id: String,
    pub welcome_message: String,
    pub widget_config: WidgetPresentation,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            assistant_id: String::new(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            widget_config: WidgetPresentation::default(),
        }
    }
}

impl Configuration {
    pub fn redacted(&self) -> RedactedConfig {
        let has_api_key = !self.api_key.is_empty();
        RedactedConfig {
            api_key: if has_api_key { HIDDEN_API_KEY.to_string() } else { String::new() },
            has_api_key,
            assistant_id: self.assistant_id.clone(),
            welcome_message: self.welcome_message.clone(),
            widget_config: self.widget_config.clone(),
        }
    }

    pub fn apply(&mut self, update: ConfigUpdate) {
        let non_blank = |v: &String| !v.trim().is_empty();

        if let Some(key) = update.api_key.filter(non_blank) {
            // The redacted placeholder echoed back by an admin form means "keep".
            if key != HIDDEN_API_KEY {
                self.api_key = key;
            }
        }
        if let Some(id) = update.assistant_id.filter(non_blank) {
            self.assistant_id = id;
        }
        if let Some(welcome) = update.welcome_message.filter(non_blank) {
            self.welcome_message = welcome;
        }
        if let Some(widget) = update.widget_config {
            self.widget_config.merge(widget);
        }
    }
}

/// Shared owner of the [`Configuration`].
#[derive(Debug, Default)]
pub struct ConfigStore {
    inner: RwLock<Configuration>,
}

impl ConfigStore {
    pub fn new(config: Configuration) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// The shared credential, or `None` when unset.
    pub async fn api_key(&self) -> Option<String> {
        let config = self.inner.read().await;
        (!config.api_key.is_empty()).then(|| config.api_key.clone())
    }

    pub async fn snapshot(&self) -> Configuration {
        self.inner.read().await.clone()
    }

    pub async fn redacted(&self) -> RedactedConfig {
        self.inner.read().await.redacted()
    }

    pub async fn public_defaults(&self) -> PublicWidgetConfig {
        let config = self.inner.read().await;
        PublicWidgetConfig {
            welcome_message: config.welcome_message.clone(),
            widget_config: config.widget_config.clone(),
        }
    }

    /// Apply a partial update under a single write lock.
    pub async fn apply(&self, update: ConfigUpdate) {
        self.inner.write().await.apply(update);
    }
}
