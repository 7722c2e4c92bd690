use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const REVIEW_API_TOKEN: &str = "REVIEW_API_TOKEN";
pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const DEFAULT_REVIEW_API_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Global application configuration loaded from environment variables.
///
/// Credentials stay optional here; [`AppConfig::credentials`] is the gate
/// that decides whether the process may start polling.
#[derive(Clone)]
pub struct AppConfig {
    /// Token for the review-status API
    pub review_api_token: Option<String>,

    /// Telegram bot token used for notification delivery
    pub telegram_bot_token: Option<String>,

    /// Telegram chat that receives every notification
    pub telegram_chat_id: Option<String>,

    /// Review-status endpoint polled on every iteration
    pub review_api_endpoint: String,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Pause between poll iterations in seconds (default: 600)
    pub retry_period_secs: u64,

    /// Upper bound for a single outbound HTTP request in seconds (default: 30)
    pub request_timeout_secs: u64,
}

/// The three credentials, all verified to be present and non-empty.
#[derive(Clone)]
pub struct Credentials {
    pub review_api_token: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

impl AppConfig {
    /// Load configuration from environment variables, reading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            review_api_token: non_empty(lookup(REVIEW_API_TOKEN)),
            telegram_bot_token: non_empty(lookup(TELEGRAM_BOT_TOKEN)),
            telegram_chat_id: non_empty(lookup(TELEGRAM_CHAT_ID)),
            review_api_endpoint: lookup("REVIEW_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_REVIEW_API_ENDPOINT.to_string()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            retry_period_secs: lookup("RETRY_PERIOD_SECS")
                .unwrap_or_else(|| "600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETRY_PERIOD_SECS must be a valid u64"))?,
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be a valid u64"))?,
        })
    }

    /// Verify that every credential is present.
    ///
    /// Each missing variable is logged on its own before the aggregate
    /// error is returned, in the order they are checked.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let checks = [
            (REVIEW_API_TOKEN, &self.review_api_token),
            (TELEGRAM_BOT_TOKEN, &self.telegram_bot_token),
            (TELEGRAM_CHAT_ID, &self.telegram_chat_id),
        ];

        let mut missing = Vec::new();
        for (name, value) in checks {
            if value.is_none() {
                tracing::error!(
                    variable = name,
                    critical = true,
                    "Required environment variable is not set"
                );
                missing.push(name.to_string());
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingCredentials(missing));
        }

        Ok(Credentials {
            review_api_token: self.review_api_token.clone().unwrap_or_default(),
            telegram_bot_token: self.telegram_bot_token.clone().unwrap_or_default(),
            telegram_chat_id: self.telegram_chat_id.clone().unwrap_or_default(),
        })
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("review_api_token", &self.review_api_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_bot_token", &self.telegram_bot_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("review_api_endpoint", &self.review_api_endpoint)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("retry_period_secs", &self.retry_period_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("review_api_token", &"<redacted>")
            .field("telegram_bot_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}
