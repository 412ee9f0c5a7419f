//! Process configuration, read once from the environment at startup

use crate::llm::DEFAULT_BASE_URL;
use crate::session::{SessionConfig, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_MAX_PAIRS, MAX_PAIRS_LIMIT};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";
pub const DEFAULT_ACTIVITY: &str = "테스트";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub openai_api_key: String,
    pub model: String,
    pub base_url: String,
    /// Text shown as the bot's "Playing ..." presence
    pub activity: String,
    pub session: SessionConfig,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("activity", &self.activity)
            .field("session", &self.session)
            .finish()
    }
}

impl BotConfig {
    /// Load from the process environment, after merging a `.env` file if
    /// one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let discord_token = required("DISCORD_TOKEN")?;
        let openai_api_key = required("OPENAI_KEY")?;

        let session = SessionConfig {
            max_pairs: parse_max_pairs(get("MAX_HISTORY_PAIRS"))?,
            completion_timeout: parse_secs("COMPLETION_TIMEOUT_SECS", get("COMPLETION_TIMEOUT_SECS"))?
                .unwrap_or(DEFAULT_COMPLETION_TIMEOUT),
            gate_timeout: parse_secs("SESSION_LOCK_TIMEOUT_SECS", get("SESSION_LOCK_TIMEOUT_SECS"))?,
            max_tokens: get("OPENAI_MAX_TOKENS")
                .map(|v| parse_value("OPENAI_MAX_TOKENS", &v))
                .transpose()?,
        };

        Ok(Self {
            discord_token,
            openai_api_key,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            activity: get("BOT_ACTIVITY").unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
            session,
        })
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_max_pairs(value: Option<String>) -> Result<usize, ConfigError> {
    const NAME: &str = "MAX_HISTORY_PAIRS";
    let Some(value) = value else {
        return Ok(DEFAULT_MAX_PAIRS);
    };
    match parse_value::<usize>(NAME, &value)? {
        pairs if pairs > MAX_PAIRS_LIMIT => Err(ConfigError::Invalid { name: NAME, value }),
        pairs => Ok(pairs),
    }
}

/// Whole seconds, strictly positive
fn parse_secs(name: &'static str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_value::<u64>(name, &value)? {
        0 => Err(ConfigError::Invalid { name, value }),
        secs => Ok(Some(Duration::from_secs(secs))),
    }
}
