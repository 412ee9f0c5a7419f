//! Discord transport
//!
//! REST for identity checks and replies, Gateway WebSocket for inbound
//! messages.

pub mod format;
mod gateway;

use crate::channel::{ChannelError, ChannelResult, ReplySink};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const API_BASE: &str = "https://discord.com/api/v10";

/// The bot's own account, as reported by `/users/@me`
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

/// Authenticated REST client; cheap to clone
#[derive(Clone)]
pub struct DiscordHttp {
    client: Client,
    token: Arc<str>,
}

impl DiscordHttp {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            token: Arc::from(token),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Verify the token and fetch the bot's identity.
    pub async fn current_user(&self) -> ChannelResult<BotUser> {
        let resp = self
            .client
            .get(format!("{API_BASE}/users/@me"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| ChannelError::Connection(format!("Failed to verify Discord token: {e}")))?;

        if !resp.status().is_success() {
            return Err(ChannelError::Auth(format!(
                "Invalid Discord bot token (HTTP {})",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ChannelError::Connection(format!("Invalid /users/@me response: {e}")))
    }

    async fn gateway_url(&self) -> ChannelResult<String> {
        let resp: serde_json::Value = self
            .client
            .get(format!("{API_BASE}/gateway/bot"))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| ChannelError::Connection(format!("Failed to get gateway: {e}")))?
            .json()
            .await
            .map_err(|e| ChannelError::Connection(format!("Invalid gateway response: {e}")))?;

        Ok(resp
            .get("url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("wss://gateway.discord.gg")
            .to_string())
    }

    /// Post `text` to a channel, split into as many messages as needed.
    pub async fn send_message(&self, channel_id: &str, text: &str) -> ChannelResult<()> {
        let url = format!("{API_BASE}/channels/{channel_id}/messages");

        for chunk in format::split_message(text) {
            let resp = self
                .client
                .post(&url)
                .header("Authorization", self.auth_header())
                .json(&json!({ "content": chunk }))
                .send()
                .await
                .map_err(|e| ChannelError::SendFailed(format!("Discord send error: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let error = resp.text().await.unwrap_or_default();
                return Err(ChannelError::SendFailed(format!(
                    "Discord API error ({status}): {error}"
                )));
            }
        }
        Ok(())
    }
}

/// Replies into the channel a message came from
pub struct ChannelReply {
    http: DiscordHttp,
    channel_id: String,
}

impl ChannelReply {
    pub fn new(http: DiscordHttp, channel_id: impl Into<String>) -> Self {
        Self {
            http,
            channel_id: channel_id.into(),
        }
    }
}

#[async_trait]
impl ReplySink for ChannelReply {
    async fn reply(&self, text: &str) -> ChannelResult<()> {
        self.http.send_message(&self.channel_id, text).await
    }
}

/// Gateway connection settings
pub struct DiscordChannel {
    http: DiscordHttp,
    token: String,
    activity: String,
}

impl DiscordChannel {
    pub fn new(token: &str, activity: impl Into<String>) -> Self {
        Self {
            http: DiscordHttp::new(token),
            token: token.to_string(),
            activity: activity.into(),
        }
    }

    pub fn http(&self) -> &DiscordHttp {
        &self.http
    }
}
