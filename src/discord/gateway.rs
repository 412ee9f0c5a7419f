//! Discord Gateway client (v10, JSON encoding)

use super::{BotUser, DiscordChannel};
use crate::channel::{ChannelError, ChannelResult};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// GUILDS | GUILD_MESSAGES | DIRECT_MESSAGES | MESSAGE_CONTENT
const INTENTS: u64 = 1 | (1 << 9) | (1 << 12) | (1 << 15);
const DEFAULT_HEARTBEAT_MS: u64 = 41_250;

const OP_DISPATCH: u8 = 0;
const OP_HEARTBEAT: u8 = 1;
const OP_IDENTIFY: u8 = 2;
const OP_RECONNECT: u8 = 7;
const OP_INVALID_SESSION: u8 = 9;
const OP_HELLO: u8 = 10;
const OP_HEARTBEAT_ACK: u8 = 11;

/// A user message addressed to a channel the bot can see
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u8,
    #[serde(default)]
    d: serde_json::Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageCreate {
    id: String,
    channel_id: String,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    content: String,
    author: Author,
}

#[derive(Debug, Deserialize)]
struct Author {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum GatewayAction {
    Message(IncomingMessage),
    HeartbeatNow,
    HeartbeatAck,
    Reconnect(&'static str),
    Ready,
    Ignore,
}

fn interpret(payload: GatewayPayload, bot_user_id: &str) -> GatewayAction {
    match payload.op {
        OP_DISPATCH => match payload.t.as_deref() {
            Some("READY") => GatewayAction::Ready,
            Some("MESSAGE_CREATE") => {
                let Ok(msg) = serde_json::from_value::<MessageCreate>(payload.d) else {
                    return GatewayAction::Ignore;
                };
                // Never answer ourselves or other bots
                if msg.author.id == bot_user_id || msg.author.bot || msg.content.trim().is_empty() {
                    return GatewayAction::Ignore;
                }
                GatewayAction::Message(IncomingMessage {
                    id: msg.id,
                    channel_id: msg.channel_id,
                    guild_id: msg.guild_id,
                    author_id: msg.author.id,
                    author_name: msg.author.username,
                    content: msg.content,
                })
            }
            _ => GatewayAction::Ignore,
        },
        OP_HEARTBEAT => GatewayAction::HeartbeatNow,
        OP_HEARTBEAT_ACK => GatewayAction::HeartbeatAck,
        OP_RECONNECT => GatewayAction::Reconnect("server requested reconnect"),
        OP_INVALID_SESSION => GatewayAction::Reconnect("invalid session"),
        _ => GatewayAction::Ignore,
    }
}

fn identify_payload(token: &str, activity: &str) -> serde_json::Value {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": INTENTS,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "rolebot",
                "device": "rolebot"
            },
            "presence": {
                "since": null,
                "activities": [{ "name": activity, "type": 0 }],
                "status": "online",
                "afk": false
            }
        }
    })
}

/// Tracks whether the last interval heartbeat was acknowledged. A tick that
/// finds it unacknowledged means the connection is zombied.
#[derive(Debug)]
struct HeartbeatMonitor {
    acked: bool,
}

impl HeartbeatMonitor {
    fn new() -> Self {
        Self { acked: true }
    }

    fn beat(&mut self) -> ChannelResult<()> {
        if !self.acked {
            return Err(ChannelError::Reconnect("Heartbeat not acknowledged".into()));
        }
        self.acked = false;
        Ok(())
    }

    fn ack(&mut self) {
        self.acked = true;
    }
}

fn heartbeat_payload(last_seq: Option<u64>) -> String {
    json!({ "op": OP_HEARTBEAT, "d": last_seq }).to_string()
}

impl DiscordChannel {
    /// Connect to the gateway and feed user messages to `on_message` until
    /// `cancel` fires (`Ok`) or the connection ends (`Err`, caller
    /// reconnects).
    pub async fn listen<F>(
        &self,
        bot: &BotUser,
        cancel: &CancellationToken,
        on_message: F,
    ) -> ChannelResult<()>
    where
        F: Fn(IncomingMessage),
    {
        let gw_url = self.http.gateway_url().await?;
        let ws_url = format!("{gw_url}/?v=10&encoding=json");
        tracing::info!("Discord: connecting to gateway...");

        let (ws_stream, _) = tokio_tungstenite::connect_async(&ws_url)
            .await
            .map_err(|e| ChannelError::Connection(format!("WebSocket connection failed: {e}")))?;
        let (mut write, mut read) = ws_stream.split();

        let hello = read
            .next()
            .await
            .ok_or_else(|| ChannelError::Connection("No hello from gateway".into()))?
            .map_err(|e| ChannelError::Connection(format!("WebSocket error: {e}")))?;
        let hello: GatewayPayload = hello
            .to_text()
            .map_err(|e| ChannelError::Connection(format!("Invalid hello frame: {e}")))
            .and_then(|text| {
                serde_json::from_str(text)
                    .map_err(|e| ChannelError::Connection(format!("Invalid hello: {e}")))
            })?;
        if hello.op != OP_HELLO {
            return Err(ChannelError::Connection(format!(
                "Expected hello, got opcode {}",
                hello.op
            )));
        }
        let period = Duration::from_millis(
            hello
                .d
                .get("heartbeat_interval")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(DEFAULT_HEARTBEAT_MS),
        );

        write
            .send(Message::Text(identify_payload(&self.token, &self.activity).to_string()))
            .await
            .map_err(|e| ChannelError::Connection(format!("Failed to identify: {e}")))?;

        let mut heartbeat = interval_at(Instant::now() + period, period);
        let mut last_seq: Option<u64> = None;
        let mut monitor = HeartbeatMonitor::new();

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    tracing::info!("Discord: gateway closed for shutdown");
                    return Ok(());
                }
                _ = heartbeat.tick() => {
                    monitor.beat()?;
                    write
                        .send(Message::Text(heartbeat_payload(last_seq)))
                        .await
                        .map_err(|e| ChannelError::Reconnect(format!("Heartbeat failed: {e}")))?;
                }
                frame = read.next() => {
                    let text = match frame {
                        Some(Ok(Message::Text(t))) => t,
                        Some(Ok(Message::Close(reason))) => {
                            return Err(ChannelError::Reconnect(format!("Gateway closed: {reason:?}")));
                        }
                        Some(Err(e)) => return Err(ChannelError::Reconnect(format!("WebSocket error: {e}"))),
                        None => return Err(ChannelError::Reconnect("Gateway stream ended".into())),
                        Some(Ok(_)) => continue,
                    };

                    let payload: GatewayPayload = match serde_json::from_str(&text) {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::debug!(error = %e, "Discord: unparseable gateway frame");
                            continue;
                        }
                    };
                    if payload.s.is_some() {
                        last_seq = payload.s;
                    }

                    match interpret(payload, &bot.id) {
                        GatewayAction::Message(msg) => {
                            tracing::info!(
                                channel = "discord",
                                user_id = %msg.author_id,
                                user = %msg.author_name,
                                guild_id = ?msg.guild_id,
                                chat_id = %msg.channel_id,
                                "Message received"
                            );
                            on_message(msg);
                        }
                        GatewayAction::HeartbeatNow => {
                            write
                                .send(Message::Text(heartbeat_payload(last_seq)))
                                .await
                                .map_err(|e| ChannelError::Reconnect(format!("Heartbeat failed: {e}")))?;
                        }
                        GatewayAction::HeartbeatAck => monitor.ack(),
                        GatewayAction::Ready => {
                            tracing::info!(user = %bot.username, "We have logged in");
                        }
                        GatewayAction::Reconnect(reason) => {
                            return Err(ChannelError::Reconnect(reason.to_string()));
                        }
                        GatewayAction::Ignore => {}
                    }
                }
            }
        }
    }
}
