//! Outbound side of a chat platform

use async_trait::async_trait;

pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// The gateway asked us to reconnect, or the socket closed
    #[error("Reconnect requested: {0}")]
    Reconnect(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),
}

/// Where a command's answer goes: the channel the command came from.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn reply(&self, text: &str) -> ChannelResult<()>;
}
