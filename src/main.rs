//! rolebot - a Discord front end for one shared LLM conversation
//!
//! Users steer the model with a list of system roles and talk to it through
//! `!gpt` commands. One bounded history is shared by everyone, and chat
//! exchanges run strictly one at a time.

mod channel;
mod command;
mod config;
mod discord;
mod error;
mod llm;
mod session;

use command::CommandRouter;
use config::BotConfig;
use discord::{ChannelReply, DiscordChannel};
use llm::{LlmService, LoggingService, OpenAIService};
use session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rolebot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    // Configuration: both secrets must be present before anything connects
    let config = BotConfig::from_env()?;
    tracing::info!(
        model = %config.model,
        max_pairs = config.session.max_pairs,
        completion_timeout_secs = config.session.completion_timeout.as_secs(),
        "Configuration loaded"
    );

    let openai = OpenAIService::new(
        config.openai_api_key.clone(),
        config.model.clone(),
        &config.base_url,
        config.session.transport_timeout(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(openai)));

    let session = Arc::new(Session::new(llm, config.session.clone()));
    let router = Arc::new(CommandRouter::new(session));

    let channel = DiscordChannel::new(&config.discord_token, config.activity.clone());
    let bot = channel.http().current_user().await?;
    tracing::info!(user = %bot.username, id = %bot.id, "Discord token verified");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                cancel.cancel();
            }
        });
    }

    loop {
        let result = channel
            .listen(&bot, &cancel, |msg| {
                let router = Arc::clone(&router);
                let reply = ChannelReply::new(channel.http().clone(), msg.channel_id.clone());
                tokio::spawn(async move {
                    if let Err(e) = router.handle_line(&msg.content, &reply).await {
                        tracing::warn!(error = %e, message_id = %msg.id, "Failed to deliver reply");
                    }
                });
            })
            .await;

        match result {
            Ok(()) => break,
            Err(channel::ChannelError::Auth(e)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Discord connection lost, reconnecting");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }

    tracing::info!("rolebot stopped");
    Ok(())
}
