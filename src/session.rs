//! The single conversation session shared by all command handlers
//!
//! History lives inside the async mutex that serializes chat exchanges, so
//! holding the guard is the only way to read or change it. Roles sit behind
//! a separate short-lived lock and are never held across an `.await`.

mod history;
mod roles;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use history::{HistoryBuffer, Speaker, Turn, DEFAULT_MAX_PAIRS, MAX_PAIRS_LIMIT};
pub use roles::RoleRegistry;

use crate::error::ChatError;
use crate::llm::{LlmMessage, LlmRequest, LlmService};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::timeout;

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);
/// Extra time the HTTP client gets beyond the completion deadline
const TRANSPORT_GRACE: Duration = Duration::from_secs(10);

/// Session tuning knobs
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_pairs: usize,
    /// Deadline for one completion call
    pub completion_timeout: Duration,
    /// Bounded wait for the gate; `None` waits as long as it takes
    pub gate_timeout: Option<Duration>,
    pub max_tokens: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_pairs: DEFAULT_MAX_PAIRS,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            gate_timeout: None,
            max_tokens: None,
        }
    }
}

impl SessionConfig {
    /// HTTP client timeout, always later than `completion_timeout`.
    pub fn transport_timeout(&self) -> Duration {
        self.completion_timeout.saturating_add(TRANSPORT_GRACE)
    }
}

pub struct Session {
    gate: Mutex<HistoryBuffer>,
    roles: RwLock<RoleRegistry>,
    client: Arc<dyn LlmService>,
    config: SessionConfig,
}

impl Session {
    pub fn new(client: Arc<dyn LlmService>, config: SessionConfig) -> Self {
        Self {
            gate: Mutex::new(HistoryBuffer::new(config.max_pairs)),
            roles: RwLock::new(RoleRegistry::new()),
            client,
            config,
        }
    }

    // ==================== Roles ====================

    pub fn add_role(&self, role: &str) -> Result<usize, ChatError> {
        self.roles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(role)
    }

    /// Owned snapshot of the roles with 1-based indices.
    pub fn list_roles(&self) -> Vec<(usize, String)> {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list()
            .map(|(i, role)| (i, role.to_string()))
            .collect()
    }

    pub fn remove_role(&self, token: &str) -> Result<String, ChatError> {
        self.roles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_at(token)
    }

    // ==================== Chat ====================

    /// Ask the model `question` in the context of the current roles and
    /// history, then record the exchange.
    ///
    /// Exchanges run one at a time. On any failure the history is left
    /// exactly as it was.
    pub async fn run_exclusive(&self, question: &str) -> Result<String, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyInput("question"));
        }

        let mut history = self.acquire().await?;
        let request = self.build_request(&history, question);

        tracing::debug!(
            prompt_messages = request.messages.len(),
            history_turns = history.len(),
            "Sending chat exchange"
        );

        let response = match timeout(self.config.completion_timeout, self.client.complete(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ChatError::CompletionFailed(e)),
            Err(_) => {
                return Err(ChatError::Timeout {
                    waiting_for: "completion",
                    after: self.config.completion_timeout,
                })
            }
        };

        if let Err(e) = history.append_pair(question, response.text.as_str()) {
            tracing::error!(error = %e, "History corrupted, starting a fresh conversation");
            *history = HistoryBuffer::new(self.config.max_pairs);
            return Err(e);
        }

        Ok(response.text)
    }

    /// Copy of the current history. Waits for any in-flight exchange.
    #[allow(dead_code)] // Used in tests
    pub async fn history(&self) -> Vec<Turn> {
        self.gate.lock().await.snapshot().cloned().collect()
    }

    /// Break the pairing of the gated history. Only for exercising the
    /// recovery path.
    #[cfg(test)]
    async fn corrupt_history(&self, turn: Turn) {
        self.gate.lock().await.push_unpaired(turn);
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, HistoryBuffer>, ChatError> {
        match self.config.gate_timeout {
            None => Ok(self.gate.lock().await),
            Some(limit) => timeout(limit, self.gate.lock())
                .await
                .map_err(|_| ChatError::Timeout {
                    waiting_for: "session",
                    after: limit,
                }),
        }
    }

    /// Roles as system entries, then history, then the new question.
    fn build_request(&self, history: &HistoryBuffer, question: &str) -> LlmRequest {
        let mut messages: Vec<LlmMessage> = self
            .list_roles()
            .into_iter()
            .filter(|(_, role)| !role.trim().is_empty())
            .map(|(_, role)| LlmMessage::system(role))
            .collect();
        messages.extend(history.snapshot().map(Turn::to_message));
        messages.push(LlmMessage::user(question));

        LlmRequest {
            messages,
            max_tokens: self.config.max_tokens,
        }
    }
}
