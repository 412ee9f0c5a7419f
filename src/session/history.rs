//! Bounded conversation history

use crate::error::ChatError;
use crate::llm::LlmMessage;

pub const DEFAULT_MAX_PAIRS: usize = 5;
/// Largest bound accepted from configuration
pub const MAX_PAIRS_LIMIT: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One message of the conversation. Fields are private so a turn can't be
/// edited after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    speaker: Speaker,
    text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    #[allow(dead_code)] // Used in tests
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn to_message(&self) -> LlmMessage {
        match self.speaker {
            Speaker::User => LlmMessage::user(&self.text),
            Speaker::Assistant => LlmMessage::assistant(&self.text),
        }
    }
}

/// User/assistant turns, oldest first, holding at most `max_pairs` pairs.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    turns: Vec<Turn>,
    max_pairs: usize,
}

#[cfg(test)]
impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAIRS)
    }
}

impl HistoryBuffer {
    pub fn new(max_pairs: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_pairs,
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record a completed exchange and trim to bound.
    ///
    /// Callers hold `&mut self`, so nobody can observe the question without
    /// its answer.
    pub fn append_pair(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), ChatError> {
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::assistant(answer));
        self.trim()
    }

    /// Drop whole pairs from the front until within bound.
    pub fn trim(&mut self) -> Result<(), ChatError> {
        self.check_paired()?;
        let limit = self.max_pairs.saturating_mul(2);
        if self.turns.len() > limit {
            let excess = self.turns.len() - limit;
            self.turns.drain(..excess);
        }
        Ok(())
    }

    /// Stable, read-only view of the turns, oldest first.
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = &Turn> + '_ {
        self.turns.iter()
    }

    fn check_paired(&self) -> Result<(), ChatError> {
        if self.turns.len() % 2 != 0 {
            return Err(ChatError::InvariantViolation(format!(
                "history holds {} turns, expected user/assistant pairs",
                self.turns.len()
            )));
        }
        for (i, pair) in self.turns.chunks_exact(2).enumerate() {
            if pair[0].speaker != Speaker::User || pair[1].speaker != Speaker::Assistant {
                return Err(ChatError::InvariantViolation(format!(
                    "history pair {i} is {:?}/{:?}",
                    pair[0].speaker, pair[1].speaker
                )));
            }
        }
        Ok(())
    }

    /// Push a single turn, bypassing pairing. Only for exercising the
    /// invariant guard.
    #[cfg(test)]
    pub(crate) fn push_unpaired(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}
