//! User-facing error kinds
//!
//! Every variant is recovered at the command boundary and turned into a
//! short reply; none of them takes the process down.

use crate::llm::LlmError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Blank payload where content is required
    #[error("empty input for {0}")]
    EmptyInput(&'static str),

    /// Role-removal token is not a well-formed positive integer
    #[error("malformed index {0:?}")]
    MalformedInput(String),

    /// Well-formed index outside `1..=count`
    #[error("index {index} out of range (count {count})")]
    InvalidIndex { index: usize, count: usize },

    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("completion failed: {0}")]
    CompletionFailed(#[source] LlmError),

    /// Bounded wait on the session gate or the completion call elapsed
    #[error("timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        after: Duration,
    },

    /// Programming defect: internal state found inconsistent
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl ChatError {
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    /// Short reply shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput("question") => "질문을 입력해주세요.".to_string(),
            Self::EmptyInput("role") => "추가할 역할을 입력해주세요.".to_string(),
            Self::EmptyInput(what) => format!("내용을 입력해주세요. ({what})"),
            Self::MalformedInput(_) => "올바른 번호를 입력해주세요.".to_string(),
            Self::InvalidIndex { count: 0, .. } => "저장된 역할이 없습니다.".to_string(),
            Self::InvalidIndex { count, .. } => {
                format!("유효한 번호를 입력해주세요. (1-{count})")
            }
            Self::UnknownCommand(name) => format!("알 수 없는 명령어입니다: {name}"),
            Self::CompletionFailed(cause) => format!("오류 발생: {cause}"),
            Self::Timeout { after, .. } => {
                format!("응답 시간이 초과되었습니다. ({}초)", after.as_secs())
            }
            Self::InvariantViolation(_) => {
                "내부 오류가 발생했습니다. 관리자에게 문의해주세요.".to_string()
            }
        }
    }
}
