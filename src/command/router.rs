//! Dispatch of parsed commands to the session

use super::{parse, Command};
use crate::channel::{ChannelResult, ReplySink};
use crate::error::ChatError;
use crate::session::Session;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::Instrument;

const GREETING: &str = "반갑습니다.";
const PROGRESS_NOTICE: &str = "GPT에 질문 중...";
const ANSWER_PREFIX: &str = "GPT 응답: ";

pub struct CommandRouter {
    session: Arc<Session>,
}

impl CommandRouter {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Handle one inbound line, answering through `sink`.
    ///
    /// Returns `Ok(false)` when the line was not addressed to the bot. Every
    /// [`ChatError`] becomes a reply; only a failing sink is an error here.
    pub async fn handle_line(&self, line: &str, sink: &dyn ReplySink) -> ChannelResult<bool> {
        let Some(parsed) = parse(line) else {
            return Ok(false);
        };

        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("command", %request_id);

        async move {
            let outcome = match parsed {
                Ok(command) => {
                    tracing::info!(command = command.name(), "Handling command");
                    if let Command::Chat(question) = &command {
                        if !question.trim().is_empty() {
                            sink.reply(PROGRESS_NOTICE).await?;
                        }
                    }
                    self.execute(command).await
                }
                Err(e) => Err(e),
            };

            let text = outcome.unwrap_or_else(|e| {
                log_failure(&e);
                e.user_message()
            });
            sink.reply(&text).await?;
            Ok(true)
        }
        .instrument(span)
        .await
    }

    /// Run a command and render its reply text.
    pub async fn execute(&self, command: Command) -> Result<String, ChatError> {
        match command {
            Command::Greet => Ok(GREETING.to_string()),
            Command::Chat(question) => {
                let answer = self.session.run_exclusive(&question).await?;
                Ok(format!("{ANSWER_PREFIX}{answer}"))
            }
            Command::AddRole(role) => {
                let count = self.session.add_role(&role)?;
                tracing::info!(count, "Role added");
                Ok(format!("역할 '{}'이(가) 추가되었습니다.", role.trim()))
            }
            Command::RemoveRole(token) => {
                let removed = self.session.remove_role(&token)?;
                tracing::info!(role = %removed, "Role removed");
                Ok(format!("역할 '{removed}'이(가) 제거되었습니다."))
            }
            Command::ListRoles => Ok(render_roles(&self.session.list_roles())),
        }
    }
}

fn render_roles(roles: &[(usize, String)]) -> String {
    if roles.is_empty() {
        return "저장된 역할이 없습니다.".to_string();
    }
    let mut out = String::from("현재 역할 목록:");
    for (index, role) in roles {
        let _ = write!(out, "\n{index}. {role}");
    }
    out
}

fn log_failure(error: &ChatError) {
    if error.is_defect() {
        tracing::error!(error = %error, "Internal invariant violated");
        return;
    }
    match error {
        ChatError::CompletionFailed(_) | ChatError::Timeout { .. } => {
            tracing::warn!(error = %error, "Chat exchange failed");
        }
        _ => tracing::debug!(error = %error, "Rejected command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use crate::session::testing::MockLlmService;
    use crate::session::SessionConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn reply(&self, text: &str) -> ChannelResult<()> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn router() -> (CommandRouter, Arc<MockLlmService>) {
        let mock = Arc::new(MockLlmService::new());
        let session = Arc::new(Session::new(mock.clone(), SessionConfig::default()));
        (CommandRouter::new(session), mock)
    }

    async fn send(router: &CommandRouter, line: &str) -> Vec<String> {
        let sink = RecordingSink::default();
        assert!(router.handle_line(line, &sink).await.unwrap());
        sink.sent()
    }

    #[tokio::test]
    async fn test_ignores_plain_messages() {
        let (router, _) = router();
        let sink = RecordingSink::default();
        assert!(!router.handle_line("nice weather", &sink).await.unwrap());
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn test_greeting() {
        let (router, _) = router();
        assert_eq!(send(&router, "Hello there").await, vec!["반갑습니다."]);
    }

    #[tokio::test]
    async fn test_chat_sends_notice_then_answer() {
        let (router, mock) = router();
        mock.queue_text("42");
        assert_eq!(
            send(&router, "!gpt 질문 the answer?").await,
            vec!["GPT에 질문 중...", "GPT 응답: 42"]
        );
    }

    #[tokio::test]
    async fn test_empty_question_skips_notice() {
        let (router, mock) = router();
        assert_eq!(send(&router, "!gpt 질문").await, vec!["질문을 입력해주세요."]);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_completion_failure_reports_cause() {
        let (router, mock) = router();
        mock.queue_error(LlmError::from_status(401, "bad key"));
        let sent = send(&router, "!ask hi").await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "오류 발생: Authentication failed: bad key");
    }

    #[tokio::test]
    async fn test_role_lifecycle() {
        let (router, _) = router();
        assert_eq!(send(&router, "!gpt 역할확인").await, vec!["저장된 역할이 없습니다."]);
        assert_eq!(
            send(&router, "!gpt 역할추가 be concise").await,
            vec!["역할 'be concise'이(가) 추가되었습니다."]
        );
        send(&router, "!add-role speak Korean").await;
        assert_eq!(
            send(&router, "!list-roles").await,
            vec!["현재 역할 목록:\n1. be concise\n2. speak Korean"]
        );
        assert_eq!(
            send(&router, "!gpt 역할제거 1").await,
            vec!["역할 'be concise'이(가) 제거되었습니다."]
        );
        assert_eq!(
            send(&router, "!list-roles").await,
            vec!["현재 역할 목록:\n1. speak Korean"]
        );
    }

    #[tokio::test]
    async fn test_role_errors_become_replies() {
        let (router, _) = router();
        send(&router, "!add-role a").await;
        send(&router, "!add-role b").await;
        assert_eq!(send(&router, "!remove-role 0").await, vec!["올바른 번호를 입력해주세요."]);
        assert_eq!(send(&router, "!remove-role x").await, vec!["올바른 번호를 입력해주세요."]);
        assert_eq!(
            send(&router, "!remove-role 5").await,
            vec!["유효한 번호를 입력해주세요. (1-2)"]
        );
        assert_eq!(send(&router, "!add-role   ").await, vec!["추가할 역할을 입력해주세요."]);
    }

    #[tokio::test]
    async fn test_unknown_command_reply() {
        let (router, _) = router();
        assert_eq!(
            send(&router, "!dance").await,
            vec!["알 수 없는 명령어입니다: !dance"]
        );
    }

    #[test]
    fn test_render_roles() {
        assert_eq!(render_roles(&[]), "저장된 역할이 없습니다.");
        assert_eq!(
            render_roles(&[(1, "a".into()), (2, "b".into())]),
            "현재 역할 목록:\n1. a\n2. b"
        );
    }
}
