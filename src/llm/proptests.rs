//! Property-based tests for the `OpenAI` translation layer
//!
//! - Prompt order and roles survive translation
//! - Responses without usable text are rejected
//! - Text content is preserved through normalization

use super::openai::{test_helpers, OpenAIChoice, OpenAIMessage, OpenAIResponse, OpenAIUsage};
use super::types::{LlmMessage, LlmRequest, MessageRole};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![
        Just(MessageRole::System),
        Just(MessageRole::User),
        Just(MessageRole::Assistant),
    ]
}

fn arb_message() -> impl Strategy<Value = LlmMessage> {
    (arb_role(), "[a-zA-Z0-9 _.!?,가-힣]{0,80}").prop_map(|(role, text)| LlmMessage { role, text })
}

fn make_response(content: Option<String>, finish_reason: Option<String>) -> OpenAIResponse {
    OpenAIResponse {
        choices: vec![OpenAIChoice {
            message: OpenAIMessage {
                role: "assistant".to_string(),
                content,
            },
            finish_reason,
        }],
        usage: Some(OpenAIUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
        }),
    }
}

// ============================================================================
// Request translation
// ============================================================================

proptest! {
    /// N prompt entries → N wire messages, same order, same roles, same text
    #[test]
    fn prop_translate_preserves_prompt(
        messages in proptest::collection::vec(arb_message(), 0..12),
        max_tokens in proptest::option::of(1u32..4096),
    ) {
        let svc = test_helpers::service("gpt-4o");
        let request = LlmRequest { messages: messages.clone(), max_tokens };
        let wire = test_helpers::translate_request(&svc, &request);

        prop_assert_eq!(wire.messages.len(), messages.len());
        prop_assert_eq!(wire.max_tokens, max_tokens);
        for (orig, sent) in messages.iter().zip(wire.messages.iter()) {
            prop_assert_eq!(sent.role.as_str(), orig.role.as_str());
            prop_assert_eq!(sent.content.as_deref(), Some(orig.text.as_str()));
        }
    }

    /// Translated requests always serialize
    #[test]
    fn prop_translated_request_serializes(
        messages in proptest::collection::vec(arb_message(), 0..8),
    ) {
        let svc = test_helpers::service("gpt-4o");
        let wire = test_helpers::translate_request(&svc, &LlmRequest { messages, max_tokens: None });
        prop_assert!(serde_json::to_value(&wire).is_ok());
    }
}

// ============================================================================
// Response normalization
// ============================================================================

proptest! {
    /// Blank or missing content → Err
    #[test]
    fn prop_normalize_rejects_blank(
        blank in proptest::option::of("[ \t\n]{0,5}"),
        finish_reason in proptest::option::of("[a-z_]{3,10}"),
    ) {
        let result = test_helpers::normalize_response(make_response(blank, finish_reason));
        prop_assert!(result.is_err());
    }

    /// Non-blank content → Ok with the text unchanged
    #[test]
    fn prop_normalize_preserves_text(
        text in "[a-zA-Z0-9가-힣][a-zA-Z0-9 가-힣.!?]{0,100}",
    ) {
        let result = test_helpers::normalize_response(
            make_response(Some(text.clone()), Some("stop".to_string())),
        );
        prop_assert!(result.is_ok());
        prop_assert_eq!(result.unwrap().text, text);
    }

    /// Empty choices → Err regardless of usage
    #[test]
    fn prop_normalize_rejects_no_choices(prompt_tokens in 0u32..10_000) {
        let resp = OpenAIResponse {
            choices: vec![],
            usage: Some(OpenAIUsage { prompt_tokens, completion_tokens: 0 }),
        };
        prop_assert!(test_helpers::normalize_response(resp).is_err());
    }
}
