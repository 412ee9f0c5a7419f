//! Inbound command parsing
//!
//! Turns one chat line into a closed [`Command`]. Lines that are not
//! addressed to the bot parse to `None` and are ignored.

mod router;

pub use router::CommandRouter;

use crate::error::ChatError;

/// Prefix for bot commands
pub const PREFIX: char = '!';
/// Command namespace (`!gpt <sub> ...`)
const NAMESPACE: &str = "gpt";
const GREETING_TRIGGER: &str = "Hello";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Greet,
    Chat(String),
    AddRole(String),
    RemoveRole(String),
    ListRoles,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Greet => "greet",
            Command::Chat(_) => "chat",
            Command::AddRole(_) => "add-role",
            Command::RemoveRole(_) => "remove-role",
            Command::ListRoles => "list-roles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Chat,
    AddRole,
    RemoveRole,
    ListRoles,
}

impl Kind {
    /// Korean subcommands plus English aliases
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "질문" | "ask" | "chat" => Some(Kind::Chat),
            "역할추가" | "add-role" => Some(Kind::AddRole),
            "역할제거" | "remove-role" => Some(Kind::RemoveRole),
            "역할확인" | "list-roles" => Some(Kind::ListRoles),
            _ => None,
        }
    }

    fn with_payload(self, payload: &str) -> Command {
        let payload = payload.trim().to_string();
        match self {
            Kind::Chat => Command::Chat(payload),
            Kind::AddRole => Command::AddRole(payload),
            Kind::RemoveRole => Command::RemoveRole(payload),
            Kind::ListRoles => Command::ListRoles,
        }
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => text.split_at(end),
        None => (text, ""),
    }
}

/// Parse one inbound line.
///
/// - `Hello…` greets.
/// - `!gpt <sub> <payload>` runs a subcommand; `!gpt <text>` with no known
///   subcommand is a chat.
/// - `!<sub> <payload>` is the short form; an unknown `<sub>` is an error.
/// - Anything else is not for the bot.
pub fn parse(line: &str) -> Option<Result<Command, ChatError>> {
    let line = line.trim();

    if line.starts_with(GREETING_TRIGGER) {
        return Some(Ok(Command::Greet));
    }

    let body = line.strip_prefix(PREFIX)?;
    if body.starts_with(char::is_whitespace) {
        return None;
    }
    let (word, rest) = split_word(body);
    if word.is_empty() {
        return None;
    }

    if word == NAMESPACE {
        let (sub, payload) = split_word(rest);
        let command = match Kind::from_word(sub) {
            Some(kind) => kind.with_payload(payload),
            None => Command::Chat(rest.trim().to_string()),
        };
        return Some(Ok(command));
    }

    Some(
        Kind::from_word(word)
            .map(|kind| kind.with_payload(rest))
            .ok_or_else(|| ChatError::UnknownCommand(format!("{PREFIX}{word}"))),
    )
}
