//! Ordered registry of system roles

use crate::error::ChatError;
use regex::Regex;
use std::sync::LazyLock;

/// One or more digits, first digit non-zero, nothing else
static INDEX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*$").expect("valid index regex"));

/// Roles in insertion order. Duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: Vec<String>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a role, returning the new count.
    pub fn add(&mut self, role: &str) -> Result<usize, ChatError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ChatError::EmptyInput("role"));
        }
        self.roles.push(role.to_string());
        Ok(self.roles.len())
    }

    /// Roles with their 1-based index. Borrowing, so calling it again
    /// restarts from the first role.
    pub fn list(&self) -> impl ExactSizeIterator<Item = (usize, &str)> + '_ {
        self.roles
            .iter()
            .enumerate()
            .map(|(i, role)| (i + 1, role.as_str()))
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Remove by a user-supplied 1-based index token such as `"2"`.
    pub fn remove_at(&mut self, token: &str) -> Result<String, ChatError> {
        let index = parse_index(token)?;
        self.remove_index(index)
    }

    /// Remove by 1-based index. Later roles shift down by one.
    pub fn remove_index(&mut self, index: usize) -> Result<String, ChatError> {
        if index == 0 || index > self.roles.len() {
            return Err(ChatError::InvalidIndex {
                index,
                count: self.roles.len(),
            });
        }
        Ok(self.roles.remove(index - 1))
    }
}

/// Strictly parse a positive 1-based index. Digits that overflow `usize` are
/// still well-formed and come back as `usize::MAX`, which is never in range.
pub fn parse_index(token: &str) -> Result<usize, ChatError> {
    let token = token.trim();
    if !INDEX_TOKEN.is_match(token) {
        return Err(ChatError::MalformedInput(token.to_string()));
    }
    Ok(token.parse::<usize>().unwrap_or(usize::MAX))
}
