//! Property-based tests for the history buffer and role registry

use super::history::{HistoryBuffer, Speaker};
use super::roles::RoleRegistry;
use crate::error::ChatError;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum RoleOp {
    Add(String),
    Remove(usize),
}

fn arb_role_op() -> impl Strategy<Value = RoleOp> {
    prop_oneof![
        3 => "[a-z ]{0,12}".prop_map(RoleOp::Add),
        2 => (0usize..8).prop_map(RoleOp::Remove),
    ]
}

proptest! {
    /// After every append: bounded, even, oldest turn is a user turn
    #[test]
    fn prop_history_stays_bounded_and_paired(
        max_pairs in 0usize..8,
        pairs in proptest::collection::vec(("[a-z]{1,8}", "[a-z]{1,8}"), 0..30),
    ) {
        let mut history = HistoryBuffer::new(max_pairs);
        for (q, a) in &pairs {
            history.append_pair(q.as_str(), a.as_str()).unwrap();
            prop_assert!(history.len() <= 2 * max_pairs);
            prop_assert_eq!(history.len() % 2, 0);
            if let Some(front) = history.snapshot().next() {
                prop_assert_eq!(front.speaker(), Speaker::User);
            }
        }
    }

    /// The buffer always holds exactly the most recent pairs, in order
    #[test]
    fn prop_history_keeps_latest_pairs(
        max_pairs in 1usize..6,
        count in 0usize..20,
    ) {
        let mut history = HistoryBuffer::new(max_pairs);
        for i in 0..count {
            history.append_pair(format!("Q{i}"), format!("A{i}")).unwrap();
        }

        let kept = count.min(max_pairs);
        let expected: Vec<String> = (count - kept..count)
            .flat_map(|i| [format!("Q{i}"), format!("A{i}")])
            .collect();
        let actual: Vec<String> = history.snapshot().map(|t| t.text().to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Registry behaves like a plain Vec with 1-based removal
    #[test]
    fn prop_roles_match_vec_model(ops in proptest::collection::vec(arb_role_op(), 0..40)) {
        let mut registry = RoleRegistry::new();
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                RoleOp::Add(role) => {
                    let result = registry.add(&role);
                    if role.trim().is_empty() {
                        prop_assert!(matches!(result, Err(ChatError::EmptyInput(_))));
                    } else {
                        model.push(role.trim().to_string());
                        prop_assert_eq!(result.unwrap(), model.len());
                    }
                }
                RoleOp::Remove(index) => {
                    let result = registry.remove_at(&index.to_string());
                    if index == 0 {
                        prop_assert!(matches!(result, Err(ChatError::MalformedInput(_))));
                    } else if index > model.len() {
                        let is_invalid_index = matches!(result, Err(ChatError::InvalidIndex { .. }));
                        prop_assert!(is_invalid_index);
                    } else {
                        prop_assert_eq!(result.unwrap(), model.remove(index - 1));
                    }
                }
            }

            let listed: Vec<(usize, String)> =
                registry.list().map(|(i, r)| (i, r.to_string())).collect();
            let expected: Vec<(usize, String)> =
                model.iter().cloned().enumerate().map(|(i, r)| (i + 1, r)).collect();
            prop_assert_eq!(listed, expected);
        }
    }
}
