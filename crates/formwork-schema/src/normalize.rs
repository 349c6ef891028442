//! # Error Normalizer
//!
//! Folds a flat list of path-addressed issues into an [`ErrorTree`] shaped
//! like the validated value. An empty path sets the root message; any other
//! path creates the intermediate nodes it passes through (object fields for
//! keys, `items` slots for indices) and sets the message at its last
//! segment. When several issues target one node, the first one wins.

use formwork_core::{ErrorTree, Issue, PathSegment};

/// Fold `issues` into an error tree, keeping the first message per node.
pub fn normalize_issues(issues: &[Issue]) -> ErrorTree {
    let mut tree = ErrorTree::new();
    fold_into(&mut tree, &[], issues);
    tree
}

/// Fold `issues` into `tree` beneath `prefix`.
///
/// Used when one logical validation runs in pieces, such as per-element
/// partial validation of a root array.
pub fn fold_into(tree: &mut ErrorTree, prefix: &[PathSegment], issues: &[Issue]) {
    for issue in issues {
        let node = tree.entry_mut(prefix).entry_mut(&issue.path);
        if !node.set_error_once(issue.message.as_str()) {
            tracing::trace!(issue = %issue, "dropping later issue for the same node");
        }
    }
}
