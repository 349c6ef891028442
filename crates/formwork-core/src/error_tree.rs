//! # Error Tree
//!
//! A tree mirroring a value's shape that carries validation messages at the
//! nodes where they occurred. Object fields are keyed children; array
//! elements live in a sparse `items` sequence where elements without errors
//! are `None`.
//!
//! ## Wire form
//!
//! Serializes as a JSON object whose keys are the field names, plus an
//! `error` key when the node itself failed and an `items` key (with `null`
//! holes) when any element failed:
//!
//! ```json
//! { "name": { "error": "Name is required" },
//!   "tags": { "items": [null, { "error": "too long" }] } }
//! ```

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::path::PathSegment;

/// Validation messages arranged in the shape of the validated value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTree {
    /// Message for this node, if it failed.
    pub error: Option<String>,
    /// Per-field subtrees.
    pub fields: BTreeMap<String, ErrorTree>,
    /// Per-element subtrees; `None` marks an element without errors.
    pub items: Vec<Option<ErrorTree>>,
}

impl ErrorTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree whose only message sits at the root.
    pub fn with_root_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// True when no node in the tree carries a message.
    pub fn is_empty(&self) -> bool {
        self.error.is_none()
            && self.fields.values().all(ErrorTree::is_empty)
            && self.items.iter().flatten().all(ErrorTree::is_empty)
    }

    pub fn field(&self, name: &str) -> Option<&ErrorTree> {
        self.fields.get(name)
    }

    pub fn item(&self, index: usize) -> Option<&ErrorTree> {
        self.items.get(index).and_then(Option::as_ref)
    }

    /// Look up the subtree at `path`, if one was created.
    pub fn get(&self, path: &[PathSegment]) -> Option<&ErrorTree> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::Key(k) => node.field(k),
            PathSegment::Index(i) => node.item(*i),
        })
    }

    /// The subtree at `path`, creating every missing intermediate node.
    pub fn entry_mut(&mut self, path: &[PathSegment]) -> &mut ErrorTree {
        path.iter().fold(self, |node, segment| match segment {
            PathSegment::Key(k) => node.fields.entry(k.clone()).or_default(),
            PathSegment::Index(i) => {
                if node.items.len() <= *i {
                    node.items.resize(*i + 1, None);
                }
                node.items[*i].get_or_insert_with(ErrorTree::default)
            }
        })
    }

    /// Record `message` unless this node already carries one.
    ///
    /// Returns whether the message was stored.
    pub fn set_error_once(&mut self, message: impl Into<String>) -> bool {
        if self.error.is_some() {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    /// Every `(path, message)` pair in the tree, depth-first, fields before items.
    pub fn messages(&self) -> Vec<(Vec<PathSegment>, String)> {
        let mut out = Vec::new();
        self.collect_messages(&mut Vec::new(), &mut out);
        out
    }

    fn collect_messages(
        &self,
        prefix: &mut Vec<PathSegment>,
        out: &mut Vec<(Vec<PathSegment>, String)>,
    ) {
        if let Some(message) = &self.error {
            out.push((prefix.clone(), message.clone()));
        }
        for (name, child) in &self.fields {
            prefix.push(PathSegment::Key(name.clone()));
            child.collect_messages(prefix, out);
            prefix.pop();
        }
        for (index, child) in self.items.iter().enumerate() {
            if let Some(child) = child {
                prefix.push(PathSegment::Index(index));
                child.collect_messages(prefix, out);
                prefix.pop();
            }
        }
    }

    /// Number of messages in the tree.
    pub fn message_count(&self) -> usize {
        usize::from(self.error.is_some())
            + self.fields.values().map(ErrorTree::message_count).sum::<usize>()
            + self
                .items
                .iter()
                .flatten()
                .map(ErrorTree::message_count)
                .sum::<usize>()
    }
}

impl Serialize for ErrorTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(error) = &self.error {
            map.serialize_entry("error", error)?;
        }
        if !self.items.is_empty() {
            map.serialize_entry("items", &self.items)?;
        }
        for (name, child) in &self.fields {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_mut_creates_intermediates() {
        let mut tree = ErrorTree::new();
        let path = vec![PathSegment::from("tags"), PathSegment::Index(2), PathSegment::from("label")];
        tree.entry_mut(&path).set_error_once("too long");
        let tags = tree.field("tags").unwrap();
        assert_eq!(tags.items.len(), 3);
        assert!(tags.item(0).is_none());
        assert_eq!(
            tree.get(&path).and_then(|t| t.error.as_deref()),
            Some("too long")
        );
    }

    #[test]
    fn test_first_message_wins() {
        let mut tree = ErrorTree::new();
        assert!(tree.entry_mut(&["name".into()]).set_error_once("first"));
        assert!(!tree.entry_mut(&["name".into()]).set_error_once("second"));
        assert_eq!(tree.field("name").unwrap().error.as_deref(), Some("first"));
        assert_eq!(tree.message_count(), 1);
    }

    #[test]
    fn test_serialize_shape() {
        let mut tree = ErrorTree::new();
        tree.entry_mut(&["name".into()]).set_error_once("Name is required");
        tree.entry_mut(&["tags".into(), PathSegment::Index(1)])
            .set_error_once("bad tag");
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            json!({
                "name": {"error": "Name is required"},
                "tags": {"items": [null, {"error": "bad tag"}]}
            })
        );
    }

    #[test]
    fn test_empty_and_messages() {
        let mut tree = ErrorTree::new();
        assert!(tree.is_empty());
        tree.entry_mut(&[]).set_error_once("root");
        tree.entry_mut(&["a".into(), "b".into()]).set_error_once("leaf");
        assert!(!tree.is_empty());
        let messages = tree.messages();
        assert_eq!(messages[0], (vec![], "root".to_string()));
        assert_eq!(messages[1].0, vec![PathSegment::from("a"), PathSegment::from("b")]);
    }
}
