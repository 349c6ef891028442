//! # Meta-State Synchronization
//!
//! Re-walks a live value against its schema and reshapes the meta tree so
//! that every array's `items` length equals the live array's length. New
//! items are created pristine through the same creation path as the initial
//! tree; surplus items are truncated.
//!
//! Extra keys in the value that the schema never declared are skipped.
//! A value of the wrong type at an array position leaves the existing
//! `items` untouched.
//!
//! Synchronization is idempotent: a second pass over an unchanged value
//! reports no change and mutates nothing.

use serde_json::Value;

use formwork_core::{DefaultOptions, NodeKind, SchemaNode};

use crate::meta::{create_at, MetaNode};

/// Bring `meta` in line with `value`. Returns whether anything changed.
pub fn sync_meta_state(
    meta: &mut MetaNode,
    value: Option<&Value>,
    node: &SchemaNode,
    options: &DefaultOptions,
) -> bool {
    sync_at(meta, value, node, options, 0)
}

pub(crate) fn sync_at(
    meta: &mut MetaNode,
    value: Option<&Value>,
    node: &SchemaNode,
    options: &DefaultOptions,
    depth: usize,
) -> bool {
    match node.kind() {
        NodeKind::Object { shape } => {
            let Some(map) = value.and_then(Value::as_object) else {
                return false;
            };
            let mut changed = false;
            if !matches!(meta, MetaNode::Object { .. }) {
                *meta = MetaNode::Object {
                    flags: *meta.flags(),
                    fields: Default::default(),
                };
                changed = true;
            }
            let MetaNode::Object { fields, .. } = meta else {
                return changed;
            };
            let before = fields.len();
            fields.retain(|name, _| shape.contains_key(name));
            changed |= fields.len() != before;
            for (name, child_schema) in shape {
                let child = fields.entry(name.clone()).or_insert_with(|| {
                    changed = true;
                    create_at(child_schema, options, depth)
                });
                changed |= sync_at(child, map.get(name), child_schema, options, depth);
            }
            for key in map.keys().filter(|key| !shape.contains_key(*key)) {
                tracing::trace!(key = %key, "skipping key not declared by the schema");
            }
            changed
        }
        NodeKind::Array { element, .. } => {
            let Some(values) = value.and_then(Value::as_array) else {
                return false;
            };
            let mut changed = false;
            if !matches!(meta, MetaNode::Array { .. }) {
                *meta = MetaNode::Array {
                    flags: *meta.flags(),
                    items: Vec::new(),
                };
                changed = true;
            }
            let MetaNode::Array { items, .. } = meta else {
                return changed;
            };
            if items.len() < values.len() {
                tracing::trace!(from = items.len(), to = values.len(), "growing meta items");
                let missing = values.len() - items.len();
                items.extend((0..missing).map(|_| create_at(element, options, depth + 1)));
                changed = true;
            } else if items.len() > values.len() {
                tracing::trace!(from = items.len(), to = values.len(), "truncating meta items");
                items.truncate(values.len());
                changed = true;
            }
            for (item, item_value) in items.iter_mut().zip(values) {
                changed |= sync_at(item, Some(item_value), element, options, depth + 1);
            }
            changed
        }
        NodeKind::Union { .. } => match value.and_then(|v| node.resolve_variant(v)) {
            Some(variant) => sync_at(meta, value, variant, options, depth),
            None => false,
        },
        NodeKind::Lazy(lazy) => match value {
            Some(Value::Object(_) | Value::Array(_)) => {
                let resolved = lazy.resolve();
                sync_at(meta, value, &resolved, options, depth)
            }
            _ => false,
        },
        NodeKind::Pipe { input, .. } => sync_at(meta, value, input, options, depth),
        NodeKind::Readonly { inner }
        | NodeKind::Catch { inner, .. }
        | NodeKind::Defaulted { inner, .. }
        | NodeKind::NonOptional { inner } => sync_at(meta, value, inner, options, depth),
        NodeKind::String
        | NodeKind::Number
        | NodeKind::Bigint
        | NodeKind::Boolean
        | NodeKind::Date
        | NodeKind::Symbol
        | NodeKind::Null
        | NodeKind::Undefined
        | NodeKind::Void
        | NodeKind::Any
        | NodeKind::Unknown
        | NodeKind::Never
        | NodeKind::Nan
        | NodeKind::Literal { .. }
        | NodeKind::Enum { .. }
        | NodeKind::Transform(_)
        | NodeKind::Custom(_)
        | NodeKind::Tuple { .. }
        | NodeKind::Record { .. }
        | NodeKind::Map { .. }
        | NodeKind::Set { .. }
        | NodeKind::Intersection { .. }
        | NodeKind::Promise { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::create_meta_state;
    use formwork_core::PathSegment;
    use serde_json::json;

    fn tags_schema() -> SchemaNode {
        SchemaNode::object([
            ("name", SchemaNode::string()),
            (
                "tags",
                SchemaNode::array(SchemaNode::object([("label", SchemaNode::string())])),
            ),
        ])
    }

    #[test]
    fn test_grow_and_truncate() {
        let schema = tags_schema();
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        assert_eq!(meta.field("tags").unwrap().items().unwrap().len(), 0);

        let value = json!({"name": "a", "tags": [{"label": "x"}, {"label": "y"}, {"label": "z"}]});
        assert!(sync_meta_state(&mut meta, Some(&value), &schema, &opts));
        let tags = meta.field("tags").unwrap();
        assert_eq!(tags.items().unwrap().len(), 3);
        assert!(tags.item(2).unwrap().field("label").is_some());

        let shorter = json!({"name": "a", "tags": [{"label": "x"}]});
        assert!(sync_meta_state(&mut meta, Some(&shorter), &schema, &opts));
        assert_eq!(meta.field("tags").unwrap().items().unwrap().len(), 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let schema = tags_schema();
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        let value = json!({"name": "a", "tags": [{"label": "x"}, {"label": "y"}]});
        assert!(sync_meta_state(&mut meta, Some(&value), &schema, &opts));
        let snapshot = meta.clone();
        assert!(!sync_meta_state(&mut meta, Some(&value), &schema, &opts));
        assert_eq!(meta, snapshot);
    }

    #[test]
    fn test_existing_item_flags_survive_growth() {
        let schema = tags_schema();
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        sync_meta_state(&mut meta, Some(&json!({"tags": [{"label": "x"}]})), &schema, &opts);
        meta.touch(&["tags".into(), PathSegment::Index(0)]);
        sync_meta_state(
            &mut meta,
            Some(&json!({"tags": [{"label": "x"}, {"label": "y"}]})),
            &schema,
            &opts,
        );
        let tags = meta.field("tags").unwrap();
        assert!(tags.item(0).unwrap().is_touched());
        assert!(!tags.item(1).unwrap().is_touched());
    }

    #[test]
    fn test_unknown_keys_and_wrong_types_are_tolerated() {
        let schema = tags_schema();
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        sync_meta_state(&mut meta, Some(&json!({"tags": [{"label": "x"}]})), &schema, &opts);
        let snapshot = meta.clone();
        let odd = json!({"extra": 1, "tags": "not-an-array"});
        assert!(!sync_meta_state(&mut meta, Some(&odd), &schema, &opts));
        assert_eq!(meta, snapshot);
        assert!(meta.field("extra").is_none());
    }

    #[test]
    fn test_discriminated_union_reshapes_by_variant() {
        let union = SchemaNode::discriminated_union(
            "type",
            vec![
                SchemaNode::object([
                    ("type", SchemaNode::literal("text")),
                    ("content", SchemaNode::string()),
                ]),
                SchemaNode::object([
                    ("type", SchemaNode::literal("list")),
                    ("entries", SchemaNode::array(SchemaNode::string())),
                ]),
            ],
        )
        .unwrap();
        let schema = SchemaNode::object([("message", union)]);
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        assert!(meta.field("message").unwrap().field("content").is_none());

        let text = json!({"message": {"type": "text", "content": "hi"}});
        assert!(sync_meta_state(&mut meta, Some(&text), &schema, &opts));
        assert!(meta.field("message").unwrap().field("content").is_some());

        let list = json!({"message": {"type": "list", "entries": ["a", "b"]}});
        assert!(sync_meta_state(&mut meta, Some(&list), &schema, &opts));
        let message = meta.field("message").unwrap();
        assert!(message.field("content").is_none());
        assert_eq!(message.field("entries").unwrap().items().unwrap().len(), 2);
    }

    #[test]
    fn test_lazy_schema_resolves_against_value() {
        fn tree() -> SchemaNode {
            SchemaNode::object([("children", SchemaNode::array(SchemaNode::lazy(tree)))])
        }
        let schema = tree();
        let opts = DefaultOptions::default();
        let mut meta = create_meta_state(&schema, &opts);
        let value = json!({"children": [{"children": [{"children": []}]}]});
        sync_meta_state(&mut meta, Some(&value), &schema, &opts);
        let grandchild = meta.node_at(&[
            "children".into(),
            PathSegment::Index(0),
            "children".into(),
            PathSegment::Index(0),
        ]);
        assert!(grandchild.is_some());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::meta::create_meta_state;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn items_track_array_length(lengths in prop::collection::vec(0usize..6, 1..6)) {
            let schema = SchemaNode::object([(
                "rows",
                SchemaNode::array(SchemaNode::array(SchemaNode::number())),
            )]);
            let opts = DefaultOptions::default();
            let mut meta = create_meta_state(&schema, &opts);
            for len in lengths {
                let rows: Vec<Value> = (0..len).map(|i| json!(vec![0; i])).collect();
                let value = json!({"rows": rows});
                sync_meta_state(&mut meta, Some(&value), &schema, &opts);
                let items = meta.field("rows").unwrap().items().unwrap();
                prop_assert_eq!(items.len(), len);
                for (i, row) in items.iter().enumerate() {
                    prop_assert_eq!(row.items().unwrap().len(), i);
                }
                prop_assert!(!sync_meta_state(&mut meta, Some(&value), &schema, &opts));
            }
        }
    }
}
