//! # Dirty-State Recomputation
//!
//! A full bottom-up pass comparing the live value with its initial
//! snapshot. A leaf is dirty iff it is not deep-equal to its snapshot; a
//! container is dirty iff any descendant is dirty or the container itself
//! differs (covering length and key-set changes the meta tree cannot see).

use serde_json::Value;

use formwork_core::deep_equal;

use crate::meta::MetaNode;

/// Recompute `dirty` on every node. Returns the root's dirty flag.
pub fn update_dirty_state(
    meta: &mut MetaNode,
    current: Option<&Value>,
    initial: Option<&Value>,
) -> bool {
    let descendant_dirty = match meta {
        MetaNode::Leaf(_) => false,
        MetaNode::Object { fields, .. } => {
            let mut any = false;
            for (name, child) in fields.iter_mut() {
                any |= update_dirty_state(child, field_of(current, name), field_of(initial, name));
            }
            any
        }
        MetaNode::Array { items, .. } => {
            let mut any = false;
            for (index, child) in items.iter_mut().enumerate() {
                any |= update_dirty_state(child, item_of(current, index), item_of(initial, index));
            }
            any
        }
    };
    let dirty = descendant_dirty || !deep_equal(current, initial);
    meta.flags_mut().dirty = dirty;
    dirty
}

fn field_of<'a>(value: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    value.and_then(Value::as_object).and_then(|map| map.get(name))
}

fn item_of(value: Option<&Value>, index: usize) -> Option<&Value> {
    value.and_then(Value::as_array).and_then(|items| items.get(index))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::meta::create_meta_state;
    use formwork_core::{DefaultOptions, SchemaNode};
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn root_dirty_iff_any_leaf_differs(
            a0 in "[a-c]{0,2}", b0 in 0i64..3,
            a1 in "[a-c]{0,2}", b1 in 0i64..3,
        ) {
            let schema = SchemaNode::object([("a", SchemaNode::string()), ("b", SchemaNode::number())]);
            let mut meta = create_meta_state(&schema, &DefaultOptions::default());
            let initial = json!({"a": &a0, "b": b0});
            let current = json!({"a": &a1, "b": b1});
            let dirty = update_dirty_state(&mut meta, Some(&current), Some(&initial));
            prop_assert_eq!(meta.field("a").unwrap().is_dirty(), a0 != a1);
            prop_assert_eq!(meta.field("b").unwrap().is_dirty(), b0 != b1);
            prop_assert_eq!(dirty, a0 != a1 || b0 != b1);
        }
    }
}
