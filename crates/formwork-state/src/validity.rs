//! # Validity Recomputation
//!
//! Applies an error tree to the meta tree. Every `valid` flag is reset to
//! true first; a node is then flipped to invalid exactly when the error tree
//! carries a message at the matching position. Array item errors match by
//! index. Invalidity does not propagate to ancestors.

use formwork_core::ErrorTree;

use crate::meta::MetaNode;

/// Reset every `valid` flag, then mark the nodes `errors` names as invalid.
pub fn update_validation_state(meta: &mut MetaNode, errors: Option<&ErrorTree>) {
    meta.for_each_mut(&mut |flags| flags.valid = true);
    if let Some(errors) = errors {
        apply(meta, errors);
    }
}

fn apply(meta: &mut MetaNode, errors: &ErrorTree) {
    if errors.error.is_some() {
        meta.flags_mut().valid = false;
    }
    match meta {
        MetaNode::Leaf(_) => {}
        MetaNode::Object { fields, .. } => {
            for (name, sub) in &errors.fields {
                if let Some(child) = fields.get_mut(name) {
                    apply(child, sub);
                }
            }
        }
        MetaNode::Array { items, .. } => {
            for (index, sub) in errors.items.iter().enumerate() {
                if let (Some(child), Some(sub)) = (items.get_mut(index), sub) {
                    apply(child, sub);
                }
            }
        }
    }
}
