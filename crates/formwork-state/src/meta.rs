//! # Meta-State Tree
//!
//! A tree of bookkeeping flags that mirrors a value tree node for node.
//! Every node carries [`MetaFlags`]; object nodes carry their fields and
//! array nodes carry an `items` sequence whose length tracks the live array.
//!
//! ## Creation
//!
//! [`create_meta_state`] walks a schema the same way the default deriver
//! does: objects recurse without consuming depth, arrays consult the
//! [`ArrayStrategy`](formwork_core::ArrayStrategy) plan for their depth and
//! pre-create one item per populated element, or the node's fixed length
//! when it declares one. A node with a declared default object or array is
//! then synced against that default. The initial `items` lengths therefore
//! match the derived default value.
//!
//! Kinds without a fixed shape (unions, lazy references, leaves) start as
//! leaves; [`sync_meta_state`](crate::sync::sync_meta_state) reshapes them
//! once a live value reveals their structure.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use formwork_core::{ArrayPlan, DefaultOptions, NodeKind, PathSegment, SchemaNode};

use crate::sync::sync_at;

/// Per-node bookkeeping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaFlags {
    /// The value differs from its initial snapshot.
    pub dirty: bool,
    /// The last validation reported no error at this node.
    pub valid: bool,
    /// The user has interacted with this node.
    pub touched: bool,
    /// A validation cycle is in flight.
    pub validating: bool,
}

impl Default for MetaFlags {
    fn default() -> Self {
        Self {
            dirty: false,
            valid: true,
            touched: false,
            validating: false,
        }
    }
}

/// One node of the meta-state tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaNode {
    Leaf(MetaFlags),
    Object {
        flags: MetaFlags,
        fields: BTreeMap<String, MetaNode>,
    },
    Array {
        flags: MetaFlags,
        items: Vec<MetaNode>,
    },
}

impl Default for MetaNode {
    fn default() -> Self {
        Self::Leaf(MetaFlags::default())
    }
}

impl MetaNode {
    pub fn flags(&self) -> &MetaFlags {
        match self {
            Self::Leaf(flags) | Self::Object { flags, .. } | Self::Array { flags, .. } => flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut MetaFlags {
        match self {
            Self::Leaf(flags) | Self::Object { flags, .. } | Self::Array { flags, .. } => flags,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.flags().dirty
    }

    pub fn is_valid(&self) -> bool {
        self.flags().valid
    }

    pub fn is_touched(&self) -> bool {
        self.flags().touched
    }

    pub fn is_validating(&self) -> bool {
        self.flags().validating
    }

    pub fn field(&self, name: &str) -> Option<&MetaNode> {
        match self {
            Self::Object { fields, .. } => fields.get(name),
            Self::Leaf(_) | Self::Array { .. } => None,
        }
    }

    pub fn item(&self, index: usize) -> Option<&MetaNode> {
        self.items().and_then(|items| items.get(index))
    }

    /// The `items` sequence of an array node.
    pub fn items(&self) -> Option<&[MetaNode]> {
        match self {
            Self::Array { items, .. } => Some(items),
            Self::Leaf(_) | Self::Object { .. } => None,
        }
    }

    pub fn node_at(&self, path: &[PathSegment]) -> Option<&MetaNode> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::Key(k) => node.field(k),
            PathSegment::Index(i) => node.item(*i),
        })
    }

    pub fn node_at_mut(&mut self, path: &[PathSegment]) -> Option<&mut MetaNode> {
        path.iter().try_fold(self, |node, segment| match (node, segment) {
            (Self::Object { fields, .. }, PathSegment::Key(k)) => fields.get_mut(k),
            (Self::Array { items, .. }, PathSegment::Index(i)) => items.get_mut(*i),
            _ => None,
        })
    }

    /// Mark the node at `path` touched. Returns `false` if no such node exists.
    pub fn touch(&mut self, path: &[PathSegment]) -> bool {
        match self.node_at_mut(path) {
            Some(node) => {
                node.flags_mut().touched = true;
                true
            }
            None => false,
        }
    }

    /// Clear `touched` on every node.
    pub fn reset_touched(&mut self) {
        self.for_each_mut(&mut |flags| flags.touched = false);
    }

    /// Set `validating` on every node.
    pub fn set_validating(&mut self, validating: bool) {
        self.for_each_mut(&mut |flags| flags.validating = validating);
    }

    /// Visit the flags of every node, parents before children.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut MetaFlags)) {
        match self {
            Self::Leaf(flags) => f(flags),
            Self::Object { flags, fields } => {
                f(flags);
                fields.values_mut().for_each(|child| child.for_each_mut(f));
            }
            Self::Array { flags, items } => {
                f(flags);
                items.iter_mut().for_each(|child| child.for_each_mut(f));
            }
        }
    }
}

impl Serialize for MetaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flags = self.flags();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("$dirty", &flags.dirty)?;
        map.serialize_entry("$valid", &flags.valid)?;
        map.serialize_entry("$touched", &flags.touched)?;
        map.serialize_entry("$validating", &flags.validating)?;
        match self {
            Self::Leaf(_) => {}
            Self::Object { fields, .. } => {
                for (name, child) in fields {
                    map.serialize_entry(name, child)?;
                }
            }
            Self::Array { items, .. } => map.serialize_entry("items", items)?,
        }
        map.end()
    }
}

// ─── Creation ───────────────────────────────────────────────────────

/// Build the initial meta tree for `node`, with every flag pristine.
pub fn create_meta_state(node: &SchemaNode, options: &DefaultOptions) -> MetaNode {
    create_at(node, options, 0)
}

pub(crate) fn create_at(node: &SchemaNode, options: &DefaultOptions, depth: usize) -> MetaNode {
    let mut meta = create_shape(node, options, depth);
    let declared = match node.kind() {
        NodeKind::Defaulted { value, .. } => Some(value.clone()),
        _ => node.declared_default().map(|default| default.resolve()),
    };
    if let Some(value) = declared.filter(|value| value.is_object() || value.is_array()) {
        tracing::trace!(kind = %node.kind(), depth, "seeding meta tree from declared default");
        sync_at(&mut meta, Some(&value), node, options, depth);
    }
    meta
}

fn create_shape(node: &SchemaNode, options: &DefaultOptions, depth: usize) -> MetaNode {
    match node.kind() {
        NodeKind::Object { shape } => MetaNode::Object {
            flags: MetaFlags::default(),
            fields: shape
                .iter()
                .map(|(name, child)| (name.clone(), create_at(child, options, depth)))
                .collect(),
        },
        NodeKind::Array { element, length } => {
            let items = match options.arrays.plan(depth) {
                ArrayPlan::Populate(count) => (0..length.unwrap_or(count))
                    .map(|_| create_at(element, options, depth + 1))
                    .collect(),
                ArrayPlan::Empty | ArrayPlan::Undefined | ArrayPlan::Null => Vec::new(),
            };
            MetaNode::Array {
                flags: MetaFlags::default(),
                items,
            }
        }
        NodeKind::Pipe { input, .. } => create_at(input, options, depth),
        NodeKind::Readonly { inner }
        | NodeKind::Catch { inner, .. }
        | NodeKind::Defaulted { inner, .. }
        | NodeKind::NonOptional { inner } => create_at(inner, options, depth),
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
        | NodeKind::Union { .. }
        | NodeKind::Tuple { .. }
        | NodeKind::Record { .. }
        | NodeKind::Map { .. }
        | NodeKind::Set { .. }
        | NodeKind::Intersection { .. }
        | NodeKind::Promise { .. }
        | NodeKind::Lazy(_) => MetaNode::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_core::{ArrayMethod, ArrayStrategy, DepthPolicy, StructuredArrays};
    use serde_json::json;

    fn populate(length: usize, max: Option<usize>) -> DefaultOptions {
        DefaultOptions {
            arrays: ArrayStrategy::Structured(StructuredArrays {
                method: ArrayMethod::Populate,
                length: Some(length),
                depth: max.map(|max| DepthPolicy {
                    max: Some(max),
                    layers: None,
                    fallback: None,
                }),
            }),
            ..DefaultOptions::default()
        }
    }

    #[test]
    fn test_object_mirrors_shape() {
        let schema = SchemaNode::object([
            ("name", SchemaNode::string()),
            ("address", SchemaNode::object([("city", SchemaNode::string())])),
        ]);
        let meta = create_meta_state(&schema, &DefaultOptions::default());
        assert!(meta.field("name").is_some());
        assert!(meta.node_at(&["address".into(), "city".into()]).is_some());
        assert_eq!(*meta.flags(), MetaFlags::default());
    }

    #[test]
    fn test_array_items_follow_plan() {
        let schema = SchemaNode::array(SchemaNode::array(SchemaNode::string()));
        let meta = create_meta_state(&schema, &populate(2, Some(1)));
        let items = meta.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].items().unwrap().len(), 0);

        let empty = create_meta_state(&schema, &DefaultOptions::default());
        assert!(empty.items().unwrap().is_empty());
    }

    #[test]
    fn test_fixed_length_overrides_populate_count() {
        let schema = SchemaNode::array_of_length(SchemaNode::number(), 3);
        let options = DefaultOptions {
            arrays: ArrayStrategy::Flat(ArrayMethod::Populate),
            ..DefaultOptions::default()
        };
        let meta = create_meta_state(&schema, &options);
        assert_eq!(meta.items().map(<[_]>::len), Some(3));

        let empty = create_meta_state(&schema, &DefaultOptions::default());
        assert_eq!(empty.items().map(<[_]>::len), Some(0));
    }

    #[test]
    fn test_declared_default_sizes_items() {
        let schema = SchemaNode::object([
            ("tags", SchemaNode::array(SchemaNode::string()).with_default(json!(["a", "b"]))),
            (
                "grid",
                SchemaNode::defaulted(
                    SchemaNode::array(SchemaNode::array(SchemaNode::number())),
                    json!([[1, 2, 3]]),
                ),
            ),
        ]);
        let meta = create_meta_state(&schema, &DefaultOptions::default());
        assert_eq!(meta.field("tags").and_then(MetaNode::items).map(<[_]>::len), Some(2));
        let grid = meta.field("grid").and_then(MetaNode::items).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0].items().map(<[_]>::len), Some(3));
        assert_eq!(*meta.flags(), MetaFlags::default());
    }

    #[test]
    fn test_touch_and_reset() {
        let schema = SchemaNode::object([("tags", SchemaNode::array(SchemaNode::string()))]);
        let mut meta = create_meta_state(&schema, &populate(1, None));
        assert!(meta.touch(&["tags".into(), PathSegment::Index(0)]));
        assert!(meta.node_at(&["tags".into(), PathSegment::Index(0)]).unwrap().is_touched());
        assert!(!meta.touch(&["missing".into()]));
        meta.reset_touched();
        assert!(!meta.node_at(&["tags".into(), PathSegment::Index(0)]).unwrap().is_touched());
    }

    #[test]
    fn test_serialize_flags_and_items() {
        let schema = SchemaNode::object([("tags", SchemaNode::array(SchemaNode::string()))]);
        let meta = create_meta_state(&schema, &populate(1, None));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["$valid"], json!(true));
        assert_eq!(json["tags"]["items"][0]["$dirty"], json!(false));
    }
}
