//! # Default Value Deriver
//!
//! Produces the initial value tree for a schema. `Ok(None)` stands for
//! "undefined": the slot stays absent in an object and becomes `null` inside
//! an array (JSON cannot express an absent array element).
//!
//! ## Resolution order for every node
//!
//! 1. A user-declared default on the node.
//! 2. The node's only allowed value (a literal or a single-member enum).
//! 3. Kind-specific derivation, using `options.primitives` for leaves and
//!    `options.arrays` for arrays.
//!
//! Open kinds (`any`, `unknown`, `never`, `void`, `undefined`, `nan`,
//! transforms, custom checks) always yield undefined. Unions, promises and
//! lazy references yield undefined as well; only a non-optional wrapper
//! with nothing derivable inside is an error.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use formwork_core::{ArrayPlan, DefaultOptions, NodeKind, PrimitiveStrategy, SchemaNode};

use crate::error::{DeriveError, SchemaPath};

/// Derive the initial value for `node`.
///
/// # Errors
///
/// Returns [`DeriveError::NonOptionalWithoutDefault`] when a non-optional
/// wrapper has no declared default and its inner node derives undefined.
pub fn derive_defaults(
    node: &SchemaNode,
    options: &DefaultOptions,
) -> Result<Option<Value>, DeriveError> {
    derive_at(node, options, 0, &SchemaPath::root())
}

fn derive_at(
    node: &SchemaNode,
    options: &DefaultOptions,
    depth: usize,
    path: &SchemaPath,
) -> Result<Option<Value>, DeriveError> {
    if let Some(default) = node.declared_default() {
        return Ok(Some(default.resolve()));
    }
    if let Some(value) = node.single_allowed_value() {
        return Ok(Some(value.clone()));
    }

    let strategy = options.primitives;
    let value = match node.kind() {
        NodeKind::String => primitive(strategy, || Value::String(String::new())),
        NodeKind::Number | NodeKind::Bigint => primitive(strategy, || Value::from(0)),
        NodeKind::Boolean => primitive(strategy, || Value::Bool(false)),
        NodeKind::Date => primitive(strategy, || {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
        }),
        NodeKind::Null => Some(Value::Null),
        NodeKind::Enum { values } => match values.first() {
            Some(first) => primitive(strategy, || first.clone()),
            None => None,
        },
        NodeKind::Record { .. } | NodeKind::Map { .. } => {
            primitive(strategy, || Value::Object(Map::new()))
        }
        NodeKind::Set { .. } => primitive(strategy, || Value::Array(Vec::new())),
        NodeKind::Symbol
        | NodeKind::Undefined
        | NodeKind::Void
        | NodeKind::Any
        | NodeKind::Unknown
        | NodeKind::Never
        | NodeKind::Nan
        | NodeKind::Literal { .. }
        | NodeKind::Transform(_)
        | NodeKind::Custom(_) => None,

        NodeKind::Object { shape } => {
            let mut map = Map::new();
            for (name, child) in shape {
                if let Some(value) = derive_at(child, options, depth, &path.field(name))? {
                    map.insert(name.clone(), value);
                }
            }
            Some(Value::Object(map))
        }
        NodeKind::Array { element, length } => match options.arrays.plan(depth) {
            ArrayPlan::Empty => Some(Value::Array(Vec::new())),
            ArrayPlan::Undefined => None,
            ArrayPlan::Null => Some(Value::Null),
            ArrayPlan::Populate(count) => {
                let count = length.unwrap_or(count);
                let element_path = path.element();
                let items = (0..count)
                    .map(|_| {
                        derive_at(element, options, depth + 1, &element_path)
                            .map(|v| v.unwrap_or(Value::Null))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(Value::Array(items))
            }
        },
        NodeKind::Tuple { items } => {
            let values = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    derive_at(item, options, depth, &path.step(&i.to_string()))
                        .map(|v| v.unwrap_or(Value::Null))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(Value::Array(values))
        }
        NodeKind::Union { discriminator, .. } => {
            match discriminator {
                None => tracing::warn!(
                    path = %path,
                    "union without discriminator has no derivable default"
                ),
                Some(field) => tracing::debug!(
                    path = %path,
                    discriminator = %field,
                    "discriminated union default requires a selected variant"
                ),
            }
            None
        }
        NodeKind::Intersection { left, right } => {
            let l = derive_at(left, options, depth, &path.step("left"))?;
            let r = derive_at(right, options, depth, &path.step("right"))?;
            match (l, r) {
                (Some(Value::Object(mut l)), Some(Value::Object(r))) => {
                    l.extend(r);
                    Some(Value::Object(l))
                }
                (l, r) => l.or(r),
            }
        }
        NodeKind::Pipe { input, .. } => derive_at(input, options, depth, path)?,
        NodeKind::Promise { .. } | NodeKind::Lazy(_) => None,
        NodeKind::Readonly { inner } | NodeKind::Catch { inner, .. } => {
            derive_at(inner, options, depth, path)?
        }
        NodeKind::Defaulted { value, .. } => Some(value.clone()),
        NodeKind::NonOptional { inner } => match derive_at(inner, options, depth, path)? {
            Some(value) => Some(value),
            None => {
                return Err(DeriveError::NonOptionalWithoutDefault {
                    path: path.to_string(),
                })
            }
        },
    };
    Ok(value)
}

fn primitive(strategy: PrimitiveStrategy, sensible: impl FnOnce() -> Value) -> Option<Value> {
    match strategy {
        PrimitiveStrategy::Sensible => Some(sensible()),
        PrimitiveStrategy::Undefined => None,
        PrimitiveStrategy::Null => Some(Value::Null),
    }
}
