//! # Partial Schema Deriver
//!
//! Derives a relaxed sibling schema that accepts in-progress input: every
//! object field may be absent, nested objects relax recursively, and each
//! array element may itself be incomplete. Present values are still checked
//! against their original constraints.
//!
//! Derivation never mutates its input; every result is a fresh node.
//!
//! ## Unsupported kinds
//!
//! Tuples, records, maps, sets, intersections, promises, lazy references
//! and the readonly/defaulted/catch/non-optional wrappers have no partial
//! form, and neither does a union without a discriminator. Reaching one at
//! the root or as an array element returns an error naming the kind and its
//! location. As an object field such a node is simply made optional.

use std::collections::BTreeMap;

use formwork_core::{NodeKind, SchemaNode};

use crate::error::{DeriveError, SchemaPath};

/// Derive the partial form of `node`.
///
/// An array at the root derives to its partial element; callers validating
/// a root array against the result check each element separately.
pub fn derive_partial(node: &SchemaNode) -> Result<SchemaNode, DeriveError> {
    partial_at(node, &SchemaPath::root())
}

fn partial_at(node: &SchemaNode, path: &SchemaPath) -> Result<SchemaNode, DeriveError> {
    match node.kind() {
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
        | NodeKind::Custom(_) => Ok(node.clone().optional()),

        NodeKind::Object { shape } => {
            let mut relaxed = BTreeMap::new();
            for (name, field) in shape {
                relaxed.insert(name.clone(), partial_field(field, &path.field(name))?);
            }
            Ok(node.with_kind(NodeKind::Object { shape: relaxed }))
        }
        NodeKind::Array { element, .. } => partial_at(element, &path.element()),
        NodeKind::Union {
            variants,
            discriminator: Some(discriminator),
        } => {
            let mut relaxed = Vec::with_capacity(variants.len());
            for (index, variant) in variants.iter().enumerate() {
                let variant_path = path.step(&format!("variant {index}"));
                relaxed.push(keep_discriminator(
                    partial_at(variant, &variant_path)?,
                    variant,
                    discriminator,
                ));
            }
            let rebuilt = SchemaNode::discriminated_union(discriminator.clone(), relaxed)?;
            Ok(node.with_kind(rebuilt.into_kind()))
        }
        NodeKind::Union {
            discriminator: None,
            ..
        } => {
            tracing::warn!(path = %path, "union without discriminator has no partial form");
            Err(DeriveError::UndiscriminatedUnion {
                path: path.to_string(),
            })
        }
        NodeKind::Pipe { input, output } => {
            let input = partial_at(input, &path.step("input"))?;
            let output = partial_at(output, &path.step("output"))?;
            Ok(node.with_kind(NodeKind::Pipe {
                input: Box::new(input),
                output: Box::new(output),
            }))
        }
        NodeKind::Tuple { .. }
        | NodeKind::Record { .. }
        | NodeKind::Map { .. }
        | NodeKind::Set { .. }
        | NodeKind::Intersection { .. }
        | NodeKind::Promise { .. }
        | NodeKind::Lazy(_)
        | NodeKind::Readonly { .. }
        | NodeKind::Defaulted { .. }
        | NodeKind::Catch { .. }
        | NodeKind::NonOptional { .. } => {
            let kind = node.kind().name();
            tracing::warn!(path = %path, kind, "schema kind has no partial form");
            Err(DeriveError::PartialUnsupported {
                kind,
                path: path.to_string(),
            })
        }
    }
}

/// Relax one object field. Structural fields recurse; an array field stays
/// an array whose elements are partial.
fn partial_field(field: &SchemaNode, path: &SchemaPath) -> Result<SchemaNode, DeriveError> {
    if !field.kind().is_structural() {
        return Ok(field.clone().optional());
    }
    let relaxed = match field.kind() {
        NodeKind::Array { element, length } => field.with_kind(NodeKind::Array {
            element: Box::new(partial_at(element, &path.element())?),
            length: *length,
        }),
        _ => partial_at(field, path)?,
    };
    Ok(relaxed.optional())
}

/// Put the variant's original discriminator field back, so the literal that
/// routes validation stays required.
fn keep_discriminator(relaxed: SchemaNode, original: &SchemaNode, discriminator: &str) -> SchemaNode {
    let (Some(original_field), NodeKind::Object { shape }) = (
        original.shape().and_then(|shape| shape.get(discriminator)),
        relaxed.kind(),
    ) else {
        return relaxed;
    };
    let mut shape = shape.clone();
    shape.insert(discriminator.to_string(), original_field.clone());
    relaxed.with_kind(NodeKind::Object { shape })
}
