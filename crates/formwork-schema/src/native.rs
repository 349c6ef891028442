//! # Native Validator
//!
//! Walks a [`SchemaNode`] against a value, evaluating declared checks,
//! applying transforms, pipes and wrapper semantics, and collecting every
//! failure as a path-addressed [`Issue`]. On success the parsed value is
//! returned: declared defaults are filled in for absent fields, transforms
//! are applied, and keys the schema does not declare are stripped.
//!
//! Check messages default to generated text; a message attached to the
//! check (or to the node, for type mismatches) replaces it.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use formwork_core::{
    json_type_name, values_equal, Check, Constraint, Issue, NodeKind, PathSegment, SchemaNode,
};

use crate::adapter::{ParseOutcome, Schema, SchemaAdapter, SchemaBody, NATIVE_VENDOR};
use crate::error::{DeriveError, ValidationError};

/// Validate `value` against `node`.
///
/// # Errors
///
/// Returns every issue found, in traversal order.
pub fn parse_native(node: &SchemaNode, value: &Value) -> Result<Value, Vec<Issue>> {
    let mut run = NativeRun::default();
    let parsed = run.check(node, Some(value));
    if run.issues.is_empty() {
        Ok(parsed.unwrap_or(Value::Null))
    } else {
        Err(run.issues)
    }
}

#[derive(Default)]
struct NativeRun {
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
}

impl NativeRun {
    fn report(&mut self, message: impl Into<String>) {
        self.issues.push(Issue::new(self.path.clone(), message));
    }

    fn at<T>(&mut self, segment: PathSegment, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    /// The present value, or a "Required" issue.
    fn present<'v>(&mut self, node: &SchemaNode, value: Option<&'v Value>) -> Option<&'v Value> {
        if value.is_none() {
            self.report(node.type_message().unwrap_or("Required"));
        }
        value
    }

    fn mismatch(&mut self, node: &SchemaNode, expected: &str, received: &Value) {
        let message = match node.type_message() {
            Some(message) => message.to_string(),
            None => format!("Expected {expected}, received {}", json_type_name(received)),
        };
        self.report(message);
    }

    fn check(&mut self, node: &SchemaNode, value: Option<&Value>) -> Option<Value> {
        if value.is_none() {
            if let Some(default) = node.declared_default() {
                return Some(default.resolve());
            }
            if node.is_optional() && !matches!(node.kind(), NodeKind::NonOptional { .. }) {
                return None;
            }
        }
        if node.is_nullable() && matches!(value, Some(Value::Null)) {
            return Some(Value::Null);
        }

        match node.kind() {
            NodeKind::String => {
                let v = self.present(node, value)?;
                let Some(s) = v.as_str() else {
                    self.mismatch(node, "string", v);
                    return None;
                };
                self.run_checks(node.checks(), v);
                Some(Value::String(s.to_string()))
            }
            NodeKind::Number => {
                let v = self.present(node, value)?;
                if !v.is_number() {
                    self.mismatch(node, "number", v);
                    return None;
                }
                self.run_checks(node.checks(), v);
                Some(v.clone())
            }
            NodeKind::Bigint => {
                let v = self.present(node, value)?;
                if !(v.is_i64() || v.is_u64()) {
                    self.mismatch(node, "bigint", v);
                    return None;
                }
                self.run_checks(node.checks(), v);
                Some(v.clone())
            }
            NodeKind::Boolean => {
                let v = self.present(node, value)?;
                if !v.is_boolean() {
                    self.mismatch(node, "boolean", v);
                    return None;
                }
                Some(v.clone())
            }
            NodeKind::Date => {
                let v = self.present(node, value)?;
                match v.as_str() {
                    Some(s) if is_date(s) => Some(v.clone()),
                    Some(_) => {
                        self.report(node.type_message().unwrap_or("Invalid date"));
                        None
                    }
                    None => {
                        self.mismatch(node, "date", v);
                        None
                    }
                }
            }
            NodeKind::Symbol | NodeKind::Nan => {
                let v = self.present(node, value)?;
                self.mismatch(node, node.kind().name(), v);
                None
            }
            NodeKind::Null => {
                let v = self.present(node, value)?;
                if !v.is_null() {
                    self.mismatch(node, "null", v);
                }
                Some(Value::Null)
            }
            NodeKind::Undefined | NodeKind::Void => {
                if let Some(v) = value {
                    self.mismatch(node, "undefined", v);
                }
                None
            }
            NodeKind::Any | NodeKind::Unknown => value.cloned(),
            NodeKind::Never => {
                self.report(node.type_message().unwrap_or("Invalid input"));
                None
            }
            NodeKind::Literal { value: expected } => {
                let v = self.present(node, value)?;
                if !values_equal(v, expected) {
                    let message = node
                        .type_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Invalid literal value, expected {expected}"));
                    self.report(message);
                }
                Some(v.clone())
            }
            NodeKind::Enum { values } => {
                let v = self.present(node, value)?;
                if !values.iter().any(|allowed| values_equal(v, allowed)) {
                    let message = node.type_message().map(str::to_string).unwrap_or_else(|| {
                        let expected: Vec<String> = values.iter().map(Value::to_string).collect();
                        format!(
                            "Invalid enum value. Expected {}, received {v}",
                            expected.join(" | ")
                        )
                    });
                    self.report(message);
                }
                Some(v.clone())
            }
            NodeKind::Transform(transform) => {
                let v = self.present(node, value)?;
                match transform.apply(v) {
                    Ok(out) => Some(out),
                    Err(message) => {
                        self.report(message);
                        None
                    }
                }
            }
            NodeKind::Custom(custom) => {
                let v = self.present(node, value)?;
                if !custom.accepts(v) {
                    self.report(custom.message());
                }
                Some(v.clone())
            }
            NodeKind::Object { shape } => {
                let v = self.present(node, value)?;
                let Some(map) = v.as_object() else {
                    self.mismatch(node, "object", v);
                    return None;
                };
                let mut out = Map::new();
                for (name, field) in shape {
                    let parsed = self.at(PathSegment::Key(name.clone()), |run| {
                        run.check(field, map.get(name))
                    });
                    if let Some(parsed) = parsed {
                        out.insert(name.clone(), parsed);
                    }
                }
                Some(Value::Object(out))
            }
            NodeKind::Array { element, length } => {
                let v = self.present(node, value)?;
                let Some(items) = v.as_array() else {
                    self.mismatch(node, "array", v);
                    return None;
                };
                if let Some(length) = length {
                    if items.len() != *length {
                        self.report(format!("Array must contain exactly {length} element(s)"));
                    }
                }
                self.run_checks(node.checks(), v);
                Some(Value::Array(self.check_items(element, items)))
            }
            NodeKind::Union {
                variants,
                discriminator,
            } => {
                let v = self.present(node, value)?;
                match discriminator {
                    Some(field) => self.check_discriminated(node, field, variants, v),
                    None => self.check_any_variant(node, variants, v),
                }
            }
            NodeKind::Pipe { input, output } => {
                let before = self.issues.len();
                let mid = self.check(input, value);
                if self.issues.len() > before {
                    return None;
                }
                self.check(output, mid.as_ref())
            }
            NodeKind::Tuple { items } => {
                let v = self.present(node, value)?;
                let Some(values) = v.as_array() else {
                    self.mismatch(node, "tuple", v);
                    return None;
                };
                if values.len() != items.len() {
                    self.report(format!("Array must contain exactly {} element(s)", items.len()));
                }
                let out = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.at(PathSegment::Index(i), |run| run.check(item, values.get(i)))
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Some(Value::Array(out))
            }
            NodeKind::Record { key, value: entry } | NodeKind::Map { key, value: entry } => {
                let v = self.present(node, value)?;
                let Some(map) = v.as_object() else {
                    self.mismatch(node, "object", v);
                    return None;
                };
                let mut out = Map::new();
                for (name, item) in map {
                    let parsed = self.at(PathSegment::Key(name.clone()), |run| {
                        run.check(key, Some(&Value::String(name.clone())));
                        run.check(entry, Some(item))
                    });
                    out.insert(name.clone(), parsed.unwrap_or(Value::Null));
                }
                Some(Value::Object(out))
            }
            NodeKind::Set { element } => {
                let v = self.present(node, value)?;
                let Some(items) = v.as_array() else {
                    self.mismatch(node, "set", v);
                    return None;
                };
                let duplicate = items
                    .iter()
                    .enumerate()
                    .any(|(i, a)| items[..i].iter().any(|b| values_equal(a, b)));
                if duplicate {
                    self.report("Set must not contain duplicate elements");
                }
                Some(Value::Array(self.check_items(element, items)))
            }
            NodeKind::Intersection { left, right } => {
                let l = self.check(left, value);
                let r = self.check(right, value);
                match (l, r) {
                    (Some(Value::Object(mut l)), Some(Value::Object(r))) => {
                        l.extend(r);
                        Some(Value::Object(l))
                    }
                    (l, r) => l.or(r),
                }
            }
            NodeKind::Lazy(lazy) => {
                let resolved = lazy.resolve();
                self.check(&resolved, value)
            }
            NodeKind::Promise { inner } | NodeKind::Readonly { inner } => self.check(inner, value),
            NodeKind::Defaulted { inner, value: fallback } => match value {
                None => Some(fallback.clone()),
                Some(_) => self.check(inner, value),
            },
            NodeKind::Catch { inner, value: fallback } => {
                let mut scratch = NativeRun {
                    path: self.path.clone(),
                    issues: Vec::new(),
                };
                let parsed = scratch.check(inner, value);
                if scratch.issues.is_empty() {
                    parsed
                } else {
                    Some(fallback.clone())
                }
            }
            NodeKind::NonOptional { inner } => {
                let v = self.present(node, value)?;
                self.check(inner, Some(v))
            }
        }
    }

    fn check_items(&mut self, element: &SchemaNode, items: &[Value]) -> Vec<Value> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.at(PathSegment::Index(i), |run| run.check(element, Some(item)))
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    fn check_discriminated(
        &mut self,
        node: &SchemaNode,
        field: &str,
        variants: &[SchemaNode],
        value: &Value,
    ) -> Option<Value> {
        if !value.is_object() {
            self.mismatch(node, "object", value);
            return None;
        }
        match node.resolve_variant(value) {
            Some(variant) => self.check(variant, Some(value)),
            None => {
                let expected: Vec<String> = variants
                    .iter()
                    .filter_map(|v| v.shape()?.get(field)?.single_allowed_value())
                    .map(Value::to_string)
                    .collect();
                self.at(PathSegment::Key(field.to_string()), |run| {
                    run.report(format!(
                        "Invalid discriminator value. Expected {}",
                        expected.join(" | ")
                    ))
                });
                None
            }
        }
    }

    fn check_any_variant(
        &mut self,
        node: &SchemaNode,
        variants: &[SchemaNode],
        value: &Value,
    ) -> Option<Value> {
        for variant in variants {
            let mut attempt = NativeRun {
                path: self.path.clone(),
                issues: Vec::new(),
            };
            let parsed = attempt.check(variant, Some(value));
            if attempt.issues.is_empty() {
                return parsed;
            }
        }
        self.report(node.type_message().unwrap_or("Invalid input"));
        None
    }

    fn run_checks(&mut self, checks: &[Constraint], value: &Value) {
        for constraint in checks {
            if let Some(generated) = failed_check(&constraint.check, value) {
                let message = constraint.message.clone().unwrap_or(generated);
                self.report(message);
            }
        }
    }
}

/// The generated message for a failing check, or `None` if it passes or
/// does not apply to the value's type.
fn failed_check(check: &Check, value: &Value) -> Option<String> {
    match (check, value) {
        (Check::MinLength(min), Value::String(s)) if s.chars().count() < *min => Some(format!(
            "String must contain at least {min} character(s)"
        )),
        (Check::MaxLength(max), Value::String(s)) if s.chars().count() > *max => Some(format!(
            "String must contain at most {max} character(s)"
        )),
        (Check::MinItems(min), Value::Array(items)) if items.len() < *min => {
            Some(format!("Array must contain at least {min} element(s)"))
        }
        (Check::MaxItems(max), Value::Array(items)) if items.len() > *max => {
            Some(format!("Array must contain at most {max} element(s)"))
        }
        (Check::Int, Value::Number(n)) if !is_integral(n) => {
            Some("Expected integer, received float".to_string())
        }
        (Check::Positive, Value::Number(n)) if n.as_f64().is_some_and(|x| x <= 0.0) => {
            Some("Number must be greater than 0".to_string())
        }
        (Check::NonNegative, Value::Number(n)) if n.as_f64().is_some_and(|x| x < 0.0) => {
            Some("Number must be greater than or equal to 0".to_string())
        }
        (Check::Min(min), Value::Number(n)) if n.as_f64().is_some_and(|x| x < *min) => {
            Some(format!("Number must be greater than or equal to {min}"))
        }
        (Check::Max(max), Value::Number(n)) if n.as_f64().is_some_and(|x| x > *max) => {
            Some(format!("Number must be less than or equal to {max}"))
        }
        _ => None,
    }
}

fn is_integral(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|x| x.fract() == 0.0)
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// ─── Adapter ─────────────────────────────────────────────────────────

/// Marker key of a native node tree written as a JSON or YAML document.
pub const NATIVE_DOCUMENT_KEY: &str = "$formwork";

/// The adapter for schemas built as [`SchemaNode`] trees.
///
/// Besides in-memory trees it accepts serialized node documents whose
/// top-level object carries the [`NATIVE_DOCUMENT_KEY`] marker. Such
/// documents are checked with [`SchemaNode::check_model`] on load.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeAdapter;

impl NativeAdapter {
    fn load<'s>(&self, schema: &'s Schema) -> Result<Cow<'s, SchemaNode>, DeriveError> {
        let document = match schema.body() {
            SchemaBody::Node(node) => return Ok(Cow::Borrowed(node)),
            SchemaBody::Document(document) => document,
        };
        let introspection = |reason: String| DeriveError::Introspection {
            vendor: NATIVE_VENDOR.to_string(),
            path: "<root>".to_string(),
            reason,
        };
        let node: SchemaNode =
            serde_json::from_value(document.clone()).map_err(|e| introspection(e.to_string()))?;
        node.check_model()?;
        Ok(Cow::Owned(node))
    }
}

impl SchemaAdapter for NativeAdapter {
    fn vendor(&self) -> &str {
        NATIVE_VENDOR
    }

    fn is_compatible(&self, schema: &Schema) -> bool {
        match schema.body() {
            SchemaBody::Node(_) => true,
            SchemaBody::Document(document) => document.get(NATIVE_DOCUMENT_KEY).is_some(),
        }
    }

    fn introspect<'s>(&self, schema: &'s Schema) -> Result<Cow<'s, SchemaNode>, DeriveError> {
        self.load(schema)
    }

    fn parse(&self, schema: &Schema, value: &Value) -> Result<ParseOutcome, ValidationError> {
        let node = self.load(schema)?;
        Ok(ParseOutcome::Ready(parse_native(&node, value)))
    }

    fn parse_node(
        &self,
        node: &SchemaNode,
        value: &Value,
    ) -> Result<ParseOutcome, ValidationError> {
        Ok(ParseOutcome::Ready(parse_native(node, value)))
    }
}
