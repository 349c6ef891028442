//! # Schema Node Model — The Closed Kind Algebra
//!
//! A [`SchemaNode`] describes one node of a data shape. Its [`NodeKind`] is
//! fixed at construction: the field is private and every builder method that
//! returns a modified node (`optional()`, `with_default()`, `check()`, ...)
//! only touches the modifiers around the kind, never the kind itself.
//!
//! ## Kinds
//!
//! - **Leaves**: string, number, bigint, boolean, date, symbol, null,
//!   undefined, void, any, unknown, never, nan, literal, enum, transform,
//!   custom.
//! - **Structural**: object (ordered field map), array (element node plus an
//!   optional expected length), union (variants plus an optional
//!   discriminator field), pipe (input node feeding an output node).
//! - **Unsupported by the derivers**: tuple, record, map, set, intersection,
//!   promise, lazy, readonly, defaulted, catch, non-optional. They exist so
//!   that vendor schemas can be represented faithfully and rejected
//!   explicitly instead of being silently passed through.
//!
//! ## Exhaustiveness
//!
//! Every consumer dispatches on `NodeKind` with a `match` that has no
//! wildcard arm. Adding a kind is a breaking change: the compiler lists every
//! dispatcher that must be updated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::SchemaModelError;

// ─── Function-carrying payloads ─────────────────────────────────────

/// Produces a fresh default value each time it is called.
#[derive(Clone)]
pub struct DefaultSupplier(Arc<dyn Fn() -> Value + Send + Sync>);

impl DefaultSupplier {
    /// Wrap a closure as a default supplier.
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the supplier.
    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DefaultSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultSupplier(..)")
    }
}

/// A user-declared default: either a fixed value or a supplier.
///
/// Suppliers serialize as the value they currently produce; a deserialized
/// default is always `Static`.
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned on every use.
    Static(Value),
    /// A closure evaluated on every use.
    Supplier(DefaultSupplier),
}

impl DefaultValue {
    /// Produce the default value.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Static(v) => v.clone(),
            Self::Supplier(s) => s.call(),
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Static(a), Self::Static(b)) => a == b,
            (Self::Supplier(a), Self::Supplier(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.resolve().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Static)
    }
}

/// A value transform applied during validation. `Err` carries the issue message.
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>);

impl TransformFn {
    /// Wrap a transform closure.
    pub fn new(f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the transform to a value.
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn(..)")
    }
}

impl PartialEq for TransformFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A named predicate with the message reported when it rejects a value.
#[derive(Clone)]
pub struct CustomCheck {
    name: String,
    message: String,
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl CustomCheck {
    /// Create a custom check.
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// The check's name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message reported on rejection.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run the predicate.
    pub fn accepts(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCheck").field("name", &self.name).finish()
    }
}

impl PartialEq for CustomCheck {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

/// Deferred schema resolution for recursive shapes.
#[derive(Clone)]
pub struct LazySchema(Arc<dyn Fn() -> SchemaNode + Send + Sync>);

impl LazySchema {
    /// Wrap a getter that builds the referenced schema on demand.
    pub fn new(f: impl Fn() -> SchemaNode + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Build the referenced schema.
    pub fn resolve(&self) -> SchemaNode {
        (self.0)()
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazySchema(..)")
    }
}

impl PartialEq for LazySchema {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ─── Constraints ────────────────────────────────────────────────────

/// A declarative check evaluated by the native validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// String has at least this many characters.
    MinLength(usize),
    /// String has at most this many characters.
    MaxLength(usize),
    /// Number is an integer.
    Int,
    /// Number is strictly greater than zero.
    Positive,
    /// Number is zero or greater.
    NonNegative,
    /// Number is at least this value.
    Min(f64),
    /// Number is at most this value.
    Max(f64),
    /// Array has at least this many items.
    MinItems(usize),
    /// Array has at most this many items.
    MaxItems(usize),
}

/// A check plus the message reported when it fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// The check to evaluate.
    pub check: Check,
    /// Message override; a generated message is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ─── Node kinds ─────────────────────────────────────────────────────

/// The kind tag of a schema node, with its nested shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// UTF-8 string.
    String,
    /// Floating point or integer number.
    Number,
    /// Arbitrary-precision integer.
    Bigint,
    /// Boolean.
    Boolean,
    /// Date-like value (RFC 3339 string on the wire).
    Date,
    /// Opaque symbol; has no sensible default.
    Symbol,
    /// Exactly `null`.
    Null,
    /// Exactly absent.
    Undefined,
    /// Absent; used for "no value" returns.
    Void,
    /// Accepts anything.
    Any,
    /// Accepts anything, must be narrowed before use.
    Unknown,
    /// Accepts nothing.
    Never,
    /// Not-a-number marker.
    Nan,
    /// A single fixed value.
    Literal {
        /// The only accepted value.
        value: Value,
    },
    /// One of a fixed set of values.
    Enum {
        /// Accepted values, in declaration order.
        values: Vec<Value>,
    },
    /// Value transform with no structural shape of its own.
    #[serde(skip)]
    Transform(TransformFn),
    /// Predicate-checked value with no structural shape of its own.
    #[serde(skip)]
    Custom(CustomCheck),
    /// Named fields, ordered by field name.
    Object {
        /// Field name → field schema.
        shape: BTreeMap<String, SchemaNode>,
    },
    /// Homogeneous sequence.
    Array {
        /// Schema of every element.
        element: Box<SchemaNode>,
        /// Expected length, if the schema fixes one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<usize>,
    },
    /// One of several variants, optionally routed by a discriminator field.
    Union {
        /// Candidate variants, in declaration order.
        variants: Vec<SchemaNode>,
        /// Field whose literal value selects the variant.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discriminator: Option<String>,
    },
    /// Validate against `input`, then feed the result through `output`.
    Pipe {
        /// The side callers write into.
        input: Box<SchemaNode>,
        /// The side the validated value comes out of.
        output: Box<SchemaNode>,
    },
    /// Fixed-position heterogeneous sequence.
    Tuple {
        /// Schema for each position.
        items: Vec<SchemaNode>,
    },
    /// String-keyed dictionary with uniform values.
    Record {
        /// Key schema.
        key: Box<SchemaNode>,
        /// Value schema.
        value: Box<SchemaNode>,
    },
    /// Map collection.
    Map {
        /// Key schema.
        key: Box<SchemaNode>,
        /// Value schema.
        value: Box<SchemaNode>,
    },
    /// Set collection.
    Set {
        /// Element schema.
        element: Box<SchemaNode>,
    },
    /// Value must satisfy both sides.
    Intersection {
        /// First constraint.
        left: Box<SchemaNode>,
        /// Second constraint.
        right: Box<SchemaNode>,
    },
    /// Deferred value.
    Promise {
        /// Schema of the resolved value.
        inner: Box<SchemaNode>,
    },
    /// Self-referential schema resolved on demand.
    #[serde(skip)]
    Lazy(LazySchema),
    /// Read-only wrapper.
    Readonly {
        /// Wrapped schema.
        inner: Box<SchemaNode>,
    },
    /// Wrapper that substitutes `value` for an absent input.
    Defaulted {
        /// Wrapped schema.
        inner: Box<SchemaNode>,
        /// Substituted value.
        value: Value,
    },
    /// Wrapper that substitutes `value` for an invalid input.
    Catch {
        /// Wrapped schema.
        inner: Box<SchemaNode>,
        /// Substituted value.
        value: Value,
    },
    /// Wrapper that forbids absence and has no fallback of its own.
    NonOptional {
        /// Wrapped schema.
        inner: Box<SchemaNode>,
    },
}

impl NodeKind {
    /// Stable lowercase name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Bigint => "bigint",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Symbol => "symbol",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Void => "void",
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Never => "never",
            Self::Nan => "nan",
            Self::Literal { .. } => "literal",
            Self::Enum { .. } => "enum",
            Self::Transform(_) => "transform",
            Self::Custom(_) => "custom",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Union { .. } => "union",
            Self::Pipe { .. } => "pipe",
            Self::Tuple { .. } => "tuple",
            Self::Record { .. } => "record",
            Self::Map { .. } => "map",
            Self::Set { .. } => "set",
            Self::Intersection { .. } => "intersection",
            Self::Promise { .. } => "promise",
            Self::Lazy(_) => "lazy",
            Self::Readonly { .. } => "readonly",
            Self::Defaulted { .. } => "defaulted",
            Self::Catch { .. } => "catch",
            Self::NonOptional { .. } => "non_optional",
        }
    }

    /// Whether the kind carries a nested field or element shape.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Object { .. } | Self::Array { .. })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Schema node ────────────────────────────────────────────────────

fn is_false(b: &bool) -> bool {
    !*b
}

/// One node of a schema tree: an immutable kind plus presence modifiers,
/// a declared default, and declarative checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(flatten)]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "is_false")]
    optional: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<DefaultValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    checks: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl SchemaNode {
    /// Construct a required, non-nullable node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            default: None,
            checks: Vec::new(),
            message: None,
        }
    }

    pub fn string() -> Self {
        Self::new(NodeKind::String)
    }

    pub fn number() -> Self {
        Self::new(NodeKind::Number)
    }

    /// A number carrying the `Int` check.
    pub fn integer() -> Self {
        Self::number().check(Check::Int, None::<String>)
    }

    pub fn bigint() -> Self {
        Self::new(NodeKind::Bigint)
    }

    pub fn boolean() -> Self {
        Self::new(NodeKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(NodeKind::Date)
    }

    pub fn any() -> Self {
        Self::new(NodeKind::Any)
    }

    pub fn unknown() -> Self {
        Self::new(NodeKind::Unknown)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Literal {
            value: value.into(),
        })
    }

    pub fn enumeration<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(NodeKind::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn transform(f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self::new(NodeKind::Transform(TransformFn::new(f)))
    }

    pub fn custom(check: CustomCheck) -> Self {
        Self::new(NodeKind::Custom(check))
    }

    /// An object node from `(field, schema)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        Self::new(NodeKind::Object {
            shape: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn array(element: SchemaNode) -> Self {
        Self::new(NodeKind::Array {
            element: Box::new(element),
            length: None,
        })
    }

    /// An array whose schema fixes the expected length.
    pub fn array_of_length(element: SchemaNode, length: usize) -> Self {
        Self::new(NodeKind::Array {
            element: Box::new(element),
            length: Some(length),
        })
    }

    /// A union without a discriminator.
    pub fn union(variants: Vec<SchemaNode>) -> Self {
        Self::new(NodeKind::Union {
            variants,
            discriminator: None,
        })
    }

    /// A union routed by `discriminator`.
    ///
    /// # Errors
    ///
    /// Fails if any variant is not an object, lacks the discriminator field,
    /// declares it as anything other than a required single literal, or
    /// reuses another variant's literal.
    pub fn discriminated_union(
        discriminator: impl Into<String>,
        variants: Vec<SchemaNode>,
    ) -> Result<Self, SchemaModelError> {
        let discriminator = discriminator.into();
        check_discriminated_variants(&discriminator, &variants)?;
        Ok(Self::new(NodeKind::Union {
            variants,
            discriminator: Some(discriminator),
        }))
    }

    pub fn pipe(input: SchemaNode, output: SchemaNode) -> Self {
        Self::new(NodeKind::Pipe {
            input: Box::new(input),
            output: Box::new(output),
        })
    }

    pub fn tuple(items: Vec<SchemaNode>) -> Self {
        Self::new(NodeKind::Tuple { items })
    }

    pub fn record(key: SchemaNode, value: SchemaNode) -> Self {
        Self::new(NodeKind::Record {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn map(key: SchemaNode, value: SchemaNode) -> Self {
        Self::new(NodeKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn set(element: SchemaNode) -> Self {
        Self::new(NodeKind::Set {
            element: Box::new(element),
        })
    }

    pub fn intersection(left: SchemaNode, right: SchemaNode) -> Self {
        Self::new(NodeKind::Intersection {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn promise(inner: SchemaNode) -> Self {
        Self::new(NodeKind::Promise {
            inner: Box::new(inner),
        })
    }

    pub fn lazy(getter: impl Fn() -> SchemaNode + Send + Sync + 'static) -> Self {
        Self::new(NodeKind::Lazy(LazySchema::new(getter)))
    }

    pub fn readonly(inner: SchemaNode) -> Self {
        Self::new(NodeKind::Readonly {
            inner: Box::new(inner),
        })
    }

    pub fn defaulted(inner: SchemaNode, value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Defaulted {
            inner: Box::new(inner),
            value: value.into(),
        })
    }

    pub fn catch(inner: SchemaNode, value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Catch {
            inner: Box::new(inner),
            value: value.into(),
        })
    }

    pub fn non_optional(inner: SchemaNode) -> Self {
        Self::new(NodeKind::NonOptional {
            inner: Box::new(inner),
        })
    }

    // ── Modifiers (the kind is never touched) ───────────────────────

    /// Accept absence in addition to the node's own constraints.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Accept `null` in addition to the node's own constraints.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declare a fixed default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Declare a default produced by a supplier on every use.
    pub fn with_default_fn(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Supplier(DefaultSupplier::new(f)));
        self
    }

    /// Append a check with an optional custom failure message.
    pub fn check(mut self, check: Check, message: Option<impl Into<String>>) -> Self {
        self.checks.push(Constraint {
            check,
            message: message.map(Into::into),
        });
        self
    }

    /// Override the message reported when the value has the wrong type or is missing.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn into_kind(self) -> NodeKind {
        self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn declared_default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn checks(&self) -> &[Constraint] {
        &self.checks
    }

    pub fn type_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The single value this node accepts, if its allowed set has exactly one member.
    pub fn single_allowed_value(&self) -> Option<&Value> {
        match &self.kind {
            NodeKind::Literal { value } => Some(value),
            NodeKind::Enum { values } if values.len() == 1 => values.first(),
            _ => None,
        }
    }

    /// The object shape, if this is an object node.
    pub fn shape(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Object { shape } => Some(shape),
            _ => None,
        }
    }

    /// Select the variant of a discriminated union that a live value routes to.
    ///
    /// Returns `None` for non-union nodes, undiscriminated unions, values that
    /// are not objects, and discriminator values no variant declares.
    pub fn resolve_variant(&self, value: &Value) -> Option<&SchemaNode> {
        let NodeKind::Union {
            variants,
            discriminator: Some(discriminator),
        } = &self.kind
        else {
            return None;
        };
        let tag = value.as_object()?.get(discriminator)?;
        variants.iter().find(|variant| {
            variant
                .shape()
                .and_then(|shape| shape.get(discriminator))
                .and_then(SchemaNode::single_allowed_value)
                == Some(tag)
        })
    }

    /// Verify construction-time invariants across the whole tree.
    ///
    /// Nodes built through [`SchemaNode::discriminated_union`] are checked on
    /// construction; nodes deserialized from a document are not, so loaders
    /// call this once after parsing.
    pub fn check_model(&self) -> Result<(), SchemaModelError> {
        match &self.kind {
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
            | NodeKind::Transform(_)
            | NodeKind::Custom(_)
            | NodeKind::Lazy(_) => Ok(()),
            NodeKind::Enum { values } => {
                if values.is_empty() {
                    Err(SchemaModelError::EmptyEnum)
                } else {
                    Ok(())
                }
            }
            NodeKind::Object { shape } => shape.values().try_for_each(SchemaNode::check_model),
            NodeKind::Array { element, .. } | NodeKind::Set { element } => element.check_model(),
            NodeKind::Union {
                variants,
                discriminator,
            } => {
                if variants.is_empty() {
                    return Err(SchemaModelError::EmptyUnion);
                }
                if let Some(discriminator) = discriminator {
                    check_discriminated_variants(discriminator, variants)?;
                }
                variants.iter().try_for_each(SchemaNode::check_model)
            }
            NodeKind::Pipe { input, output } => {
                input.check_model()?;
                output.check_model()
            }
            NodeKind::Tuple { items } => items.iter().try_for_each(SchemaNode::check_model),
            NodeKind::Record { key, value } | NodeKind::Map { key, value } => {
                key.check_model()?;
                value.check_model()
            }
            NodeKind::Intersection { left, right } => {
                left.check_model()?;
                right.check_model()
            }
            NodeKind::Promise { inner }
            | NodeKind::Readonly { inner }
            | NodeKind::Defaulted { inner, .. }
            | NodeKind::Catch { inner, .. }
            | NodeKind::NonOptional { inner } => inner.check_model(),
        }
    }

    /// Rebuild this node around a new kind, keeping every modifier.
    ///
    /// Used by derivers that produce a sibling schema; the original node is
    /// left untouched.
    pub fn with_kind(&self, kind: NodeKind) -> Self {
        Self {
            kind,
            optional: self.optional,
            nullable: self.nullable,
            default: self.default.clone(),
            checks: self.checks.clone(),
            message: self.message.clone(),
        }
    }
}

/// Variants must be objects declaring `discriminator` as a required literal,
/// and no two variants may share a literal.
fn check_discriminated_variants(
    discriminator: &str,
    variants: &[SchemaNode],
) -> Result<(), SchemaModelError> {
    if variants.is_empty() {
        return Err(SchemaModelError::EmptyUnion);
    }
    let mut seen = BTreeSet::new();
    for (index, variant) in variants.iter().enumerate() {
        let shape = variant
            .shape()
            .ok_or_else(|| SchemaModelError::VariantNotObject {
                index,
                kind: variant.kind().name(),
            })?;
        let field = shape
            .get(discriminator)
            .ok_or_else(|| SchemaModelError::DiscriminatorMissing {
                index,
                discriminator: discriminator.to_string(),
            })?;
        if field.is_optional() {
            return Err(SchemaModelError::DiscriminatorOptional {
                index,
                discriminator: discriminator.to_string(),
            });
        }
        let literal = field
            .single_allowed_value()
            .ok_or_else(|| SchemaModelError::DiscriminatorNotLiteral {
                index,
                discriminator: discriminator.to_string(),
                kind: field.kind().name(),
            })?;
        if !seen.insert(literal.to_string()) {
            return Err(SchemaModelError::DuplicateDiscriminatorValue {
                discriminator: discriminator.to_string(),
                value: literal.to_string(),
            });
        }
    }
    Ok(())
}
