//! # Validation Executor
//!
//! Runs an adapter's validator over a value and turns its issues into an
//! [`ErrorTree`] via the normalizer. Invalid input is never an error: it is
//! the data value [`ValidationOutcome::Invalid`]. [`ValidationError`] is
//! reserved for calls that could not run at all.
//!
//! ## Partial validation
//!
//! The partial variant validates against the schema produced by
//! [`derive_partial`], or against an explicit partial schema bound to the
//! [`Validator`]. A root array schema derives to its partial element, so a
//! root array value is validated element by element and the per-element
//! issues are folded under their index.
//!
//! ## Sync and async
//!
//! Every entry point has a synchronous form that rejects a deferred vendor
//! result with [`ValidationError::Deferred`], and an `_async` form that
//! awaits it.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use formwork_core::{json_type_name, ErrorTree, NodeKind, PathSegment, SchemaNode};

use crate::adapter::{ParseOutcome, ParseResult, Schema, SchemaAdapter};
use crate::error::ValidationError;
use crate::normalize::{fold_into, normalize_issues};
use crate::partial::derive_partial;
use crate::registry;

// ─── Outcomes ────────────────────────────────────────────────────────

/// The result of validating one value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The parsed value, with defaults and transforms applied.
    Valid(Value),
    /// The normalized issues.
    Invalid(ErrorTree),
}

impl ValidationOutcome {
    /// Normalize a vendor result.
    pub fn from_parse(result: ParseResult) -> Self {
        match result {
            Ok(value) => Self::Valid(value),
            Err(issues) => Self::Invalid(normalize_issues(&issues)),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    pub fn errors(&self) -> Option<&ErrorTree> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    pub fn into_result(self) -> Result<Value, ErrorTree> {
        match self {
            Self::Valid(value) => Ok(value),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

pub(crate) fn settle_now(
    vendor: &str,
    outcome: ParseOutcome,
) -> Result<ValidationOutcome, ValidationError> {
    ready(vendor, outcome).map(ValidationOutcome::from_parse)
}

fn ready(vendor: &str, outcome: ParseOutcome) -> Result<ParseResult, ValidationError> {
    match outcome {
        ParseOutcome::Ready(result) => Ok(result),
        ParseOutcome::Deferred(_) => {
            tracing::debug!(vendor, "synchronous caller received a deferred result");
            Err(ValidationError::Deferred {
                vendor: vendor.to_string(),
            })
        }
    }
}

// ─── Partial validation ──────────────────────────────────────────────

enum PartialTarget<'n> {
    Whole(Cow<'n, SchemaNode>),
    /// A root array: its partial element, and whether the array accepts `null`.
    PerElement { element: SchemaNode, nullable: bool },
}

fn partial_target<'n, A: SchemaAdapter + ?Sized>(
    adapter: &A,
    schema: &Schema,
    explicit: Option<&'n SchemaNode>,
) -> Result<PartialTarget<'n>, ValidationError> {
    if let Some(node) = explicit {
        return Ok(PartialTarget::Whole(Cow::Borrowed(node)));
    }
    let full = adapter.introspect(schema)?;
    let partial = derive_partial(&full)?;
    Ok(match full.kind() {
        NodeKind::Array { .. } => PartialTarget::PerElement {
            element: partial,
            nullable: full.is_nullable(),
        },
        _ => PartialTarget::Whole(Cow::Owned(partial)),
    })
}

/// The outcome for a root array value that is not an array.
fn not_an_array(value: &Value, nullable: bool) -> ValidationOutcome {
    if nullable && value.is_null() {
        return ValidationOutcome::Valid(Value::Null);
    }
    ValidationOutcome::Invalid(ErrorTree::with_root_error(format!(
        "Expected array, received {}",
        json_type_name(value)
    )))
}

/// Collect per-element results of a root array into one outcome.
fn collect_elements(results: Vec<ParseResult>) -> ValidationOutcome {
    let mut errors = ErrorTree::new();
    let mut parsed = Vec::with_capacity(results.len());
    let mut failed = false;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => parsed.push(value),
            Err(issues) => {
                failed = true;
                fold_into(&mut errors, &[PathSegment::Index(index)], &issues);
            }
        }
    }
    if failed {
        ValidationOutcome::Invalid(errors)
    } else {
        ValidationOutcome::Valid(Value::Array(parsed))
    }
}

pub(crate) fn run_partial<A: SchemaAdapter + ?Sized>(
    adapter: &A,
    schema: &Schema,
    explicit: Option<&SchemaNode>,
    value: &Value,
) -> Result<ValidationOutcome, ValidationError> {
    match partial_target(adapter, schema, explicit)? {
        PartialTarget::Whole(node) => settle_now(adapter.vendor(), adapter.parse_node(&node, value)?),
        PartialTarget::PerElement { element, nullable } => {
            let Some(items) = value.as_array() else {
                return Ok(not_an_array(value, nullable));
            };
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(ready(adapter.vendor(), adapter.parse_node(&element, item)?)?);
            }
            Ok(collect_elements(results))
        }
    }
}

async fn run_partial_async(
    adapter: &dyn SchemaAdapter,
    schema: &Schema,
    explicit: Option<&SchemaNode>,
    value: &Value,
) -> Result<ValidationOutcome, ValidationError> {
    match partial_target(adapter, schema, explicit)? {
        PartialTarget::Whole(node) => {
            let outcome = adapter.parse_node(&node, value)?;
            Ok(ValidationOutcome::from_parse(outcome.resolve().await))
        }
        PartialTarget::PerElement { element, nullable } => {
            let Some(items) = value.as_array() else {
                return Ok(not_an_array(value, nullable));
            };
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                results.push(adapter.parse_node(&element, item)?.resolve().await);
            }
            Ok(collect_elements(results))
        }
    }
}

fn elements(values: &Value) -> Result<&[Value], ValidationError> {
    values
        .as_array()
        .map(Vec::as_slice)
        .ok_or(ValidationError::ExpectedArray {
            received: json_type_name(values),
        })
}

// ─── Validator facade ────────────────────────────────────────────────

/// A validator bound to one schema and the adapter that owns it.
#[derive(Clone)]
pub struct Validator {
    adapter: Arc<dyn SchemaAdapter>,
    schema: Schema,
    partial: Option<SchemaNode>,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("vendor", &self.adapter.vendor())
            .field("schema", &self.schema)
            .field("partial", &self.partial)
            .finish()
    }
}

impl Validator {
    pub fn new(adapter: Arc<dyn SchemaAdapter>, schema: Schema) -> Self {
        Self {
            adapter,
            schema,
            partial: None,
        }
    }

    /// Use `partial` instead of deriving the partial schema.
    pub fn with_partial_schema(mut self, partial: SchemaNode) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn vendor(&self) -> &str {
        self.adapter.vendor()
    }

    pub fn validate(&self, value: &Value) -> Result<ValidationOutcome, ValidationError> {
        self.adapter.validate(&self.schema, value)
    }

    /// Validate each element of `values` independently.
    pub fn validate_array(&self, values: &Value) -> Result<Vec<ValidationOutcome>, ValidationError> {
        elements(values)?.iter().map(|value| self.validate(value)).collect()
    }

    pub fn validate_partial(&self, value: &Value) -> Result<ValidationOutcome, ValidationError> {
        match &self.partial {
            Some(partial) => run_partial(self.adapter.as_ref(), &self.schema, Some(partial), value),
            None => self.adapter.validate_partial(&self.schema, value),
        }
    }

    pub fn validate_partial_array(
        &self,
        values: &Value,
    ) -> Result<Vec<ValidationOutcome>, ValidationError> {
        elements(values)?
            .iter()
            .map(|value| self.validate_partial(value))
            .collect()
    }

    pub async fn validate_async(&self, value: &Value) -> Result<ValidationOutcome, ValidationError> {
        let outcome = self.adapter.parse(&self.schema, value)?;
        Ok(ValidationOutcome::from_parse(outcome.resolve().await))
    }

    pub async fn validate_array_async(
        &self,
        values: &Value,
    ) -> Result<Vec<ValidationOutcome>, ValidationError> {
        let mut outcomes = Vec::new();
        for value in elements(values)? {
            outcomes.push(self.validate_async(value).await?);
        }
        Ok(outcomes)
    }

    pub async fn validate_partial_async(
        &self,
        value: &Value,
    ) -> Result<ValidationOutcome, ValidationError> {
        run_partial_async(self.adapter.as_ref(), &self.schema, self.partial.as_ref(), value).await
    }

    pub async fn validate_partial_array_async(
        &self,
        values: &Value,
    ) -> Result<Vec<ValidationOutcome>, ValidationError> {
        let mut outcomes = Vec::new();
        for value in elements(values)? {
            outcomes.push(self.validate_partial_async(value).await?);
        }
        Ok(outcomes)
    }
}

// ─── Global entry points ─────────────────────────────────────────────

/// Validate `value` against `schema` using the installed global registry.
pub fn validate(schema: &Schema, value: &Value) -> Result<ValidationOutcome, ValidationError> {
    registry::global()?.resolve(schema)?.validate(schema, value)
}

/// Partial variant of [`validate`].
pub fn validate_partial(
    schema: &Schema,
    value: &Value,
) -> Result<ValidationOutcome, ValidationError> {
    registry::global()?.resolve(schema)?.validate_partial(schema, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeAdapter;
    use formwork_core::Check;
    use serde_json::json;

    fn rows_schema() -> Schema {
        Schema::native(SchemaNode::array(SchemaNode::object([
            ("label", SchemaNode::string().check(Check::MinLength(1), Some("Label is required"))),
            ("qty", SchemaNode::integer()),
        ])))
    }

    fn validator(schema: Schema) -> Validator {
        Validator::new(Arc::new(NativeAdapter), schema)
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = ValidationOutcome::Valid(json!(1));
        assert!(ok.is_valid());
        assert_eq!(ok.value(), Some(&json!(1)));
        assert_eq!(ok.into_result(), Ok(json!(1)));

        let bad = ValidationOutcome::from_parse(Err(vec![formwork_core::Issue::root("nope")]));
        assert_eq!(bad.errors().unwrap().error.as_deref(), Some("nope"));
    }

    #[test]
    fn test_root_array_partial_runs_per_element() {
        let v = validator(rows_schema());
        let outcome = v
            .validate_partial(&json!([{"label": "a"}, {"label": ""}, {}]))
            .unwrap();
        let errors = outcome.errors().unwrap();
        assert!(errors.item(0).is_none());
        assert_eq!(
            errors.item(1).unwrap().field("label").unwrap().error.as_deref(),
            Some("Label is required")
        );
        assert!(errors.item(2).is_none());
    }

    #[test]
    fn test_root_array_partial_rejects_non_array_value() {
        let outcome = validator(rows_schema()).validate_partial(&json!({"label": "a"})).unwrap();
        assert_eq!(
            outcome.errors().unwrap().error.as_deref(),
            Some("Expected array, received object")
        );
    }

    #[test]
    fn test_nullable_root_array_partial_accepts_null() {
        let v = validator(Schema::native(SchemaNode::array(SchemaNode::string()).nullable()));
        assert!(v.validate(&json!(null)).unwrap().is_valid());
        assert_eq!(v.validate_partial(&json!(null)).unwrap(), ValidationOutcome::Valid(json!(null)));
        assert!(!v.validate_partial(&json!("x")).unwrap().is_valid());

        let strict = validator(Schema::native(SchemaNode::array(SchemaNode::string())));
        assert!(!strict.validate_partial(&json!(null)).unwrap().is_valid());
    }

    #[test]
    fn test_array_variants_require_arrays() {
        let v = validator(Schema::native(SchemaNode::string()));
        let outcomes = v.validate_array(&json!(["a", 1])).unwrap();
        assert!(outcomes[0].is_valid());
        assert!(!outcomes[1].is_valid());
        assert!(matches!(
            v.validate_array(&json!("a")),
            Err(ValidationError::ExpectedArray { received: "string" })
        ));
    }

    #[test]
    fn test_explicit_partial_schema_wins() {
        let v = validator(Schema::native(SchemaNode::object([("a", SchemaNode::string())])))
            .with_partial_schema(SchemaNode::object([("a", SchemaNode::number().optional())]));
        assert!(v.validate_partial(&json!({"a": 1})).unwrap().is_valid());
        assert!(!v.validate_partial(&json!({"a": "x"})).unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_async_variants_match_sync() {
        let v = validator(rows_schema());
        let value = json!([{"label": "a", "qty": 1}]);
        assert_eq!(v.validate_async(&value).await.unwrap(), v.validate(&value).unwrap());
        assert_eq!(
            v.validate_partial_async(&json!([{}])).await.unwrap(),
            v.validate_partial(&json!([{}])).unwrap()
        );
        let many = v.validate_partial_array_async(&json!([[{}], [{"qty": "x"}]])).await.unwrap();
        assert!(many[0].is_valid());
        assert!(!many[1].is_valid());
    }
}
