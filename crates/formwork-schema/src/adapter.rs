//! # Schema Adapters
//!
//! An adapter binds one schema vendor to the engine. It knows how to
//! recognise that vendor's schemas, how to map them onto the
//! [`SchemaNode`] model, and how to run that vendor's validator. Default
//! derivation, partial derivation and meta-tree maintenance are shared:
//! the trait's provided methods run the crate's derivers over the
//! introspected node.
//!
//! ## Detection
//!
//! A [`Schema`] may carry an explicit vendor tag. The registry asks
//! [`SchemaAdapter::supports_vendor`] first and falls back to the
//! structural probe [`SchemaAdapter::is_compatible`] for untagged schemas.
//!
//! ## Deferred validation
//!
//! A vendor validator may be asynchronous. [`SchemaAdapter::parse`] then
//! returns [`ParseOutcome::Deferred`]; synchronous callers reject it with
//! `ValidationError::Deferred` instead of blocking.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use formwork_core::{DefaultOptions, Issue, SchemaNode};
use formwork_state::{create_meta_state, sync_meta_state, MetaNode};

use crate::defaults::derive_defaults;
use crate::error::{DeriveError, ValidationError};
use crate::partial::derive_partial;
use crate::validate::{run_partial, settle_now, ValidationOutcome};

/// Vendor tag of schemas built directly as [`SchemaNode`] trees.
pub const NATIVE_VENDOR: &str = "formwork";

/// Vendor tag of JSON Schema documents.
pub const JSON_SCHEMA_VENDOR: &str = "json-schema";

// ─── Schemas ─────────────────────────────────────────────────────────

/// The payload of a schema: a node tree or a vendor document.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaBody {
    Node(SchemaNode),
    Document(Value),
}

/// A schema handed to the engine, optionally tagged with its vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    vendor: Option<String>,
    body: SchemaBody,
}

impl Schema {
    /// A native node tree, tagged with [`NATIVE_VENDOR`].
    pub fn native(node: SchemaNode) -> Self {
        Self {
            vendor: Some(NATIVE_VENDOR.to_string()),
            body: SchemaBody::Node(node),
        }
    }

    /// An untagged document, resolved by structural probe.
    pub fn document(document: Value) -> Self {
        Self {
            vendor: None,
            body: SchemaBody::Document(document),
        }
    }

    /// A document carrying an explicit vendor tag.
    pub fn tagged(vendor: impl Into<String>, body: SchemaBody) -> Self {
        Self {
            vendor: Some(vendor.into()),
            body,
        }
    }

    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    pub fn body(&self) -> &SchemaBody {
        &self.body
    }

    pub fn as_node(&self) -> Option<&SchemaNode> {
        match &self.body {
            SchemaBody::Node(node) => Some(node),
            SchemaBody::Document(_) => None,
        }
    }

    pub fn as_document(&self) -> Option<&Value> {
        match &self.body {
            SchemaBody::Node(_) => None,
            SchemaBody::Document(document) => Some(document),
        }
    }
}

// ─── Parse outcomes ──────────────────────────────────────────────────

/// The result of a vendor validator: the parsed value or its issues.
pub type ParseResult = Result<Value, Vec<Issue>>;

/// A vendor validator's pending result.
pub type ParseFuture = Pin<Box<dyn Future<Output = ParseResult> + Send + 'static>>;

/// A vendor validator's result, available now or later.
pub enum ParseOutcome {
    Ready(ParseResult),
    Deferred(ParseFuture),
}

impl ParseOutcome {
    pub fn deferred(future: impl Future<Output = ParseResult> + Send + 'static) -> Self {
        Self::Deferred(Box::pin(future))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Wait for the result.
    pub async fn resolve(self) -> ParseResult {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(future) => future.await,
        }
    }
}

impl fmt::Debug for ParseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

// ─── The adapter trait ───────────────────────────────────────────────

/// One schema vendor's binding to the engine.
///
/// Implementors provide detection, introspection and parsing; everything
/// else has a provided implementation over the introspected node.
pub trait SchemaAdapter: Send + Sync {
    /// The vendor tag this adapter owns.
    fn vendor(&self) -> &str;

    /// Whether this adapter handles schemas tagged `vendor`.
    fn supports_vendor(&self, vendor: &str) -> bool {
        vendor == self.vendor()
    }

    /// Structural probe for untagged schemas.
    fn is_compatible(&self, schema: &Schema) -> bool;

    /// Map the schema onto the node model.
    fn introspect<'s>(&self, schema: &'s Schema) -> Result<Cow<'s, SchemaNode>, DeriveError>;

    /// Run the vendor validator against the schema itself.
    fn parse(&self, schema: &Schema, value: &Value) -> Result<ParseOutcome, ValidationError>;

    /// Run the vendor validator against a derived node, such as a partial schema.
    fn parse_node(&self, node: &SchemaNode, value: &Value)
        -> Result<ParseOutcome, ValidationError>;

    fn create_default_values(
        &self,
        schema: &Schema,
        options: &DefaultOptions,
    ) -> Result<Option<Value>, DeriveError> {
        let node = self.introspect(schema)?;
        derive_defaults(&node, options)
    }

    fn create_partial_schema(&self, schema: &Schema) -> Result<SchemaNode, DeriveError> {
        let node = self.introspect(schema)?;
        derive_partial(&node)
    }

    fn create_meta_state(
        &self,
        schema: &Schema,
        options: &DefaultOptions,
    ) -> Result<MetaNode, DeriveError> {
        let node = self.introspect(schema)?;
        Ok(create_meta_state(&node, options))
    }

    /// Resynchronize `meta` with `value`; returns whether anything changed.
    fn sync_meta_state(
        &self,
        meta: &mut MetaNode,
        value: &Value,
        schema: &Schema,
        options: &DefaultOptions,
    ) -> Result<bool, DeriveError> {
        let node = self.introspect(schema)?;
        Ok(sync_meta_state(meta, Some(value), &node, options))
    }

    /// Validate synchronously against the full schema.
    fn validate(&self, schema: &Schema, value: &Value) -> Result<ValidationOutcome, ValidationError> {
        settle_now(self.vendor(), self.parse(schema, value)?)
    }

    /// Validate synchronously against the derived partial schema.
    fn validate_partial(
        &self,
        schema: &Schema,
        value: &Value,
    ) -> Result<ValidationOutcome, ValidationError> {
        run_partial(self, schema, None, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_constructors() {
        let native = Schema::native(SchemaNode::string());
        assert_eq!(native.vendor(), Some(NATIVE_VENDOR));
        assert!(native.as_node().is_some());

        let doc = Schema::document(json!({"type": "string"}));
        assert_eq!(doc.vendor(), None);
        assert_eq!(doc.as_document(), Some(&json!({"type": "string"})));

        let tagged = Schema::tagged(JSON_SCHEMA_VENDOR, SchemaBody::Document(json!(true)));
        assert_eq!(tagged.vendor(), Some("json-schema"));
    }

    #[test]
    fn test_shared_derivations_agree_on_array_lengths() {
        let adapter = crate::native::NativeAdapter;
        let schema = Schema::native(SchemaNode::object([
            ("slots", SchemaNode::array_of_length(SchemaNode::boolean(), 2)),
            ("tags", SchemaNode::array(SchemaNode::string()).with_default(json!(["x"]))),
        ]));
        let options = DefaultOptions {
            arrays: formwork_core::ArrayStrategy::Flat(formwork_core::ArrayMethod::Populate),
            ..DefaultOptions::default()
        };
        let value = adapter.create_default_values(&schema, &options).unwrap().unwrap();
        assert_eq!(value, json!({"slots": [false, false], "tags": ["x"]}));

        let mut meta = adapter.create_meta_state(&schema, &options).unwrap();
        assert_eq!(meta.field("slots").and_then(|m| m.items()).map(<[_]>::len), Some(2));
        assert_eq!(meta.field("tags").and_then(|m| m.items()).map(<[_]>::len), Some(1));
        assert!(!adapter.sync_meta_state(&mut meta, &value, &schema, &options).unwrap());
        assert!(adapter.create_partial_schema(&schema).is_ok());
    }

    #[tokio::test]
    async fn test_parse_outcome_resolves() {
        let ready = ParseOutcome::Ready(Ok(json!(1)));
        assert!(!ready.is_deferred());
        assert_eq!(ready.resolve().await, Ok(json!(1)));

        let deferred = ParseOutcome::deferred(async { Ok(json!("later")) });
        assert!(deferred.is_deferred());
        assert_eq!(deferred.resolve().await, Ok(json!("later")));
    }
}
