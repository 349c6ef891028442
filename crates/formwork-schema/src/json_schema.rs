//! # JSON Schema Adapter
//!
//! Binds JSON Schema documents (draft 2020-12) to the engine.
//!
//! ## Introspection
//!
//! Documents map onto the node model keyword by keyword: `type` (a type
//! array containing `"null"` makes the node nullable), `properties` with
//! `required`, `items`, `prefixItems` as a tuple, `const`, `enum`,
//! `default`, `format: date | date-time`, `oneOf` (a discriminated union
//! when every variant requires the same `const` property), `anyOf`,
//! `allOf` as an intersection, and `additionalProperties`-only objects as
//! records. Local `$ref`s are inlined; a reference back into a schema that
//! is still being expanded becomes a lazy node.
//!
//! ## Validation
//!
//! Validation compiles the document with the `jsonschema` crate. Nodes,
//! including derived partial schemas, are first exported back to a
//! document. Remote references resolve only against documents registered
//! with [`JsonSchemaAdapter::with_resource`]; nothing is fetched over the
//! network.
//!
//! Custom check messages and transforms have no JSON Schema form. They are
//! dropped on export, so issue messages are the validator's own.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri};
use serde_json::{json, Map, Value};

use formwork_core::{json_type_name, Check, Issue, NodeKind, PathSegment, SchemaNode};

use crate::adapter::{ParseOutcome, Schema, SchemaAdapter, SchemaBody, JSON_SCHEMA_VENDOR};
use crate::error::{DeriveError, ValidationError};

/// Keywords whose presence marks an untagged document as JSON Schema.
const PROBE_KEYWORDS: [&str; 5] = ["$schema", "type", "properties", "oneOf", "anyOf"];

// ─── Reference retrieval ─────────────────────────────────────────────

/// Resolves remote `$ref` URIs against registered documents only.
struct LocalRetriever {
    resources: Arc<HashMap<String, Value>>,
}

impl Retrieve for LocalRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match self.resources.get(uri.as_str()) {
            Some(document) => Ok(document.clone()),
            None => Err(format!("reference '{}' is not registered", uri.as_str()).into()),
        }
    }
}

// ─── Adapter ─────────────────────────────────────────────────────────

/// The adapter for JSON Schema documents.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaAdapter {
    resources: Arc<HashMap<String, Value>>,
}

impl JsonSchemaAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `document` available to `$ref`s pointing at `uri`.
    pub fn with_resource(mut self, uri: impl Into<String>, document: Value) -> Self {
        Arc::make_mut(&mut self.resources).insert(uri.into(), document);
        self
    }

    fn compile(&self, document: &Value) -> Result<jsonschema::Validator, ValidationError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(LocalRetriever {
            resources: Arc::clone(&self.resources),
        });
        opts.build(document).map_err(|e| ValidationError::SchemaBuild {
            vendor: JSON_SCHEMA_VENDOR.to_string(),
            reason: e.to_string(),
        })
    }

    fn run(&self, document: &Value, value: &Value) -> Result<ParseOutcome, ValidationError> {
        let validator = self.compile(document)?;
        let issues: Vec<Issue> = validator
            .iter_errors(value)
            .map(|e| to_issue(&e, value))
            .collect();
        Ok(ParseOutcome::Ready(if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }))
    }
}

impl SchemaAdapter for JsonSchemaAdapter {
    fn vendor(&self) -> &str {
        JSON_SCHEMA_VENDOR
    }

    fn is_compatible(&self, schema: &Schema) -> bool {
        let Some(Value::Object(document)) = schema.as_document() else {
            return false;
        };
        PROBE_KEYWORDS.iter().any(|keyword| document.contains_key(*keyword))
    }

    fn introspect<'s>(&self, schema: &'s Schema) -> Result<Cow<'s, SchemaNode>, DeriveError> {
        match schema.body() {
            SchemaBody::Node(node) => Ok(Cow::Borrowed(node)),
            SchemaBody::Document(document) => introspect_document(document).map(Cow::Owned),
        }
    }

    fn parse(&self, schema: &Schema, value: &Value) -> Result<ParseOutcome, ValidationError> {
        match schema.body() {
            SchemaBody::Document(document) => self.run(document, value),
            SchemaBody::Node(node) => self.run(&export_json_schema(node), value),
        }
    }

    fn parse_node(
        &self,
        node: &SchemaNode,
        value: &Value,
    ) -> Result<ParseOutcome, ValidationError> {
        self.run(&export_json_schema(node), value)
    }
}

// ─── Issues ──────────────────────────────────────────────────────────

fn to_issue(error: &jsonschema::ValidationError<'_>, instance: &Value) -> Issue {
    let mut path = pointer_to_path(&error.instance_path.to_string(), instance);
    if let ValidationErrorKind::Required { property } = &error.kind {
        if let Some(name) = property.as_str() {
            path.push(PathSegment::Key(name.to_string()));
            return Issue::new(path, "Required");
        }
    }
    Issue::new(path, error.to_string())
}

/// Split a JSON pointer into path segments. A numeric token is an index
/// only where the instance has an array.
fn pointer_to_path(pointer: &str, instance: &Value) -> Vec<PathSegment> {
    let mut path = Vec::new();
    let Some(rest) = pointer.strip_prefix('/') else {
        return path;
    };
    let mut current = Some(instance);
    for raw in rest.split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        let segment = match (current, token.parse::<usize>()) {
            (Some(Value::Array(_)), Ok(index)) => PathSegment::Index(index),
            _ => PathSegment::Key(token),
        };
        current = current.and_then(|value| match &segment {
            PathSegment::Index(index) => value.get(*index),
            PathSegment::Key(key) => value.get(key.as_str()),
        });
        path.push(segment);
    }
    path
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

// ─── Introspection ───────────────────────────────────────────────────

/// Map a JSON Schema document onto the node model.
pub fn introspect_document(document: &Value) -> Result<SchemaNode, DeriveError> {
    Introspector::new(document).node(document, "")
}

struct Introspector<'d> {
    root: &'d Value,
    /// References currently being expanded.
    active: Vec<String>,
}

impl<'d> Introspector<'d> {
    fn new(root: &'d Value) -> Self {
        Self {
            root,
            active: Vec::new(),
        }
    }

    fn fail(&self, at: &str, reason: impl Into<String>) -> DeriveError {
        DeriveError::Introspection {
            vendor: JSON_SCHEMA_VENDOR.to_string(),
            path: format!("#{at}"),
            reason: reason.into(),
        }
    }

    fn node(&mut self, document: &'d Value, at: &str) -> Result<SchemaNode, DeriveError> {
        let keywords = match document {
            Value::Bool(true) => return Ok(SchemaNode::any()),
            Value::Bool(false) => return Ok(SchemaNode::new(NodeKind::Never)),
            Value::Object(keywords) => keywords,
            other => {
                return Err(self.fail(
                    at,
                    format!("expected a schema, found {}", json_type_name(other)),
                ))
            }
        };
        let node = match keywords.get("$ref").and_then(Value::as_str) {
            Some(reference) => self.reference(reference, at)?,
            None => self.keywords(keywords, at)?,
        };
        Ok(match keywords.get("default") {
            Some(default) => node.with_default(default.clone()),
            None => node,
        })
    }

    fn reference(&mut self, reference: &str, at: &str) -> Result<SchemaNode, DeriveError> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(self.fail(at, format!("remote reference '{reference}' cannot be introspected")));
        };
        if self.active.iter().any(|active| active == reference) {
            let root = Arc::new(self.root.clone());
            let reference = reference.to_string();
            return Ok(SchemaNode::lazy(move || {
                Introspector::new(&root)
                    .reference(&reference, "")
                    .unwrap_or_else(|err| {
                        tracing::warn!(error = %err, "recursive reference no longer resolves");
                        SchemaNode::any()
                    })
            }));
        }
        let Some(target) = self.root.pointer(pointer) else {
            return Err(self.fail(at, format!("unresolved reference '{reference}'")));
        };
        self.active.push(reference.to_string());
        let node = self.node(target, pointer);
        self.active.pop();
        node
    }

    /// Follow local `$ref`s to the schema they name. Stops at remote,
    /// unresolved or cyclic references.
    fn resolve_local(&self, mut schema: &'d Value) -> &'d Value {
        let mut visited: Vec<&str> = Vec::new();
        while let Some(pointer) = schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|reference| reference.strip_prefix('#'))
        {
            if visited.contains(&pointer) {
                break;
            }
            let Some(target) = self.root.pointer(pointer) else {
                break;
            };
            visited.push(pointer);
            schema = target;
        }
        schema
    }

    fn list(&self, value: &'d Value, at: &str, keyword: &str) -> Result<&'d [Value], DeriveError> {
        match value.as_array() {
            Some(items) if !items.is_empty() => Ok(items),
            _ => Err(self.fail(at, format!("'{keyword}' must be a non-empty array"))),
        }
    }

    fn keywords(&mut self, keywords: &'d Map<String, Value>, at: &str) -> Result<SchemaNode, DeriveError> {
        if let Some(value) = keywords.get("const") {
            return Ok(SchemaNode::literal(value.clone()));
        }
        if let Some(values) = keywords.get("enum") {
            let values = self.list(values, at, "enum")?;
            return Ok(SchemaNode::enumeration(values.iter().cloned()));
        }
        if let Some(variants) = keywords.get("oneOf") {
            let variants = self.list(variants, at, "oneOf")?;
            return self.one_of(variants, at);
        }
        if let Some(variants) = keywords.get("anyOf") {
            let variants = self.list(variants, at, "anyOf")?;
            let nodes = self.each(variants, &format!("{at}/anyOf"))?;
            return Ok(SchemaNode::union(nodes));
        }
        if let Some(parts) = keywords.get("allOf") {
            let parts = self.list(parts, at, "allOf")?;
            let mut nodes = self.each(parts, &format!("{at}/allOf"))?.into_iter();
            let first = nodes.next().unwrap_or_else(SchemaNode::any);
            return Ok(nodes.fold(first, SchemaNode::intersection));
        }

        match keywords.get("type") {
            None => self.untyped(keywords, at),
            Some(Value::String(name)) => self.typed(name, keywords, at),
            Some(Value::Array(names)) => {
                let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
                let nullable = names.contains(&"null");
                let concrete: Vec<&str> = names.into_iter().filter(|name| *name != "null").collect();
                let node = match concrete.as_slice() {
                    [] => return Ok(SchemaNode::new(NodeKind::Null)),
                    [single] => self.typed(single, keywords, at)?,
                    many => {
                        let mut variants = Vec::with_capacity(many.len());
                        for name in many {
                            variants.push(self.typed(name, keywords, at)?);
                        }
                        SchemaNode::union(variants)
                    }
                };
                Ok(if nullable { node.nullable() } else { node })
            }
            Some(other) => Err(self.fail(
                at,
                format!("'type' must be a string or array, found {}", json_type_name(other)),
            )),
        }
    }

    fn each(&mut self, documents: &'d [Value], at: &str) -> Result<Vec<SchemaNode>, DeriveError> {
        documents
            .iter()
            .enumerate()
            .map(|(index, document)| self.node(document, &format!("{at}/{index}")))
            .collect()
    }

    fn typed(&mut self, name: &str, keywords: &'d Map<String, Value>, at: &str) -> Result<SchemaNode, DeriveError> {
        match name {
            "string" => Ok(string_node(keywords)),
            "number" => Ok(number_node(SchemaNode::number(), keywords)),
            "integer" => Ok(number_node(SchemaNode::integer(), keywords)),
            "boolean" => Ok(SchemaNode::boolean()),
            "null" => Ok(SchemaNode::new(NodeKind::Null)),
            "object" => self.object(keywords, at),
            "array" => self.array(keywords, at),
            other => Err(self.fail(at, format!("unknown type '{other}'"))),
        }
    }

    fn untyped(&mut self, keywords: &'d Map<String, Value>, at: &str) -> Result<SchemaNode, DeriveError> {
        if keywords.contains_key("properties") || keywords.contains_key("additionalProperties") {
            self.object(keywords, at)
        } else if keywords.contains_key("items") || keywords.contains_key("prefixItems") {
            self.array(keywords, at)
        } else {
            Ok(SchemaNode::any())
        }
    }

    fn object(&mut self, keywords: &'d Map<String, Value>, at: &str) -> Result<SchemaNode, DeriveError> {
        let required: Vec<&str> = keywords
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        match keywords.get("properties") {
            Some(Value::Object(properties)) => {
                let mut fields = Vec::with_capacity(properties.len());
                for (name, property) in properties {
                    let field =
                        self.node(property, &format!("{at}/properties/{}", escape_token(name)))?;
                    let field = if required.contains(&name.as_str()) {
                        field
                    } else {
                        field.optional()
                    };
                    fields.push((name.clone(), field));
                }
                Ok(SchemaNode::object(fields))
            }
            Some(_) => Err(self.fail(at, "'properties' must be an object")),
            None => match keywords.get("additionalProperties") {
                Some(Value::Bool(false)) => Ok(SchemaNode::object(Vec::<(String, SchemaNode)>::new())),
                Some(values @ Value::Object(_)) => {
                    let value = self.node(values, &format!("{at}/additionalProperties"))?;
                    Ok(SchemaNode::record(SchemaNode::string(), value))
                }
                _ => Ok(SchemaNode::record(SchemaNode::string(), SchemaNode::any())),
            },
        }
    }

    fn array(&mut self, keywords: &'d Map<String, Value>, at: &str) -> Result<SchemaNode, DeriveError> {
        if let Some(prefix) = keywords.get("prefixItems") {
            let prefix = self.list(prefix, at, "prefixItems")?;
            return Ok(SchemaNode::tuple(self.each(prefix, &format!("{at}/prefixItems"))?));
        }
        let element = match keywords.get("items") {
            Some(items) => self.node(items, &format!("{at}/items"))?,
            None => SchemaNode::any(),
        };
        let min = usize_keyword(keywords, "minItems");
        let max = usize_keyword(keywords, "maxItems");
        let mut node = match (min, max) {
            (Some(min), Some(max)) if min == max => SchemaNode::array_of_length(element, min),
            _ => SchemaNode::array(element),
        };
        if let Some(min) = min {
            node = node.check(Check::MinItems(min), None::<String>);
        }
        if let Some(max) = max {
            node = node.check(Check::MaxItems(max), None::<String>);
        }
        Ok(node)
    }

    fn one_of(&mut self, variants: &'d [Value], at: &str) -> Result<SchemaNode, DeriveError> {
        let nodes = self.each(variants, &format!("{at}/oneOf"))?;
        let resolved: Vec<&Value> = variants.iter().map(|variant| self.resolve_local(variant)).collect();
        match shared_discriminator(&resolved) {
            Some(discriminator) => {
                tracing::debug!(discriminator = %discriminator, "oneOf mapped to a discriminated union");
                Ok(SchemaNode::discriminated_union(discriminator, nodes)?)
            }
            None => Ok(SchemaNode::union(nodes)),
        }
    }
}

/// The first property every variant requires with a `const` value.
fn shared_discriminator(variants: &[&Value]) -> Option<String> {
    let first = variants.first()?.get("properties")?.as_object()?;
    first
        .iter()
        .filter(|(_, property)| property.get("const").is_some())
        .map(|(name, _)| name)
        .find(|name| {
            variants.iter().all(|variant| {
                let pointer = format!("/properties/{}", escape_token(name));
                let has_const = variant
                    .pointer(&pointer)
                    .is_some_and(|property| property.get("const").is_some());
                let required = variant
                    .get("required")
                    .and_then(Value::as_array)
                    .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(name.as_str())));
                has_const && required
            })
        })
        .cloned()
}

fn usize_keyword(keywords: &Map<String, Value>, keyword: &str) -> Option<usize> {
    keywords
        .get(keyword)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn string_node(keywords: &Map<String, Value>) -> SchemaNode {
    let mut node = match keywords.get("format").and_then(Value::as_str) {
        Some("date" | "date-time") => SchemaNode::date(),
        _ => SchemaNode::string(),
    };
    if let Some(min) = usize_keyword(keywords, "minLength") {
        node = node.check(Check::MinLength(min), None::<String>);
    }
    if let Some(max) = usize_keyword(keywords, "maxLength") {
        node = node.check(Check::MaxLength(max), None::<String>);
    }
    node
}

fn number_node(mut node: SchemaNode, keywords: &Map<String, Value>) -> SchemaNode {
    if let Some(min) = keywords.get("minimum").and_then(Value::as_f64) {
        node = node.check(Check::Min(min), None::<String>);
    }
    if let Some(max) = keywords.get("maximum").and_then(Value::as_f64) {
        node = node.check(Check::Max(max), None::<String>);
    }
    match keywords.get("exclusiveMinimum").and_then(Value::as_f64) {
        Some(bound) if bound == 0.0 => node = node.check(Check::Positive, None::<String>),
        Some(bound) => tracing::debug!(bound, "exclusiveMinimum other than 0 is not introspected"),
        None => {}
    }
    node
}

// ─── Export ──────────────────────────────────────────────────────────

/// Export a node as a JSON Schema document.
///
/// Lazy nodes, transforms and custom checks export as `true`; kinds that
/// accept no JSON value export as `false`.
pub fn export_json_schema(node: &SchemaNode) -> Value {
    let mut schema = export_kind(node);
    if let (Some(default), Value::Object(keywords)) = (node.declared_default(), &mut schema) {
        keywords.insert("default".into(), default.resolve());
    }
    if node.is_nullable() {
        schema = json!({"anyOf": [schema, {"type": "null"}]});
    }
    schema
}

fn export_kind(node: &SchemaNode) -> Value {
    match node.kind() {
        NodeKind::String => with_checks(json!({"type": "string"}), node),
        NodeKind::Number => {
            let integral = node.checks().iter().any(|c| c.check == Check::Int);
            let name = if integral { "integer" } else { "number" };
            with_checks(json!({"type": name}), node)
        }
        NodeKind::Bigint => json!({"type": "integer"}),
        NodeKind::Boolean => json!({"type": "boolean"}),
        NodeKind::Date => json!({"type": "string", "format": "date-time"}),
        NodeKind::Null => json!({"type": "null"}),
        NodeKind::Any | NodeKind::Unknown | NodeKind::Catch { .. } => Value::Bool(true),
        NodeKind::Symbol | NodeKind::Undefined | NodeKind::Void | NodeKind::Never | NodeKind::Nan => {
            Value::Bool(false)
        }
        NodeKind::Transform(_) | NodeKind::Custom(_) | NodeKind::Lazy(_) => {
            tracing::debug!(kind = node.kind().name(), "exported as an unconstrained schema");
            Value::Bool(true)
        }
        NodeKind::Literal { value } => json!({"const": value}),
        NodeKind::Enum { values } => json!({"enum": values}),
        NodeKind::Object { shape } => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for (name, field) in shape {
                properties.insert(name.clone(), export_json_schema(field));
                if is_required(field) {
                    required.push(Value::String(name.clone()));
                }
            }
            json!({"type": "object", "properties": properties, "required": required})
        }
        NodeKind::Array { element, length } => {
            let mut schema = json!({"type": "array", "items": export_json_schema(element)});
            if let (Some(length), Value::Object(keywords)) = (length, &mut schema) {
                keywords.insert("minItems".into(), json!(length));
                keywords.insert("maxItems".into(), json!(length));
            }
            with_checks(schema, node)
        }
        NodeKind::Union {
            variants,
            discriminator,
        } => {
            let keyword = if discriminator.is_some() { "oneOf" } else { "anyOf" };
            let variants: Vec<Value> = variants.iter().map(export_json_schema).collect();
            let mut schema = Map::new();
            schema.insert(keyword.into(), Value::Array(variants));
            Value::Object(schema)
        }
        NodeKind::Pipe { input, .. } => export_json_schema(input),
        NodeKind::Tuple { items } => {
            let items: Vec<Value> = items.iter().map(export_json_schema).collect();
            json!({"type": "array", "prefixItems": items, "items": false, "minItems": items.len()})
        }
        NodeKind::Record { value, .. } | NodeKind::Map { value, .. } => {
            json!({"type": "object", "additionalProperties": export_json_schema(value)})
        }
        NodeKind::Set { element } => {
            json!({"type": "array", "items": export_json_schema(element), "uniqueItems": true})
        }
        NodeKind::Intersection { left, right } => {
            json!({"allOf": [export_json_schema(left), export_json_schema(right)]})
        }
        NodeKind::Promise { inner } | NodeKind::Readonly { inner } | NodeKind::NonOptional { inner } => {
            export_json_schema(inner)
        }
        NodeKind::Defaulted { inner, value } => {
            let mut schema = export_json_schema(inner);
            if let Value::Object(keywords) = &mut schema {
                keywords.insert("default".into(), value.clone());
            }
            schema
        }
    }
}

/// Whether an object field must be present.
fn is_required(field: &SchemaNode) -> bool {
    !field.is_optional()
        && field.declared_default().is_none()
        && !matches!(
            field.kind(),
            NodeKind::Defaulted { .. } | NodeKind::Catch { .. } | NodeKind::Undefined | NodeKind::Void
        )
}

fn with_checks(mut schema: Value, node: &SchemaNode) -> Value {
    let Value::Object(keywords) = &mut schema else {
        return schema;
    };
    for constraint in node.checks() {
        let (keyword, bound) = match constraint.check {
            Check::MinLength(n) => ("minLength", json!(n)),
            Check::MaxLength(n) => ("maxLength", json!(n)),
            Check::MinItems(n) => ("minItems", json!(n)),
            Check::MaxItems(n) => ("maxItems", json!(n)),
            Check::Positive => ("exclusiveMinimum", json!(0)),
            Check::NonNegative => ("minimum", json!(0)),
            Check::Min(n) => ("minimum", json!(n)),
            Check::Max(n) => ("maximum", json!(n)),
            Check::Int => continue,
        };
        keywords.insert(keyword.into(), bound);
    }
    schema
}
