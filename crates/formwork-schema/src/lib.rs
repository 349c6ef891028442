//! # formwork-schema — Derivation, Validation & Adapters
//!
//! Everything that needs a schema: the default-value and partial-schema
//! derivers, the validation executor with its error normalizer, and the
//! adapter registry that binds schema vendors to those operations.
//!
//! ## Derivers
//!
//! - [`derive_defaults`] builds the initial value tree for a node, driven
//!   by [`DefaultOptions`](formwork_core::DefaultOptions).
//! - [`derive_partial`] builds the relaxed sibling schema used while the
//!   user is still typing. Kinds without a partial form are reported as
//!   [`DeriveError`]s, never passed through.
//!
//! ## Validation (`validate`, `normalize`)
//!
//! Adapters report flat, path-addressed issues. [`normalize_issues`] folds
//! them into an [`ErrorTree`](formwork_core::ErrorTree), first message per
//! node. Invalid input is the data value [`ValidationOutcome::Invalid`].
//!
//! ## Adapters (`adapter`, `registry`)
//!
//! - [`NativeAdapter`]: `SchemaNode` trees, validated by [`parse_native`].
//! - [`JsonSchemaAdapter`]: JSON Schema documents, validated by the
//!   `jsonschema` crate.
//!
//! The process-wide [`AdapterRegistry`] is installed once at start-up.
//!
//! ## Crate Policy
//!
//! - Depends on `formwork-core` and `formwork-state` internally.
//! - Library code logs through `tracing` and never prints.

pub mod adapter;
pub mod config;
pub mod defaults;
pub mod error;
pub mod json_schema;
pub mod native;
pub mod normalize;
pub mod partial;
pub mod registry;
pub mod validate;

pub use adapter::{
    ParseFuture, ParseOutcome, ParseResult, Schema, SchemaAdapter, SchemaBody,
    JSON_SCHEMA_VENDOR, NATIVE_VENDOR,
};
pub use config::{load_document, EngineConfig};
pub use defaults::derive_defaults;
pub use error::{ConfigError, DeriveError, RegistryError, ValidationError};
pub use json_schema::{export_json_schema, introspect_document, JsonSchemaAdapter};
pub use native::{parse_native, NativeAdapter, NATIVE_DOCUMENT_KEY};
pub use normalize::{fold_into, normalize_issues};
pub use partial::derive_partial;
pub use registry::AdapterRegistry;
pub use validate::{ValidationOutcome, Validator};
