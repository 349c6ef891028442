//! # Error Types — Derivation, Registry, Validation, Configuration
//!
//! ## Design
//!
//! - Derivation failures are configuration errors: an unsupported kind
//!   reached a deriver. They carry the kind name and the schema path so the
//!   schema author can find the offending node.
//! - Validation failures are never errors. They are the data value
//!   `ValidationOutcome::Invalid`. [`ValidationError`] covers only usage and
//!   setup problems around a validation call.
//! - Registry errors are startup problems, reported once.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use formwork_core::{OptionsError, SchemaModelError};

/// A deriver cannot handle the schema it was given.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeriveError {
    /// The kind has no partial form.
    #[error("cannot derive a partial schema for {kind} at {path}")]
    PartialUnsupported {
        /// Kind name of the offending node.
        kind: &'static str,
        /// Schema path of the offending node.
        path: String,
    },

    /// Only discriminated unions have a partial form.
    #[error("cannot derive a partial schema for a union without a discriminator at {path}")]
    UndiscriminatedUnion {
        /// Schema path of the offending union.
        path: String,
    },

    /// A required node has neither a declared default nor a derivable one.
    #[error("non-optional node at {path} has no default value")]
    NonOptionalWithoutDefault {
        /// Schema path of the offending node.
        path: String,
    },

    /// A vendor schema could not be mapped onto the node model.
    #[error("cannot introspect {vendor} schema at {path}: {reason}")]
    Introspection {
        /// Adapter vendor tag.
        vendor: String,
        /// Location inside the vendor document.
        path: String,
        /// What was wrong.
        reason: String,
    },

    /// A rebuilt node violates a construction-time invariant.
    #[error("invalid schema model: {0}")]
    Model(#[from] SchemaModelError),
}

/// Adapter registration or lookup failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No registered adapter claims the schema.
    #[error("no adapter registered for schema (vendor: {})", vendor.as_deref().unwrap_or("<untagged>"))]
    NoAdapter {
        /// The schema's vendor tag, if it carried one.
        vendor: Option<String>,
    },

    /// Another adapter already owns this vendor tag.
    #[error("adapter for vendor '{vendor}' is already registered")]
    DuplicateVendor {
        /// The contested vendor tag.
        vendor: String,
    },

    /// The process-wide registry was installed twice.
    #[error("global adapter registry is already installed")]
    AlreadyInstalled,

    /// The process-wide registry was read before installation.
    #[error("global adapter registry has not been installed")]
    NotInstalled,
}

/// A validation call could not run.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The validator returned a deferred result to a synchronous caller.
    #[error("validator for vendor '{vendor}' is asynchronous; use the async variant")]
    Deferred {
        /// Vendor whose validator deferred.
        vendor: String,
    },

    /// An array variant was called with a non-array value.
    #[error("expected an array value, received {received}")]
    ExpectedArray {
        /// JSON type of the received value.
        received: &'static str,
    },

    /// The vendor validator could not be compiled.
    #[error("cannot build {vendor} validator: {reason}")]
    SchemaBuild {
        /// Adapter vendor tag.
        vendor: String,
        /// Compiler message.
        reason: String,
    },

    /// Deriving the schema to validate against failed.
    #[error(transparent)]
    Derive(#[from] DeriveError),

    /// No adapter could be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Engine configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// JSON syntax or shape error.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML syntax or shape error.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The options are well-formed but inconsistent.
    #[error("invalid default options: {0}")]
    Options(#[from] OptionsError),
}

// ─── Schema paths for diagnostics ────────────────────────────────────

/// Dotted location of a node inside a schema tree, e.g. `tags[].label`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SchemaPath(String);

impl SchemaPath {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    pub(crate) fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    pub(crate) fn element(&self) -> Self {
        Self(format!("{}[]", self.0))
    }

    pub(crate) fn step(&self, label: &str) -> Self {
        Self(format!("{}<{label}>", self.0))
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}
