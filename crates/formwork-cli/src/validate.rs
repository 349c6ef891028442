//! # Validate Subcommand
//!
//! Validates a value file against a schema file and prints either the
//! parsed value or the error tree.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use formwork_schema::{load_document, AdapterRegistry, ValidationOutcome};

use crate::common::{load_schema, write_json};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Value file (JSON or YAML).
    #[arg(long)]
    pub value: PathBuf,

    /// Validate against the derived partial schema.
    #[arg(long)]
    pub partial: bool,
}

/// Returns whether the value is valid.
pub fn run(args: &ValidateArgs, registry: &AdapterRegistry, out: &mut impl Write) -> anyhow::Result<bool> {
    let schema = load_schema(&args.schema)?;
    let value = load_document(&args.value)?;
    let validator = registry.validator(schema)?;
    let outcome = if args.partial {
        validator.validate_partial(&value)?
    } else {
        validator.validate(&value)?
    };
    tracing::debug!(vendor = validator.vendor(), valid = outcome.is_valid(), "validated value");
    match outcome {
        ValidationOutcome::Valid(parsed) => {
            write_json(out, &parsed)?;
            Ok(true)
        }
        ValidationOutcome::Invalid(errors) => {
            write_json(out, &errors)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::{file, PERSON_YAML};
    use serde_json::{json, Value};

    fn validate(value: &str, partial: bool) -> (bool, Value) {
        let dir = tempfile::tempdir().unwrap();
        let args = ValidateArgs {
            schema: file(&dir, "person.yaml", PERSON_YAML),
            value: file(&dir, "value.json", value),
            partial,
        };
        let mut out = Vec::new();
        let valid = run(&args, &AdapterRegistry::with_builtin(), &mut out).unwrap();
        (valid, serde_json::from_slice(&out).unwrap())
    }

    #[test]
    fn test_valid_value_is_echoed() {
        let (valid, out) = validate(r#"{"name": "Ada", "age": 36, "tags": []}"#, false);
        assert!(valid);
        assert_eq!(out, json!({"name": "Ada", "age": 36, "tags": []}));
    }

    #[test]
    fn test_invalid_value_prints_error_tree() {
        let (valid, out) = validate(r#"{"name": "Ada", "tags": ["x", 2]}"#, false);
        assert!(!valid);
        assert_eq!(out["age"]["error"], "Required");
        assert!(out["tags"]["items"][1]["error"].is_string());
        assert!(out["tags"]["items"][0].is_null());
    }

    #[test]
    fn test_partial_flag_relaxes_required_fields() {
        let (valid, _) = validate(r#"{"tags": ["x"]}"#, true);
        assert!(valid);
        let (valid, out) = validate(r#"{"age": 0}"#, true);
        assert!(!valid);
        assert!(out["age"]["error"].is_string());
    }
}
