//! # Partial Subcommand
//!
//! Prints the partial schema derived from a schema, as a native node
//! document that the other subcommands accept back.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use formwork_schema::{AdapterRegistry, NATIVE_DOCUMENT_KEY};

use crate::common::{load_schema, write_json};

/// Arguments for the partial subcommand.
#[derive(Args, Debug)]
pub struct PartialArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,
}

pub fn run(args: &PartialArgs, registry: &AdapterRegistry, out: &mut impl Write) -> anyhow::Result<()> {
    let schema = load_schema(&args.schema)?;
    let partial = registry.resolve(&schema)?.create_partial_schema(&schema)?;
    let mut document = serde_json::to_value(&partial)?;
    if let Value::Object(fields) = &mut document {
        fields.insert(NATIVE_DOCUMENT_KEY.to_string(), Value::from(1));
    }
    write_json(out, &document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::{file, PERSON_YAML};

    #[test]
    fn test_partial_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AdapterRegistry::with_builtin();
        let mut out = Vec::new();
        run(
            &PartialArgs {
                schema: file(&dir, "person.yaml", PERSON_YAML),
            },
            &registry,
            &mut out,
        )
        .unwrap();
        let document: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(document["kind"], "object");
        assert_eq!(document["shape"]["name"]["optional"], true);
        assert_eq!(document["$formwork"], 1);

        let reread = file(&dir, "partial.json", &String::from_utf8(out).unwrap());
        let mut again = Vec::new();
        run(&PartialArgs { schema: reread }, &registry, &mut again).unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&again).unwrap(), document);
    }

    #[test]
    fn test_unsupported_schema_fails() {
        let dir = tempfile::tempdir().unwrap();
        let schema = file(&dir, "pair.json", r#"{"type": "array", "prefixItems": [{"type": "string"}]}"#);
        let err = run(&PartialArgs { schema }, &AdapterRegistry::with_builtin(), &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("tuple"), "{err}");
    }
}
