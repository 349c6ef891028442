//! Shared file loading and output helpers.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use formwork_schema::{load_document, EngineConfig, Schema};

/// Load a schema file as an untagged document.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let document = load_document(path)
        .with_context(|| format!("cannot load schema '{}'", path.display()))?;
    Ok(Schema::document(document))
}

/// Load the engine config, or the default one when no path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("cannot load config '{}'", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_schema_names_the_file() {
        let err = load_schema(Path::new("/nonexistent/schema.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schema.json"));
    }

    #[test]
    fn test_no_config_is_default() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_write_json_appends_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
