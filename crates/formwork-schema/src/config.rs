//! # Engine Configuration
//!
//! Process-wide default-derivation options, loaded from a JSON or YAML file
//! and validated on load. Per-call [`OptionsOverride`]s are merged on top
//! with [`EngineConfig::with_overrides`].
//!
//! ```yaml
//! defaults:
//!   primitives: sensible
//!   arrays:
//!     method: populate
//!     length: 2
//!     depth: { max: 1, fallback: empty }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use formwork_core::{DefaultOptions, OptionsOverride};

use crate::error::ConfigError;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub defaults: DefaultOptions,
}

impl EngineConfig {
    /// Load from a file; `.yaml` and `.yml` are YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(self.defaults.validate()?)
    }

    /// The defaults with `overrides` applied.
    pub fn with_overrides(&self, overrides: &OptionsOverride) -> Result<DefaultOptions, ConfigError> {
        let merged = self.defaults.merge(overrides);
        merged.validate()?;
        Ok(merged)
    }
}

/// Read a JSON or YAML document, chosen by extension.
pub fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let content = read(path)?;
    if is_yaml(path) {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}
