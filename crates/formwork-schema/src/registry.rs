//! # Adapter Registry
//!
//! Maps schemas to the adapter that owns them. Resolution tries the
//! schema's vendor tag first, then each adapter's structural probe in
//! registration order.
//!
//! The process-wide registry is built once during start-up and installed
//! with [`install`]; afterwards it is read-only. Lookups before
//! installation fail with [`RegistryError::NotInstalled`].

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::adapter::{Schema, SchemaAdapter, JSON_SCHEMA_VENDOR, NATIVE_VENDOR};
use crate::error::RegistryError;
use crate::json_schema::JsonSchemaAdapter;
use crate::native::NativeAdapter;
use crate::validate::Validator;

static GLOBAL: OnceLock<AdapterRegistry> = OnceLock::new();

/// An ordered set of adapters, unique by vendor tag.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn SchemaAdapter>>,
    by_vendor: BTreeMap<String, usize>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("vendors", &self.vendors())
            .finish()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the native and JSON Schema adapters.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.push(NATIVE_VENDOR, Arc::new(NativeAdapter));
        registry.push(JSON_SCHEMA_VENDOR, Arc::new(JsonSchemaAdapter::new()));
        registry
    }

    /// Add an adapter. Its vendor tag must not be taken.
    pub fn register(&mut self, adapter: Arc<dyn SchemaAdapter>) -> Result<(), RegistryError> {
        let vendor = adapter.vendor().to_string();
        if self.by_vendor.contains_key(&vendor) {
            return Err(RegistryError::DuplicateVendor { vendor });
        }
        self.push(&vendor, adapter);
        Ok(())
    }

    /// Append an adapter whose vendor tag is known to be free.
    fn push(&mut self, vendor: &str, adapter: Arc<dyn SchemaAdapter>) {
        tracing::debug!(vendor, "registered schema adapter");
        self.by_vendor.insert(vendor.to_string(), self.adapters.len());
        self.adapters.push(adapter);
    }

    /// Find the adapter for `schema`.
    pub fn resolve(&self, schema: &Schema) -> Result<&Arc<dyn SchemaAdapter>, RegistryError> {
        if let Some(vendor) = schema.vendor() {
            if let Some(adapter) = self.adapters.iter().find(|a| a.supports_vendor(vendor)) {
                tracing::debug!(vendor, "resolved adapter by vendor tag");
                return Ok(adapter);
            }
        }
        match self.adapters.iter().find(|a| a.is_compatible(schema)) {
            Some(adapter) => {
                tracing::debug!(vendor = adapter.vendor(), "resolved adapter by structural probe");
                Ok(adapter)
            }
            None => Err(RegistryError::NoAdapter {
                vendor: schema.vendor().map(str::to_string),
            }),
        }
    }

    /// A [`Validator`] bound to `schema` and its adapter.
    pub fn validator(&self, schema: Schema) -> Result<Validator, RegistryError> {
        let adapter = Arc::clone(self.resolve(&schema)?);
        Ok(Validator::new(adapter, schema))
    }

    pub fn get(&self, vendor: &str) -> Option<&Arc<dyn SchemaAdapter>> {
        self.by_vendor.get(vendor).map(|&index| &self.adapters[index])
    }

    /// Vendor tags in registration order.
    pub fn vendors(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.vendor()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Install the process-wide registry. Succeeds once.
pub fn install(registry: AdapterRegistry) -> Result<(), RegistryError> {
    let vendors = registry.vendors().join(", ");
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    tracing::debug!(vendors = %vendors, "installed global adapter registry");
    Ok(())
}

/// The installed process-wide registry.
pub fn global() -> Result<&'static AdapterRegistry, RegistryError> {
    GLOBAL.get().ok_or(RegistryError::NotInstalled)
}

/// The installed registry, installing the built-in one if none was.
pub fn global_or_builtin() -> &'static AdapterRegistry {
    GLOBAL.get_or_init(AdapterRegistry::with_builtin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SchemaBody;
    use formwork_core::SchemaNode;
    use serde_json::json;

    #[test]
    fn test_builtin_vendors_in_order() {
        let registry = AdapterRegistry::with_builtin();
        assert_eq!(registry.vendors(), vec![NATIVE_VENDOR, JSON_SCHEMA_VENDOR]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("json-schema").is_some());
        assert!(registry.get("yup").is_none());
    }

    #[test]
    fn test_duplicate_vendor_is_rejected() {
        let mut registry = AdapterRegistry::with_builtin();
        assert_eq!(
            registry.register(Arc::new(NativeAdapter)),
            Err(RegistryError::DuplicateVendor {
                vendor: "formwork".into()
            })
        );
        assert_eq!(
            registry.register(Arc::new(JsonSchemaAdapter::new())),
            Err(RegistryError::DuplicateVendor {
                vendor: JSON_SCHEMA_VENDOR.into()
            })
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_builtin_tags_match_adapter_vendors() {
        let registry = AdapterRegistry::with_builtin();
        for vendor in [NATIVE_VENDOR, JSON_SCHEMA_VENDOR] {
            assert_eq!(registry.get(vendor).map(|adapter| adapter.vendor()), Some(vendor));
        }
    }

    #[test]
    fn test_resolution_by_tag_then_probe() {
        let registry = AdapterRegistry::with_builtin();
        let native = Schema::native(SchemaNode::string());
        assert_eq!(registry.resolve(&native).unwrap().vendor(), NATIVE_VENDOR);

        let probed = Schema::document(json!({"type": "object", "properties": {}}));
        assert_eq!(registry.resolve(&probed).unwrap().vendor(), JSON_SCHEMA_VENDOR);

        let marked = Schema::document(json!({"$formwork": 1, "kind": "string"}));
        assert_eq!(registry.resolve(&marked).unwrap().vendor(), NATIVE_VENDOR);

        let unknown_tag = Schema::tagged("yup", SchemaBody::Document(json!({"type": "string"})));
        assert_eq!(registry.resolve(&unknown_tag).unwrap().vendor(), JSON_SCHEMA_VENDOR);
    }

    #[test]
    fn test_unresolvable_schema() {
        let registry = AdapterRegistry::with_builtin();
        let err = registry
            .resolve(&Schema::tagged("yup", SchemaBody::Document(json!(42))))
            .err();
        assert_eq!(err, Some(RegistryError::NoAdapter { vendor: Some("yup".into()) }));
        assert!(AdapterRegistry::new().is_empty());
    }
}
