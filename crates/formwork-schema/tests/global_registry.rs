//! # Process-Wide Registry Lifecycle
//!
//! Runs as its own test binary so the one-shot global registry is not
//! shared with other tests.

use serde_json::json;

use formwork_core::{Check, SchemaNode};
use formwork_schema::registry::{global, global_or_builtin, install};
use formwork_schema::validate::{validate, validate_partial};
use formwork_schema::{AdapterRegistry, RegistryError, Schema, ValidationError};

#[test]
fn test_install_once_then_read() {
    let schema = Schema::native(SchemaNode::object([(
        "code",
        SchemaNode::string().check(Check::MinLength(3), Some("Too short")),
    )]));

    assert_eq!(global().unwrap_err(), RegistryError::NotInstalled);
    assert!(matches!(
        validate(&schema, &json!({"code": "abc"})),
        Err(ValidationError::Registry(RegistryError::NotInstalled))
    ));

    install(AdapterRegistry::with_builtin()).unwrap();
    assert_eq!(
        install(AdapterRegistry::new()),
        Err(RegistryError::AlreadyInstalled)
    );
    assert_eq!(global().unwrap().len(), 2);
    assert_eq!(global_or_builtin().len(), 2);

    assert!(validate(&schema, &json!({"code": "abc"})).unwrap().is_valid());
    let outcome = validate(&schema, &json!({"code": "a"})).unwrap();
    assert_eq!(
        outcome.errors().unwrap().field("code").unwrap().error.as_deref(),
        Some("Too short")
    );
    assert!(validate_partial(&schema, &json!({})).unwrap().is_valid());
}
