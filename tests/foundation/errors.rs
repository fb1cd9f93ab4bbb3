//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use rulecraft_foundation::{BindError, EntityId, Error, ErrorKind, ResolutionError, Type};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Integer, Type::String);
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let msg = format!("{err}");
    assert!(msg.contains("integer"));
    assert!(msg.contains("string"));
}

#[test]
fn error_entity_not_found() {
    let err = Error::entity_not_found("user", EntityId::new(42));
    assert!(matches!(err.kind, ErrorKind::EntityNotFound { .. }));
    assert!(format!("{err}").contains("42"));
}

#[test]
fn resolution_errors_convert() {
    let err: Error = ResolutionError::UndefinedVariable("node".to_string()).into();
    assert_eq!(
        err.as_resolution(),
        Some(&ResolutionError::UndefinedVariable("node".to_string()))
    );
    assert!(err.as_bind().is_none());
    assert!(format!("{err}").contains("undefined variable: node"));
}

#[test]
fn bind_errors_convert() {
    let err: Error = BindError::MissingContextValue {
        name: "node".to_string(),
    }
    .into();
    assert!(matches!(
        err.as_bind(),
        Some(BindError::MissingContextValue { name }) if name == "node"
    ));
}

#[test]
fn plugin_errors_name_the_plugin() {
    let err = Error::plugin("rules_data_set", "boom");
    assert_eq!(format!("{err}"), "plugin rules_data_set failed: boom");
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn frames_are_pushed_innermost_first() {
    let err = Error::plugin("rules_test_log", "boom")
        .with_frame("action rules_test_log")
        .with_frame("rule")
        .with_source("component");

    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("component"));
    assert_eq!(context.stack, ["action rules_test_log", "rule"]);
    let rendered = context.to_string();
    assert!(rendered.starts_with("at component"));
    assert!(rendered.contains("  in rule"));
}

#[test]
fn error_without_context() {
    let err = Error::invalid_configuration("bad");
    assert!(err.context.is_none());
    assert_eq!(format!("{err}"), "invalid configuration: bad");
}
