//! Integration tests for entity type schemas
//!
//! Tests bundles, field lookup, and cardinality.

use rulecraft_foundation::Type;
use rulecraft_storage::{Cardinality, EntityTypeSchema, FieldDefault, FieldSchema};

#[test]
fn bundles_default_to_type_name() {
    let user = EntityTypeSchema::new("user");
    assert!(user.has_bundle("user"));
    assert!(!user.has_bundle("admin"));

    let node = EntityTypeSchema::new("node").with_bundle("page");
    assert!(node.has_bundle("page"));
    assert!(!node.has_bundle("node"));
}

#[test]
fn field_lookup() {
    let node = EntityTypeSchema::new("node")
        .with_field(FieldSchema::required("title", Type::String))
        .with_field(FieldSchema::optional_empty("uid", Type::entity("user")));

    assert!(node.field("title").is_some_and(|f| f.required));
    assert_eq!(node.field("uid").and_then(FieldSchema::target_type), Some("user"));
    assert!(node.field("body").is_none());
}

#[test]
fn optional_fields_carry_defaults() {
    let created = FieldSchema::optional("created", Type::Timestamp, FieldDefault::CurrentTime);
    assert!(!created.required);
    assert_eq!(created.default, Some(FieldDefault::CurrentTime));
    assert_eq!(created.target_type(), None);
}

#[test]
fn cardinality_limits() {
    assert!(Cardinality::Single.allows(0));
    assert!(Cardinality::Single.allows(1));
    assert!(!Cardinality::Single.allows(2));
    assert!(Cardinality::Limited(3).allows(3));
    assert!(!Cardinality::Limited(3).allows(4));
    assert!(Cardinality::Unlimited.allows(1000));
}
