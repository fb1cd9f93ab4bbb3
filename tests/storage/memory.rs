//! Integration tests for in-memory storage
//!
//! Tests creation, saving, loading, and the save log.

use rulecraft_foundation::{EntityId, EntityRef, ErrorKind, Type, Value};
use rulecraft_storage::{
    Cardinality, EntityLoader, EntityStorage, EntityTypeSchema, FieldDefault, FieldSchema,
    MemoryStorage, NullLoader,
};

fn storage() -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    storage
        .register_entity_type(
            EntityTypeSchema::new("user")
                .with_bundle("user")
                .with_field(FieldSchema::required("name", Type::String)),
        )
        .unwrap();
    storage
        .register_entity_type(
            EntityTypeSchema::new("node")
                .with_bundle("page")
                .with_field(FieldSchema::required("title", Type::String))
                .with_field(FieldSchema::optional_empty("uid", Type::entity("user")))
                .with_field(FieldSchema::optional(
                    "promote",
                    Type::Boolean,
                    FieldDefault::Value(Value::Bool(true)),
                ))
                .with_field(
                    FieldSchema::optional_empty("tags", Type::String)
                        .with_cardinality(Cardinality::Unlimited),
                ),
        )
        .unwrap();
    storage
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn duplicate_entity_type_is_rejected() {
    let mut storage = storage();
    let err = storage
        .register_entity_type(EntityTypeSchema::new("user"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidConfiguration(_)));
}

#[test]
fn bundles_can_be_added_later() {
    let mut storage = storage();
    assert!(storage.create("node", "article", vec![]).is_err());
    storage.add_bundle("node", "article").unwrap();
    assert!(storage.create("node", "article", vec![]).is_ok());
    assert!(storage.add_bundle("comment", "x").is_err());
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn create_applies_fixed_defaults() {
    let storage = storage();
    let node = storage
        .create("node", "page", vec![("title".to_string(), Value::from("t"))])
        .unwrap();
    assert_eq!(node.field_value("promote"), Some(&Value::Bool(true)));
    assert_eq!(node.bundle(), "page");
}

#[test]
fn create_accepts_multiple_items() {
    let storage = storage();
    let node = storage
        .create(
            "node",
            "page",
            vec![(
                "tags".to_string(),
                Value::list([Value::from("a"), Value::from("b")]),
            )],
        )
        .unwrap();
    let tags = node.field("tags").and_then(Value::as_list).unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get(1), Some(&Value::item(Value::from("b"))));
}

#[test]
fn create_accepts_references_by_id_and_entity() {
    let mut storage = storage();
    let mut user = storage
        .create("user", "user", vec![("name".to_string(), Value::from("klausi"))])
        .unwrap();
    storage.save(&mut user).unwrap();

    let by_entity = storage
        .create("node", "page", vec![("uid".to_string(), Value::entity(user))])
        .unwrap();
    let by_id = storage
        .create("node", "page", vec![("uid".to_string(), Value::Int(1))])
        .unwrap();

    assert_eq!(by_entity.reference_target("uid"), Some(EntityId::new(1)));
    assert_eq!(by_entity.field("uid"), by_id.field("uid"));
}

#[test]
fn create_rejects_wrong_reference_type() {
    let storage = storage();
    let other = Value::EntityRef(EntityRef::new("node", EntityId::new(1)));
    assert!(
        storage
            .create("node", "page", vec![("uid".to_string(), other)])
            .is_err()
    );
}

// =============================================================================
// Saving and Loading
// =============================================================================

#[test]
fn save_then_load() {
    let mut storage = storage();
    let mut node = storage
        .create("node", "page", vec![("title".to_string(), Value::from("test"))])
        .unwrap();
    let id = storage.save(&mut node).unwrap();

    let loaded = storage.load("node", id).unwrap().unwrap();
    assert_eq!(loaded, node);
    assert_eq!(storage.save_log(), [EntityRef::new("node", id)]);
}

#[test]
fn load_missing_entity_is_none() {
    let storage = storage();
    assert_eq!(storage.load("node", EntityId::new(99)).unwrap(), None);
}

#[test]
fn load_unknown_type_fails() {
    let storage = storage();
    assert!(storage.load("comment", EntityId::new(1)).is_err());
}

#[test]
fn failed_save_is_a_persistence_error() {
    let mut storage = storage();
    let mut node = storage.create("node", "page", vec![]).unwrap();
    let err = storage.save(&mut node).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Persistence { .. }));
    assert!(storage.save_log().is_empty());
}

#[test]
fn storage_works_as_loader() {
    let mut storage = storage();
    let mut user = storage
        .create("user", "user", vec![("name".to_string(), Value::from("a"))])
        .unwrap();
    storage.save(&mut user).unwrap();

    let loader: &dyn EntityLoader = storage.as_loader();
    assert!(loader.load("user", EntityId::new(1)).unwrap().is_some());
    assert!(NullLoader.load("user", EntityId::new(1)).unwrap().is_none());
}
