//! Integration tests for Entity
//!
//! Tests identifiers, field storage, and reference fields.

use rulecraft_foundation::{Entity, EntityId, EntityRef, Value};

// =============================================================================
// Identity
// =============================================================================

#[test]
fn new_entity_is_unsaved() {
    let node = Entity::new("node", "page");
    assert!(node.is_new());
    assert_eq!(node.id(), None);
    assert_eq!(node.reference(), None);
    assert_eq!(node.label(), "node:new");
}

#[test]
fn saved_entity_has_reference() {
    let mut node = Entity::new("node", "page");
    node.set_id(EntityId::new(4));
    assert!(!node.is_new());
    assert_eq!(node.reference(), Some(EntityRef::new("node", EntityId::new(4))));
    assert_eq!(node.label(), "node:4");
}

// =============================================================================
// Fields
// =============================================================================

#[test]
fn scalar_fields_become_item_lists() {
    let mut node = Entity::new("node", "page");
    node.set_field("title", Value::from("test"));

    assert_eq!(
        node.field("title"),
        Some(&Value::list([Value::item(Value::from("test"))]))
    );
    assert_eq!(node.field_value("title"), Some(&Value::from("test")));
}

#[test]
fn nil_clears_a_field() {
    let mut node = Entity::new("node", "page");
    node.set_field("title", Value::from("test"));
    node.set_field("title", Value::Nil);

    assert!(node.has_field("title"));
    assert!(node.field("title").is_some_and(Value::is_empty));
    assert_eq!(node.field_value("title"), None);
}

#[test]
fn fields_iterate_in_name_order() {
    let mut node = Entity::new("node", "page");
    node.set_field("title", Value::from("t"));
    node.set_field("created", Value::Timestamp(1));
    let names: Vec<&str> = node.fields().map(|(name, _)| name).collect();
    assert_eq!(names, ["created", "title"]);
}

// =============================================================================
// References
// =============================================================================

#[test]
fn reference_to_saved_entity_stores_ref() {
    let mut user = Entity::new("user", "user");
    user.set_id(EntityId::new(9));
    let mut node = Entity::new("node", "page");
    node.set_reference("uid", &user);

    let item = node.field("uid").and_then(Value::first_item).unwrap();
    assert_eq!(item.property("target_id"), Some(&Value::Int(9)));
    assert_eq!(
        item.property("entity"),
        Some(&Value::EntityRef(EntityRef::new("user", EntityId::new(9))))
    );
    assert_eq!(node.reference_target("uid"), Some(EntityId::new(9)));
}

#[test]
fn reference_to_unsaved_entity_embeds_it() {
    let user = Entity::new("user", "user");
    let mut node = Entity::new("node", "page");
    node.set_reference("uid", &user);

    let item = node.field("uid").and_then(Value::first_item).unwrap();
    assert_eq!(item.property("target_id"), Some(&Value::Nil));
    assert!(matches!(item.property("entity"), Some(Value::Entity(_))));
    assert_eq!(node.reference_target("uid"), None);
}

#[test]
fn cloned_entities_are_independent() {
    let mut original = Entity::new("node", "page");
    original.set_field("title", Value::from("a"));
    let mut copy = original.clone();
    copy.set_field("title", Value::from("b"));

    assert_eq!(original.field_value("title"), Some(&Value::from("a")));
    assert_eq!(copy.field_value("title"), Some(&Value::from("b")));
}
