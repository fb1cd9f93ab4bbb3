//! Integration tests for Value
//!
//! Tests field item helpers, emptiness, comparison, and display.

use rulecraft_foundation::{Entity, EntityId, EntityRef, LtVec, Type, Value};

// =============================================================================
// Field Items
// =============================================================================

#[test]
fn item_wraps_main_value() {
    let item = Value::item(Value::from("test"));
    assert_eq!(item.main_property(), Some(&Value::from("test")));
    assert_eq!(item.main_property_name(), Some("value"));
}

#[test]
fn reference_item_main_property_is_target_id() {
    let item = Value::map([
        ("target_id", Value::Int(7)),
        ("entity", Value::EntityRef(EntityRef::new("user", EntityId::new(7)))),
    ]);
    assert_eq!(item.main_property(), Some(&Value::Int(7)));
    assert_eq!(item.main_property_name(), Some("target_id"));
}

#[test]
fn first_item_of_list() {
    let list = Value::list([Value::item(Value::Int(1)), Value::item(Value::Int(2))]);
    assert_eq!(list.first_item(), Some(&Value::item(Value::Int(1))));
    assert_eq!(Value::list([]).first_item(), None);
    assert_eq!(Value::Int(1).first_item(), None);
}

// =============================================================================
// Emptiness
// =============================================================================

#[test]
fn empty_values() {
    assert!(Value::Nil.is_empty());
    assert!(Value::from("").is_empty());
    assert!(Value::List(LtVec::new()).is_empty());
    assert!(Value::list([Value::item(Value::from(""))]).is_empty());
}

#[test]
fn non_empty_values() {
    assert!(!Value::Bool(false).is_empty());
    assert!(!Value::Int(0).is_empty());
    assert!(!Value::list([Value::item(Value::Int(0))]).is_empty());
    assert!(!Value::entity(Entity::new("node", "page")).is_empty());
}

// =============================================================================
// Comparison
// =============================================================================

#[test]
fn numeric_comparison_across_types() {
    assert!(Value::Int(1) < Value::Float(1.5));
    assert!(Value::Timestamp(10) > Value::Int(9));
    assert_eq!(
        Value::from("a").partial_cmp(&Value::Int(1)),
        None,
        "strings and numbers are not comparable"
    );
}

#[test]
fn entities_compare_by_content() {
    let a = Value::entity(Entity::new("node", "page"));
    let b = Value::entity(Entity::new("node", "page"));
    let c = Value::entity(Entity::new("node", "article"));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// =============================================================================
// Display and Types
// =============================================================================

#[test]
fn display() {
    assert_eq!(Value::from("hi").to_string(), "hi");
    assert_eq!(Value::Timestamp(5).to_string(), "5");
    assert_eq!(
        Value::EntityRef(EntityRef::new("user", EntityId::new(2))).to_string(),
        "user:2"
    );
    assert_eq!(Value::entity(Entity::new("node", "page")).to_string(), "node:new");
}

#[test]
fn value_types() {
    assert_eq!(Value::Bool(true).value_type(), Type::Boolean);
    assert_eq!(Value::Int(1).value_type(), Type::Integer);
    assert_eq!(Value::item(Value::Nil).value_type(), Type::Map);
    assert_eq!(Value::from(None::<i64>), Value::Nil);
    assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
}
