//! Auto-saving across actions, failures, and references.

use proptest::prelude::*;
use rulecraft_engine::{
    ContextConfig, ContextDefinition, EngineConfig, Expression, ExpressionManager,
    RulesComponent,
};
use rulecraft_foundation::{EntityId, ErrorKind, ResolutionError, Value};
use rulecraft_storage::{EntityLoader, EntityStorage, MemoryStorage};

use crate::support;

fn set_title(manager: &ExpressionManager, title: &str) -> Expression {
    manager
        .create_action(
            "rules_data_set",
            &ContextConfig::new()
                .map("data", "node:title")
                .set_value("value", title),
        )
        .unwrap()
        .into()
}

fn save_node(manager: &ExpressionManager) -> Expression {
    manager
        .create_action("rules_entity_save", &ContextConfig::new().map("entity", "node"))
        .unwrap()
        .into()
}

fn run(
    expression: Expression,
    storage: &mut MemoryStorage,
    node: rulecraft_foundation::Entity,
) -> rulecraft_foundation::Result<rulecraft_engine::ExecutionOutcome> {
    RulesComponent::new(expression)
        .with_label("node rules")
        .with_context_definition("node", ContextDefinition::parse("entity:node").unwrap())
        .with_context_value("node", node)
        .execute(storage, &mut support::messages())
}

fn stored_title(storage: &MemoryStorage, id: u64) -> Option<Value> {
    storage
        .load("node", EntityId::new(id))
        .unwrap()
        .and_then(|node| node.field_value("title").cloned())
}

#[test]
fn entity_marked_twice_is_saved_once() {
    let manager = support::manager();
    let mut storage = support::storage();
    let rule = manager
        .create_rule()
        .add_expression(set_title(&manager, "first"))
        .add_expression(save_node(&manager))
        .add_expression(set_title(&manager, "second"));

    let node = support::page(&storage, "test");
    let outcome = run(rule.into(), &mut storage, node).unwrap();

    assert_eq!(outcome.saved.len(), 1);
    assert_eq!(storage.save_count("node", EntityId::new(1)), 1);
    assert_eq!(stored_title(&storage, 1), Some(Value::from("second")));
}

#[test]
fn saving_can_be_turned_off() {
    let manager = support::manager();
    let mut storage = support::storage();
    let node = support::page(&storage, "test");

    let outcome = RulesComponent::new(set_title(&manager, "changed"))
        .with_context_definition("node", ContextDefinition::parse("entity:node").unwrap())
        .with_context_value("node", node)
        .with_config(EngineConfig::default().with_auto_save(false))
        .execute(&mut storage, &mut support::messages())
        .unwrap();

    assert!(outcome.saved.is_empty());
    assert_eq!(
        outcome.entity("node").unwrap().field_value("title"),
        Some(&Value::from("changed"))
    );
    assert_eq!(storage.count("node"), 0);
}

#[test]
fn failure_keeps_earlier_changes() {
    let manager = support::manager();
    let mut storage = support::storage();
    let broken = manager
        .create_action(
            "rules_system_message",
            &ContextConfig::new().map("message", "missing"),
        )
        .unwrap();
    let rule = manager
        .create_rule()
        .add_expression(set_title(&manager, "saved anyway"))
        .add_action(broken);

    let node = support::page(&storage, "test");
    let err = run(rule.into(), &mut storage, node).unwrap_err();

    assert_eq!(
        err.as_resolution(),
        Some(&ResolutionError::UndefinedVariable("missing".to_string()))
    );
    let context = err.context.unwrap();
    assert_eq!(context.source.as_deref(), Some("node rules"));
    assert_eq!(context.stack, ["action rules_system_message", "rule"]);
    assert_eq!(stored_title(&storage, 1), Some(Value::from("saved anyway")));
}

#[test]
fn referenced_entities_are_not_writable() {
    let manager = support::manager();
    let mut storage = support::storage();
    let author = support::saved_user(&mut storage, "klausi");
    let node = support::owned_page(&storage, "test", &author);
    let rename = manager
        .create_action(
            "rules_data_set",
            &ContextConfig::new()
                .map("data", "node:uid:entity:name")
                .set_value("value", "someone else"),
        )
        .unwrap();

    let err = run(rename.into(), &mut storage, node).unwrap_err();

    assert!(matches!(
        err.as_resolution(),
        Some(ResolutionError::NotWritable { .. })
    ));
    assert_eq!(storage.count("node"), 0);
    assert_eq!(storage.save_count("user", EntityId::new(1)), 1);
}

#[test]
fn save_errors_surface() {
    let manager = support::manager();
    let mut storage = support::storage();
    let untitled = storage.create("node", "page", Vec::new()).unwrap();

    let err = run(save_node(&manager), &mut storage, untitled).unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Persistence { .. }));
    assert_eq!(err.context.unwrap().source.as_deref(), Some("node rules"));
    assert!(storage.save_log().is_empty());
}

#[test]
fn one_failed_save_does_not_skip_the_others() {
    let manager = support::manager();
    let mut storage = support::storage();
    let save = |context: &str| -> Expression {
        manager
            .create_action("rules_entity_save", &ContextConfig::new().map("entity", context))
            .unwrap()
            .into()
    };
    let rule = manager
        .create_rule()
        .add_expression(save("untitled"))
        .add_expression(save("page"));
    let node_type = || ContextDefinition::parse("entity:node").unwrap();

    let err = RulesComponent::new(rule)
        .with_context_definition("untitled", node_type())
        .with_context_definition("page", node_type())
        .with_context_value("untitled", storage.create("node", "page", Vec::new()).unwrap())
        .with_context_value("page", support::page(&storage, "valid"))
        .execute(&mut storage, &mut support::messages())
        .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Persistence { .. }));
    assert_eq!(storage.count("node"), 1);
    assert_eq!(stored_title(&storage, 1), Some(Value::from("valid")));
}

#[test]
fn saving_an_embedded_author_updates_the_reference() {
    let manager = support::manager();
    let mut storage = support::storage();
    let author = storage
        .create("user", "user", vec![("name".to_string(), Value::from("draft"))])
        .unwrap();
    let node = support::owned_page(&storage, "test", &author);
    let rename = manager
        .create_action(
            "rules_data_set",
            &ContextConfig::new()
                .map("data", "node:uid:entity:name")
                .set_value("value", "klausi"),
        )
        .unwrap();

    let outcome = run(rename.into(), &mut storage, node).unwrap();

    assert_eq!(outcome.saved, [rulecraft_foundation::EntityRef::new("user", EntityId::new(1))]);
    let node = outcome.entity("node").unwrap();
    assert_eq!(node.reference_target("uid"), Some(EntityId::new(1)));
    let item = node.field("uid").unwrap().first_item().unwrap();
    assert_eq!(item.property("target_id"), Some(&Value::Int(1)));
    assert_eq!(storage.count("node"), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn titles_round_trip_through_storage(title in "[A-Za-z][A-Za-z ]{0,30}") {
        let manager = support::manager();
        let mut storage = support::storage();
        let node = support::page(&storage, "test");

        let outcome = run(set_title(&manager, &title), &mut storage, node).unwrap();

        prop_assert_eq!(outcome.saved.len(), 1);
        prop_assert_eq!(stored_title(&storage, 1), Some(Value::from(title.as_str())));
    }
}
