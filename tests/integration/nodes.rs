//! Rules components over node and user entities.

use rulecraft_engine::{
    ACTION_EXPRESSION, ContextConfig, ContextDefinition, ExecutionOutcome, Expression,
    RulesComponent,
};
use rulecraft_foundation::{EntityId, Result, Value};
use rulecraft_storage::{EntityLoader, EntityStorage, MemoryStorage};

use crate::support::{self, LOG_CHANNEL};

fn node_component(expression: impl Into<Expression>) -> RulesComponent {
    RulesComponent::new(expression)
        .with_context_definition("node", ContextDefinition::parse("entity:node").unwrap())
}

fn execute(
    component: RulesComponent,
    storage: &mut MemoryStorage,
) -> (Result<ExecutionOutcome>, rulecraft_engine::MessageLog) {
    let mut messages = support::messages();
    let outcome = component.execute(storage, &mut messages);
    (outcome, messages)
}

fn author_rule(selector: &str) -> Expression {
    let manager = support::manager();
    manager
        .create_rule()
        .add_condition(
            manager
                .create_condition(
                    "rules_test_string_condition",
                    &ContextConfig::new().map("text", selector),
                )
                .unwrap(),
        )
        .add_action(manager.create_action("rules_test_log", &ContextConfig::new()).unwrap())
        .into()
}

#[test]
fn long_and_short_selectors_reach_the_author() {
    support::init_tracing();
    let mut storage = support::storage();
    let author = support::saved_user(&mut storage, "test value");
    let node = support::owned_page(&storage, "Rust", &author);

    for selector in ["node:uid:0:entity:name:0:value", "node:uid:entity:name"] {
        let (outcome, messages) = execute(
            node_component(author_rule(selector)).with_context_value("node", node.clone()),
            &mut storage,
        );
        assert!(outcome.unwrap().passed, "{selector}");
        assert_eq!(messages.messages(LOG_CHANNEL), ["action called"]);
    }
}

#[test]
fn failing_condition_skips_actions() {
    let mut storage = support::storage();
    let author = support::saved_user(&mut storage, "someone else");
    let node = support::owned_page(&storage, "Rust", &author);

    let (outcome, messages) = execute(
        node_component(author_rule("node:uid:entity:name")).with_context_value("node", node),
        &mut storage,
    );
    assert!(!outcome.unwrap().passed);
    assert!(messages.is_empty());
}

#[test]
fn changed_node_is_saved() {
    support::init_tracing();
    let manager = support::manager();
    let mut storage = support::storage();
    let action = manager
        .create_action(
            "rules_test_node",
            &ContextConfig::new().map("node", "node").map("title", "title"),
        )
        .unwrap();

    let (outcome, _) = execute(
        node_component(action)
            .with_context_definition("title", ContextDefinition::parse("string").unwrap())
            .with_context_value("node", support::page(&storage, "test"))
            .with_context_value("title", "new title"),
        &mut storage,
    );
    let outcome = outcome.unwrap();

    let node = outcome.entity("node").unwrap();
    assert_eq!(node.id(), Some(EntityId::new(1)));
    assert_eq!(node.field_value("title"), Some(&Value::from("new title")));

    let stored = storage.load("node", EntityId::new(1)).unwrap().unwrap();
    assert_eq!(stored.field_value("title"), Some(&Value::from("new title")));
}

fn message_action() -> Expression {
    support::manager()
        .create_instance(
            ACTION_EXPRESSION,
            &ContextConfig::new()
                .set_config_key("action_id", "rules_system_message")
                .map("message", "message")
                .map("type", "type")
                .process("message", "rules_tokens"),
        )
        .unwrap()
}

fn message_component(node: rulecraft_foundation::Entity, message: &str) -> RulesComponent {
    node_component(message_action())
        .with_context_definition("message", ContextDefinition::parse("string").unwrap())
        .with_context_definition("type", ContextDefinition::parse("string").unwrap())
        .with_context_value("node", node)
        .with_context_value("message", message)
        .with_context_value("type", "status")
}

#[test]
fn message_tokens_are_replaced() {
    let mut storage = support::storage();
    let author = support::saved_user(&mut storage, "klausi");
    let node = support::owned_page(&storage, "Rust", &author);

    let (outcome, messages) = execute(
        message_component(node, "Hello [node:uid:entity:name]!"),
        &mut storage,
    );
    let outcome = outcome.unwrap();
    assert!(outcome.warnings.is_empty());
    assert!(outcome.saved.is_empty());
    assert_eq!(messages.messages("status"), ["Hello klausi!"]);
}

#[test]
fn date_tokens_use_custom_formats() {
    let mut storage = support::storage();
    let node = storage
        .create(
            "node",
            "page",
            vec![
                ("title".to_string(), Value::from("Rust")),
                ("created".to_string(), Value::Int(1)),
            ],
        )
        .unwrap();

    let (outcome, messages) = execute(
        message_component(node, "The node was created in the year [node:created:custom:Y]"),
        &mut storage,
    );
    outcome.unwrap();
    assert_eq!(
        messages.messages("status"),
        ["The node was created in the year 1970"]
    );
}

#[test]
fn unresolved_tokens_are_reported() {
    let mut storage = support::storage();
    let node = support::page(&storage, "Rust");

    let (outcome, messages) = execute(
        message_component(node, "About [node:summary]."),
        &mut storage,
    );
    let outcome = outcome.unwrap();
    assert_eq!(messages.messages("status"), ["About ."]);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].token, "[node:summary]");
}

#[test]
fn data_set_changes_and_saves_the_node() {
    support::init_tracing();
    let manager = support::manager();
    let mut storage = support::storage();
    let action = manager
        .create_action(
            "rules_data_set",
            &ContextConfig::new()
                .map("data", "node:title")
                .set_value("value", "new title"),
        )
        .unwrap();

    let (outcome, _) = execute(
        node_component(action).with_context_value("node", support::page(&storage, "test")),
        &mut storage,
    );
    let outcome = outcome.unwrap();

    let node = outcome.entity("node").unwrap();
    assert!(!node.is_new());
    assert_eq!(node.field_value("title"), Some(&Value::from("new title")));
    assert_eq!(outcome.saved.len(), 1);
    assert_eq!(storage.count("node"), 1);
}

#[test]
fn bundle_and_comparison_conditions() {
    let manager = support::manager();
    let mut storage = support::storage();
    let rule = manager
        .create_rule()
        .add_condition(
            manager
                .create_condition(
                    "rules_entity_is_of_bundle",
                    &ContextConfig::new()
                        .map("entity", "node")
                        .set_value("type", "node")
                        .set_value("bundle", "page"),
                )
                .unwrap(),
        )
        .add_condition(
            manager
                .create_condition(
                    "rules_data_comparison",
                    &ContextConfig::new()
                        .map("data", "node:title")
                        .set_value("operation", "contains")
                        .set_value("value", "us"),
                )
                .unwrap(),
        )
        .add_action(manager.create_action("rules_test_log", &ContextConfig::new()).unwrap());

    let (outcome, messages) = execute(
        node_component(rule).with_context_value("node", support::page(&storage, "Rust")),
        &mut storage,
    );
    assert!(outcome.unwrap().passed);
    assert_eq!(messages.messages(LOG_CHANNEL).len(), 1);
}
