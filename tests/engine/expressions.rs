//! Integration tests for expressions and the executor
//!
//! Tests expression construction, rule evaluation order, negation,
//! provided variables, and error frames.

use rulecraft_engine::{
    ACTION_EXPRESSION, CONDITION_EXPRESSION, ContextConfig, EngineConfig, ExecutionState,
    Executor, Expression, RULE_EXPRESSION,
};
use rulecraft_foundation::{ErrorKind, ResolutionError, Value};
use rulecraft_storage::NullLoader;

use crate::support::{self, LOG_CHANNEL};

fn state(text: &str) -> ExecutionState {
    let mut state = ExecutionState::new();
    state.set("text", Value::from(text));
    state
}

fn text_condition() -> ContextConfig {
    ContextConfig::new().map("text", "text")
}

fn run(
    expression: &Expression,
    state: ExecutionState,
) -> (rulecraft_foundation::Result<bool>, ExecutionState, rulecraft_engine::MessageLog) {
    let mut messages = support::messages();
    let config = EngineConfig::default();
    let mut executor = Executor::new(state, &NullLoader, &mut messages, &config);
    let result = executor.evaluate(expression);
    let report = executor.finish();
    (result, report.state, messages)
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn create_instance_by_expression_type() {
    let manager = support::manager();

    let rule = manager
        .create_instance(
            RULE_EXPRESSION,
            &ContextConfig::new().set_config_key("label", "greeting"),
        )
        .unwrap();
    assert!(matches!(&rule, Expression::Rule(rule) if rule.label() == Some("greeting")));

    let condition = manager
        .create_instance(
            CONDITION_EXPRESSION,
            &text_condition().set_config_key("condition_id", "rules_test_string_condition"),
        )
        .unwrap();
    assert!(matches!(condition, Expression::Condition(_)));

    let action = manager
        .create_instance(
            ACTION_EXPRESSION,
            &ContextConfig::new().set_config_key("action_id", "rules_test_log"),
        )
        .unwrap();
    assert!(matches!(action, Expression::Action(_)));
}

#[test]
fn unknown_plugins_are_rejected() {
    let manager = support::manager();
    let err = manager
        .create_action("rules_no_such_action", &ContextConfig::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PluginNotFound(ref id) if id == "rules_no_such_action"));

    let err = manager
        .create_instance("rules_loop", &ContextConfig::new())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::PluginNotFound(_)));
}

#[test]
fn plugin_kinds_are_not_interchangeable() {
    let manager = support::manager();
    let err = manager
        .create_action("rules_test_string_condition", &text_condition())
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidConfiguration(_)));
}

#[test]
fn configuration_must_fit_the_plugin() {
    let manager = support::manager();

    let unmapped = manager
        .create_condition("rules_test_string_condition", &ContextConfig::new())
        .unwrap_err();
    assert!(matches!(unmapped.kind, ErrorKind::InvalidConfiguration(_)));

    let undeclared = manager
        .create_condition(
            "rules_test_string_condition",
            &text_condition().map("other", "text"),
        )
        .unwrap_err();
    assert!(matches!(undeclared.kind, ErrorKind::InvalidConfiguration(_)));

    let malformed = manager
        .create_condition(
            "rules_test_string_condition",
            &ContextConfig::new().map("text", "node::title"),
        )
        .unwrap_err();
    assert!(malformed.as_resolution().is_some());
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn actions_run_only_when_conditions_pass() {
    let manager = support::manager();
    let rule: Expression = manager
        .create_rule()
        .add_condition(
            manager
                .create_condition("rules_test_string_condition", &text_condition())
                .unwrap(),
        )
        .add_action(manager.create_action("rules_test_log", &ContextConfig::new()).unwrap())
        .into();

    let (passed, _, messages) = run(&rule, state("test value"));
    assert!(passed.unwrap());
    assert_eq!(messages.messages(LOG_CHANNEL), ["action called"]);

    let (passed, _, messages) = run(&rule, state("other"));
    assert!(!passed.unwrap());
    assert!(messages.is_empty());
}

#[test]
fn negated_condition_inverts_result() {
    let manager = support::manager();
    let negated = manager
        .create_condition(
            "rules_test_string_condition",
            &text_condition().set_config_key("negate", true),
        )
        .unwrap();
    assert!(negated.is_negated());

    let rule: Expression = manager
        .create_rule()
        .add_condition(negated)
        .add_action(manager.create_action("rules_test_log", &ContextConfig::new()).unwrap())
        .into();
    let (passed, _, messages) = run(&rule, state("other"));
    assert!(passed.unwrap());
    assert_eq!(messages.len(), 1);
}

#[test]
fn literal_values_and_processors() {
    let manager = support::manager();
    let action = manager
        .create_action(
            "rules_system_message",
            &ContextConfig::new()
                .set_value("message", "Got [text]: [text:value]!")
                .process("message", "rules_tokens"),
        )
        .unwrap();

    let mut state = ExecutionState::new();
    state.set("text", Value::list([Value::item(Value::from("hello"))]));
    let (result, _, messages) = run(&action.into(), state);
    result.unwrap();
    assert_eq!(messages.messages("status"), ["Got [text]: hello!"]);
}

#[test]
fn provided_variables_are_visible_to_later_actions() {
    let manager = support::manager();
    let add = manager
        .create_action(
            "rules_variable_add",
            &ContextConfig::new()
                .set_value("type", "string")
                .set_value("value", "test value")
                .provide_as("variable_added", "greeting"),
        )
        .unwrap();
    let check = manager
        .create_condition(
            "rules_test_string_condition",
            &ContextConfig::new().map("text", "greeting"),
        )
        .unwrap();
    let log = manager.create_action("rules_test_log", &ContextConfig::new()).unwrap();

    let rule: Expression = manager
        .create_rule()
        .add_action(add)
        .add_rule(manager.create_rule().add_condition(check).add_action(log))
        .into();
    let (passed, state, messages) = run(&rule, ExecutionState::new());

    assert!(passed.unwrap());
    assert_eq!(state.get("greeting"), Some(&Value::from("test value")));
    assert!(!state.has("variable_added"));
    assert_eq!(messages.messages(LOG_CHANNEL).len(), 1);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn errors_carry_expression_frames() {
    let manager = support::manager();
    let rule: Expression = manager
        .create_rule()
        .with_label("outer")
        .add_rule(
            manager.create_rule().add_condition(
                manager
                    .create_condition(
                        "rules_test_string_condition",
                        &ContextConfig::new().map("text", "missing"),
                    )
                    .unwrap(),
            ),
        )
        .into();

    let (result, _, _) = run(&rule, ExecutionState::new());
    let err = result.unwrap_err();
    assert_eq!(
        err.as_resolution(),
        Some(&ResolutionError::UndefinedVariable("missing".to_string()))
    );
    assert_eq!(
        err.context.unwrap().stack,
        ["condition rules_test_string_condition", "rule", "rule outer"]
    );
}

#[test]
fn parameter_types_are_checked() {
    let manager = support::manager();
    let condition: Expression = manager
        .create_condition("rules_test_string_condition", &text_condition())
        .unwrap()
        .into();
    let mut state = ExecutionState::new();
    state.set("text", Value::Int(3));

    let (result, _, _) = run(&condition, state);
    let err = result.unwrap_err();
    assert!(err.as_bind().is_some());
}
