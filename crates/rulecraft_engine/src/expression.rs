//! Expression trees: rules, conditions, and actions.
//!
//! Expressions are built through an [`ExpressionManager`], which resolves
//! plugin ids and validates context configuration up front. A built tree
//! holds parsed selectors and resolved plugins, so evaluating it never
//! looks anything up by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rulecraft_foundation::{Error, Result, Value};

use crate::context::{ContextConfig, ContextDefinition};
use crate::plugin::{ActionPlugin, ConditionPlugin, DataProcessor, PluginDefinition, PluginRegistry};
use crate::selector::DataSelector;

/// Expression type id of a rule.
pub const RULE_EXPRESSION: &str = "rules_rule";
/// Expression type id of an action.
pub const ACTION_EXPRESSION: &str = "rules_action";
/// Expression type id of a condition.
pub const CONDITION_EXPRESSION: &str = "rules_condition";

// =============================================================================
// Expressions
// =============================================================================

/// A node of an expression tree.
#[derive(Clone, Debug)]
pub enum Expression {
    /// Conditions guarding a list of actions.
    Rule(Rule),
    /// A single condition.
    Condition(ConditionExpression),
    /// A single action.
    Action(ActionExpression),
}

impl Expression {
    /// Returns a short description used in error frames and logs.
    #[must_use]
    pub fn frame(&self) -> String {
        match self {
            Self::Rule(rule) => rule.frame(),
            Self::Condition(condition) => condition.frame(),
            Self::Action(action) => action.frame(),
        }
    }
}

impl From<Rule> for Expression {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<ConditionExpression> for Expression {
    fn from(condition: ConditionExpression) -> Self {
        Self::Condition(condition)
    }
}

impl From<ActionExpression> for Expression {
    fn from(action: ActionExpression) -> Self {
        Self::Action(action)
    }
}

/// A rule: conditions that must all pass, then actions in order.
///
/// Actions may themselves be rules.
#[derive(Clone, Debug, Default)]
pub struct Rule {
    label: Option<String>,
    conditions: Vec<ConditionExpression>,
    actions: Vec<Expression>,
}

impl Rule {
    /// Creates an empty rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule's label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends a condition.
    #[must_use]
    pub fn add_condition(mut self, condition: ConditionExpression) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn add_action(mut self, action: ActionExpression) -> Self {
        self.actions.push(Expression::Action(action));
        self
    }

    /// Appends a nested rule to the actions.
    #[must_use]
    pub fn add_rule(mut self, rule: Rule) -> Self {
        self.actions.push(Expression::Rule(rule));
        self
    }

    /// Appends any expression: conditions go to the conditions, everything
    /// else to the actions.
    #[must_use]
    pub fn add_expression(mut self, expression: Expression) -> Self {
        match expression {
            Expression::Condition(condition) => self.conditions.push(condition),
            other => self.actions.push(other),
        }
        self
    }

    /// Returns the label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the conditions in evaluation order.
    #[must_use]
    pub fn conditions(&self) -> &[ConditionExpression] {
        &self.conditions
    }

    /// Returns the actions in execution order.
    #[must_use]
    pub fn actions(&self) -> &[Expression] {
        &self.actions
    }

    pub(crate) fn frame(&self) -> String {
        match &self.label {
            Some(label) => format!("rule {label}"),
            None => "rule".to_string(),
        }
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Where a context value comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ParameterSource {
    /// Resolved from the execution state.
    Selector(DataSelector),
    /// A configured literal.
    Literal(Value),
    /// Not configured (only allowed for optional contexts).
    Omitted,
}

/// A configured processor, resolved from the registry.
#[derive(Clone)]
pub struct BoundProcessor {
    /// The processor.
    pub processor: Arc<dyn DataProcessor>,
    /// Its settings.
    pub settings: BTreeMap<String, Value>,
}

impl fmt::Debug for BoundProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundProcessor({})", self.processor.id())
    }
}

/// One context parameter of a plugin invocation.
#[derive(Clone, Debug)]
pub struct Parameter {
    /// Context name.
    pub name: String,
    /// The context's definition on the plugin.
    pub definition: ContextDefinition,
    /// Where the value comes from.
    pub source: ParameterSource,
    /// Processors applied to the value, in order.
    pub processors: Vec<BoundProcessor>,
}

/// Builds the parameters of a plugin from a context configuration.
fn bind_parameters(
    definition: &PluginDefinition,
    config: &ContextConfig,
    registry: &PluginRegistry,
) -> Result<Vec<Parameter>> {
    let plugin = definition.id();
    let configured = config
        .mappings()
        .map(|(name, _)| name)
        .chain(config.values().map(|(name, _)| name))
        .chain(config.processed_contexts());
    for name in configured {
        if definition.context(name).is_none() {
            return Err(Error::invalid_configuration(format!(
                "{plugin} has no context named {name}"
            )));
        }
    }

    definition
        .context_definitions()
        .iter()
        .map(|(name, context)| -> Result<Parameter> {
            let source = if let Some(selector) = config.mapping(name) {
                ParameterSource::Selector(DataSelector::parse(selector)?)
            } else if let Some(value) = config.value(name) {
                ParameterSource::Literal(value.clone())
            } else if context.is_required() {
                return Err(Error::invalid_configuration(format!(
                    "required context {name} of {plugin} is neither mapped nor set"
                )));
            } else {
                ParameterSource::Omitted
            };

            let processors = config
                .processors(name)
                .iter()
                .map(|p| {
                    Ok(BoundProcessor {
                        processor: registry.processor(&p.id)?,
                        settings: p.settings.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(Parameter {
                name: name.clone(),
                definition: context.clone(),
                source,
                processors,
            })
        })
        .collect()
}

// =============================================================================
// Conditions and Actions
// =============================================================================

/// A condition plugin with its configured parameters.
#[derive(Clone)]
pub struct ConditionExpression {
    plugin: Arc<dyn ConditionPlugin>,
    parameters: Vec<Parameter>,
    negate: bool,
}

impl ConditionExpression {
    /// Negates the condition's result.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Returns true if the result is negated.
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negate
    }

    /// Returns the plugin.
    #[must_use]
    pub fn plugin(&self) -> &dyn ConditionPlugin {
        &*self.plugin
    }

    /// Returns the plugin id.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        self.plugin.definition().id()
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn frame(&self) -> String {
        if self.negate {
            format!("condition not {}", self.plugin_id())
        } else {
            format!("condition {}", self.plugin_id())
        }
    }
}

impl fmt::Debug for ConditionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionExpression")
            .field("plugin", &self.plugin_id())
            .field("parameters", &self.parameters)
            .field("negate", &self.negate)
            .finish()
    }
}

/// An action plugin with its configured parameters.
#[derive(Clone)]
pub struct ActionExpression {
    plugin: Arc<dyn ActionPlugin>,
    parameters: Vec<Parameter>,
    selectors: BTreeMap<String, DataSelector>,
    provides: BTreeMap<String, String>,
}

impl ActionExpression {
    /// Returns the plugin.
    #[must_use]
    pub fn plugin(&self) -> &dyn ActionPlugin {
        &*self.plugin
    }

    /// Returns the plugin id.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        self.plugin.definition().id()
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the selectors of mapped contexts.
    #[must_use]
    pub fn selectors(&self) -> &BTreeMap<String, DataSelector> {
        &self.selectors
    }

    /// Returns the variable name under which a provided value is stored.
    #[must_use]
    pub fn provided_name<'a>(&'a self, provided: &'a str) -> &'a str {
        self.provides.get(provided).map_or(provided, String::as_str)
    }

    pub(crate) fn frame(&self) -> String {
        format!("action {}", self.plugin_id())
    }
}

impl fmt::Debug for ActionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionExpression")
            .field("plugin", &self.plugin_id())
            .field("parameters", &self.parameters)
            .field("provides", &self.provides)
            .finish()
    }
}

// =============================================================================
// Expression Manager
// =============================================================================

/// Creates expressions from plugin ids and context configuration.
#[derive(Clone, Debug, Default)]
pub struct ExpressionManager {
    registry: PluginRegistry,
}

impl ExpressionManager {
    /// Creates a manager over a plugin registry.
    #[must_use]
    pub fn new(registry: PluginRegistry) -> Self {
        Self { registry }
    }

    /// Returns the plugin registry.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Creates an empty rule.
    #[must_use]
    pub fn create_rule(&self) -> Rule {
        Rule::new()
    }

    /// Creates a condition expression.
    ///
    /// The `negate` configuration key, if set to `true`, negates the result.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// for an unknown condition, or a configuration error if the context
    /// configuration does not fit the plugin.
    pub fn create_condition(
        &self,
        id: &str,
        config: &ContextConfig,
    ) -> Result<ConditionExpression> {
        let plugin = self.registry.condition(id)?;
        let parameters = bind_parameters(plugin.definition(), config, &self.registry)?;
        let negate = config
            .config_key("negate")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(ConditionExpression {
            plugin,
            parameters,
            negate,
        })
    }

    /// Creates an action expression.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// for an unknown action, or a configuration error if the context
    /// configuration does not fit the plugin.
    pub fn create_action(&self, id: &str, config: &ContextConfig) -> Result<ActionExpression> {
        let plugin = self.registry.action(id)?;
        let definition = plugin.definition();
        let parameters = bind_parameters(definition, config, &self.registry)?;

        let selectors = parameters
            .iter()
            .filter_map(|p| match &p.source {
                ParameterSource::Selector(selector) => Some((p.name.clone(), selector.clone())),
                _ => None,
            })
            .collect();

        let mut provides = BTreeMap::new();
        for (provided, _) in definition.provided_definitions() {
            let name = config.provided_name(provided);
            if name != provided {
                provides.insert(provided.clone(), name.to_string());
            }
        }

        Ok(ActionExpression {
            plugin,
            parameters,
            selectors,
            provides,
        })
    }

    /// Creates an expression by type id.
    ///
    /// `rules_rule` creates an empty rule (labelled by the `label` key),
    /// `rules_action` an action named by the `action_id` key, and
    /// `rules_condition` a condition named by the `condition_id` key.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// for an unknown expression type, or the error of the underlying
    /// constructor.
    pub fn create_instance(
        &self,
        expression_id: &str,
        config: &ContextConfig,
    ) -> Result<Expression> {
        match expression_id {
            RULE_EXPRESSION => {
                let rule = match config.config_key("label").and_then(Value::as_str) {
                    Some(label) => Rule::new().with_label(label),
                    None => Rule::new(),
                };
                Ok(Expression::Rule(rule))
            }
            ACTION_EXPRESSION => {
                let id = plugin_key(config, "action_id")?;
                Ok(Expression::Action(self.create_action(id, config)?))
            }
            CONDITION_EXPRESSION => {
                let id = plugin_key(config, "condition_id")?;
                Ok(Expression::Condition(self.create_condition(id, config)?))
            }
            other => Err(Error::plugin_not_found(other)),
        }
    }
}

fn plugin_key<'a>(config: &'a ContextConfig, key: &str) -> Result<&'a str> {
    config
        .config_key(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_configuration(format!("missing configuration key {key}")))
}
