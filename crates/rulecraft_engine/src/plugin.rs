//! Plugin traits and the plugin registry.
//!
//! Conditions, actions, and data processors are plugins looked up by id.
//! Expressions resolve their plugin once, when they are built, so an unknown
//! id fails at configuration time rather than during execution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rulecraft_foundation::{Error, Result, Type, Value};
use rulecraft_storage::EntityLoader;

use crate::config::EngineConfig;
use crate::context::{ContextDefinition, ExecutionState};
use crate::message::MessageSink;
use crate::selector::DataSelector;
use crate::token::{TokenWarning, TokensProcessor};

// =============================================================================
// Plugin Definition
// =============================================================================

/// Static description of a condition or action plugin.
#[derive(Clone, Debug)]
pub struct PluginDefinition {
    id: String,
    label: String,
    context: Vec<(String, ContextDefinition)>,
    provides: Vec<(String, ContextDefinition)>,
}

impl PluginDefinition {
    /// Creates a definition with no contexts.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            context: Vec::new(),
            provides: Vec::new(),
        }
    }

    /// Declares a context the plugin consumes.
    #[must_use]
    pub fn with_context(mut self, name: impl Into<String>, definition: ContextDefinition) -> Self {
        self.context.push((name.into(), definition));
        self
    }

    /// Declares a variable the plugin provides to later expressions.
    #[must_use]
    pub fn with_provided(mut self, name: impl Into<String>, definition: ContextDefinition) -> Self {
        self.provides.push((name.into(), definition));
        self
    }

    /// Returns the plugin id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the consumed contexts in declaration order.
    #[must_use]
    pub fn context_definitions(&self) -> &[(String, ContextDefinition)] {
        &self.context
    }

    /// Returns a consumed context by name.
    #[must_use]
    pub fn context(&self, name: &str) -> Option<&ContextDefinition> {
        self.context
            .iter()
            .find_map(|(n, definition)| (n == name).then_some(definition))
    }

    /// Returns the provided variables in declaration order.
    #[must_use]
    pub fn provided_definitions(&self) -> &[(String, ContextDefinition)] {
        &self.provides
    }

    /// Returns a provided variable by name.
    #[must_use]
    pub fn provided(&self, name: &str) -> Option<&ContextDefinition> {
        self.provides
            .iter()
            .find_map(|(n, definition)| (n == name).then_some(definition))
    }
}

// =============================================================================
// Arguments
// =============================================================================

/// Context values passed to a plugin, after mapping and processing.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    plugin: String,
    values: BTreeMap<String, Value>,
}

impl Arguments {
    /// Creates an argument set for a plugin.
    #[must_use]
    pub fn new(plugin: impl Into<String>, values: BTreeMap<String, Value>) -> Self {
        Self {
            plugin: plugin.into(),
            values,
        }
    }

    /// Returns an argument, if provided.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns an argument that the plugin cannot run without.
    ///
    /// # Errors
    /// Returns a plugin execution error if the argument is missing.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::plugin(&self.plugin, format!("missing context {name}")))
    }

    /// Returns a string argument.
    ///
    /// # Errors
    /// Returns an error if the argument is missing or is not a string.
    pub fn str(&self, name: &str) -> Result<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| Error::type_mismatch(Type::String, value.value_type()))
    }

    /// Iterates over all arguments.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// =============================================================================
// Plugin Traits
// =============================================================================

/// A condition: evaluates its arguments to true or false.
pub trait ConditionPlugin: Send + Sync {
    /// Returns the plugin's definition.
    fn definition(&self) -> &PluginDefinition;

    /// Evaluates the condition.
    ///
    /// # Errors
    /// Returns an error if the arguments cannot be evaluated.
    fn evaluate(&self, args: &Arguments) -> Result<bool>;
}

/// An action: performs work and may change its context values.
pub trait ActionPlugin: Send + Sync {
    /// Returns the plugin's definition.
    fn definition(&self) -> &PluginDefinition;

    /// Executes the action.
    ///
    /// # Errors
    /// Returns an error if the action fails. Nothing the action recorded on
    /// `ctx` is applied in that case.
    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()>;
}

/// A data processor: transforms a context value before a plugin sees it.
pub trait DataProcessor: Send + Sync {
    /// Returns the processor id.
    fn id(&self) -> &str;

    /// Processes a value.
    ///
    /// # Errors
    /// Returns an error if the value or settings are unusable.
    fn process(
        &self,
        value: Value,
        settings: &BTreeMap<String, Value>,
        env: &mut ProcessEnv<'_>,
    ) -> Result<Value>;
}

/// Environment available to data processors.
pub struct ProcessEnv<'a> {
    /// Current variables.
    pub state: &'a ExecutionState,
    /// Loader for referenced entities.
    pub loader: &'a dyn EntityLoader,
    /// Engine configuration.
    pub config: &'a EngineConfig,
    /// Collected token warnings.
    pub warnings: &'a mut Vec<TokenWarning>,
}

// =============================================================================
// Action Context
// =============================================================================

/// Effects an action recorded, applied by the executor once it succeeds.
#[derive(Clone, Debug, Default)]
pub struct ActionEffects {
    /// New context values, written back through mapped selectors.
    pub writes: Vec<(String, Value)>,
    /// Contexts whose entities must be saved after execution.
    pub auto_save: Vec<String>,
    /// Variables provided to later expressions.
    pub provided: Vec<(String, Value)>,
}

/// What an action sees while it executes.
pub struct ActionContext<'a> {
    definition: &'a PluginDefinition,
    args: Arguments,
    selectors: &'a BTreeMap<String, DataSelector>,
    messages: &'a mut dyn MessageSink,
    loader: &'a dyn EntityLoader,
    effects: ActionEffects,
}

impl<'a> ActionContext<'a> {
    /// Creates a context for one action execution.
    #[must_use]
    pub fn new(
        definition: &'a PluginDefinition,
        args: Arguments,
        selectors: &'a BTreeMap<String, DataSelector>,
        messages: &'a mut dyn MessageSink,
        loader: &'a dyn EntityLoader,
    ) -> Self {
        Self {
            definition,
            args,
            selectors,
            messages,
            loader,
            effects: ActionEffects::default(),
        }
    }

    /// Returns the action's arguments.
    #[must_use]
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Returns an argument, if provided.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Returns an argument the action cannot run without.
    ///
    /// # Errors
    /// Returns a plugin execution error if the argument is missing.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.args.require(name)
    }

    /// Returns the selector a context was mapped to, if any.
    #[must_use]
    pub fn selector(&self, context: &str) -> Option<&DataSelector> {
        self.selectors.get(context)
    }

    /// Replaces a context value.
    ///
    /// The new value is visible to the rest of this action immediately and is
    /// written back through the context's selector after the action returns.
    ///
    /// # Errors
    /// Returns an error if the plugin does not declare the context.
    pub fn set_context_value(&mut self, context: &str, value: Value) -> Result<()> {
        if self.definition.context(context).is_none() {
            return Err(Error::plugin(
                self.definition.id(),
                format!("cannot set undeclared context {context}"),
            ));
        }
        self.args.values.insert(context.to_string(), value.clone());
        self.effects.writes.push((context.to_string(), value));
        Ok(())
    }

    /// Marks a context's entity for saving after execution.
    ///
    /// # Errors
    /// Returns an error if the plugin does not declare the context.
    pub fn mark_for_auto_save(&mut self, context: &str) -> Result<()> {
        if self.definition.context(context).is_none() {
            return Err(Error::plugin(
                self.definition.id(),
                format!("cannot auto-save undeclared context {context}"),
            ));
        }
        if !self.effects.auto_save.iter().any(|c| c == context) {
            self.effects.auto_save.push(context.to_string());
        }
        Ok(())
    }

    /// Provides a new variable to later expressions.
    ///
    /// # Errors
    /// Returns an error if the plugin does not declare the variable or the
    /// value does not match its declared type.
    pub fn provide(&mut self, name: &str, value: Value) -> Result<()> {
        let definition = self.definition.provided(name).ok_or_else(|| {
            Error::plugin(
                self.definition.id(),
                format!("cannot provide undeclared variable {name}"),
            )
        })?;
        definition.check(name, &value)?;
        self.effects.provided.push((name.to_string(), value));
        Ok(())
    }

    /// Posts a message to the session.
    pub fn post_message(&mut self, channel: &str, text: &str) {
        self.messages.post(channel, text);
    }

    /// Returns the loader for referenced entities.
    #[must_use]
    pub fn loader(&self) -> &dyn EntityLoader {
        self.loader
    }

    /// Consumes the context, returning the recorded effects.
    #[must_use]
    pub fn into_effects(self) -> ActionEffects {
        self.effects
    }
}

// =============================================================================
// Registry
// =============================================================================

/// A registered plugin of any kind.
#[derive(Clone)]
pub enum Plugin {
    /// A condition plugin.
    Condition(Arc<dyn ConditionPlugin>),
    /// An action plugin.
    Action(Arc<dyn ActionPlugin>),
    /// A data processor.
    Processor(Arc<dyn DataProcessor>),
}

impl Plugin {
    /// Returns the plugin id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Condition(plugin) => plugin.definition().id(),
            Self::Action(plugin) => plugin.definition().id(),
            Self::Processor(plugin) => plugin.id(),
        }
    }

    /// Returns the kind of plugin.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Condition(_) => "condition",
            Self::Action(_) => "action",
            Self::Processor(_) => "data processor",
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugin({} {})", self.kind(), self.id())
    }
}

/// Registry of plugins by id.
#[derive(Clone, Debug, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Plugin>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the engine's own processors (`rules_tokens`).
    #[must_use]
    pub fn new_with_core() -> Self {
        let mut registry = Self::new();
        registry.plugins.insert(
            TokensProcessor::ID.to_string(),
            Plugin::Processor(Arc::new(TokensProcessor)),
        );
        registry
    }

    /// Registers a plugin.
    ///
    /// # Errors
    /// Returns an error if a plugin with the same id is already registered.
    pub fn register(&mut self, plugin: Plugin) -> Result<()> {
        let id = plugin.id().to_string();
        if let Some(existing) = self.plugins.get(&id) {
            return Err(Error::invalid_configuration(format!(
                "plugin id {id} is already registered as a {}",
                existing.kind()
            )));
        }
        self.plugins.insert(id, plugin);
        Ok(())
    }

    /// Registers a condition plugin.
    ///
    /// # Errors
    /// Returns an error if the id is taken.
    pub fn register_condition(&mut self, plugin: impl ConditionPlugin + 'static) -> Result<()> {
        self.register(Plugin::Condition(Arc::new(plugin)))
    }

    /// Registers an action plugin.
    ///
    /// # Errors
    /// Returns an error if the id is taken.
    pub fn register_action(&mut self, plugin: impl ActionPlugin + 'static) -> Result<()> {
        self.register(Plugin::Action(Arc::new(plugin)))
    }

    /// Registers a data processor.
    ///
    /// # Errors
    /// Returns an error if the id is taken.
    pub fn register_processor(&mut self, plugin: impl DataProcessor + 'static) -> Result<()> {
        self.register(Plugin::Processor(Arc::new(plugin)))
    }

    /// Looks up a plugin of any kind.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Plugin> {
        self.plugins.get(id)
    }

    /// Returns true if a plugin is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    /// Returns all registered ids in order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    /// Looks up a condition plugin.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// if no condition is registered under `id`.
    pub fn condition(&self, id: &str) -> Result<Arc<dyn ConditionPlugin>> {
        match self.plugins.get(id) {
            Some(Plugin::Condition(plugin)) => Ok(Arc::clone(plugin)),
            Some(other) => Err(wrong_kind(id, "condition", other)),
            None => Err(Error::plugin_not_found(id)),
        }
    }

    /// Looks up an action plugin.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// if no action is registered under `id`.
    pub fn action(&self, id: &str) -> Result<Arc<dyn ActionPlugin>> {
        match self.plugins.get(id) {
            Some(Plugin::Action(plugin)) => Ok(Arc::clone(plugin)),
            Some(other) => Err(wrong_kind(id, "action", other)),
            None => Err(Error::plugin_not_found(id)),
        }
    }

    /// Looks up a data processor.
    ///
    /// # Errors
    /// Returns [`PluginNotFound`](rulecraft_foundation::ErrorKind::PluginNotFound)
    /// if no processor is registered under `id`.
    pub fn processor(&self, id: &str) -> Result<Arc<dyn DataProcessor>> {
        match self.plugins.get(id) {
            Some(Plugin::Processor(plugin)) => Ok(Arc::clone(plugin)),
            Some(other) => Err(wrong_kind(id, "data processor", other)),
            None => Err(Error::plugin_not_found(id)),
        }
    }
}

fn wrong_kind(id: &str, wanted: &str, found: &Plugin) -> Error {
    Error::invalid_configuration(format!("{id} is a {}, not a {wanted}", found.kind()))
}
