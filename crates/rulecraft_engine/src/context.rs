//! Typed contexts: declaration, configuration, and binding.
//!
//! A [`ContextDefinition`] declares what a context accepts. A
//! [`ContextConfig`] says where a particular expression gets each context
//! value from (a data selector or a literal) and which data processors run on
//! it. [`bind`] validates a full set of values against their definitions and
//! produces the [`ExecutionState`] that expressions evaluate against.

use std::collections::BTreeMap;

use rulecraft_foundation::{
    BindError, ENTITY_PROPERTY, Error, ResolutionError, Result, Type, Value,
};
use rulecraft_storage::EntityLoader;

use crate::config::EngineConfig;
use crate::selector::DataSelector;

// =============================================================================
// Context Definition
// =============================================================================

/// Declaration of a single context.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextDefinition {
    data_type: Type,
    label: Option<String>,
    required: bool,
    multiple: bool,
    allowed_values: Option<Vec<Value>>,
}

impl ContextDefinition {
    /// Creates a required, single-valued context of the given type.
    #[must_use]
    pub fn new(data_type: Type) -> Self {
        Self {
            data_type,
            label: None,
            required: true,
            multiple: false,
            allowed_values: None,
        }
    }

    /// Creates a context from a type tag such as `entity:node` or `string`.
    ///
    /// # Errors
    /// Returns an error if the tag is not a known type.
    pub fn parse(tag: &str) -> Result<Self> {
        Ok(Self::new(tag.parse()?))
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Marks the context as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the context as accepting a list of values.
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Restricts the context to a fixed set of values.
    #[must_use]
    pub fn with_allowed_values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed_values = Some(values.into_iter().collect());
        self
    }

    /// Returns the declared type.
    #[must_use]
    pub fn data_type(&self) -> &Type {
        &self.data_type
    }

    /// Returns the label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns true if a value must be provided.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns true if the context takes a list of values.
    #[must_use]
    pub const fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Returns the allowed values, if restricted.
    #[must_use]
    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.allowed_values.as_deref()
    }

    /// Returns the type a value must satisfy, accounting for `multiple`.
    #[must_use]
    pub fn effective_type(&self) -> Type {
        if self.multiple {
            Type::list(self.data_type.clone())
        } else {
            self.data_type.clone()
        }
    }

    /// Checks a value against this definition.
    ///
    /// # Errors
    /// Returns [`BindError::ContextTypeMismatch`] if the value has the wrong
    /// type and [`BindError::DisallowedValue`] if it is not an allowed value.
    pub fn check(&self, name: &str, value: &Value) -> std::result::Result<(), BindError> {
        let expected = self.effective_type();
        if !expected.accepts_value(value) {
            return Err(BindError::ContextTypeMismatch {
                name: name.to_string(),
                expected,
                actual: value.value_type(),
            });
        }

        if let Some(allowed) = &self.allowed_values {
            let candidates: Vec<&Value> = match value {
                Value::List(items) if self.multiple => items.iter().collect(),
                single => vec![single],
            };
            if let Some(rejected) = candidates.into_iter().find(|v| !allowed.contains(v)) {
                return Err(BindError::DisallowedValue {
                    name: name.to_string(),
                    value: rejected.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Adapts selected data to the shape this context expects.
    ///
    /// Selectors often stop at a field item list (`node:title`) or a field
    /// item. For scalar contexts the main property of the first item is
    /// used; for entity contexts the referenced entity is loaded. Values that
    /// already fit are returned unchanged.
    ///
    /// # Errors
    /// Returns the loader's error if a referenced entity cannot be loaded.
    pub fn adapt(&self, value: Value, loader: &dyn EntityLoader) -> Result<Value> {
        let expected = self.effective_type();
        if expected.accepts_value(&value) || self.multiple {
            return Ok(value);
        }

        let item = match &value {
            Value::List(items) => match items.first() {
                Some(item) => item.clone(),
                None => return Ok(Value::Nil),
            },
            Value::Map(_) => value.clone(),
            _ => return Ok(value),
        };

        let adapted = if self.data_type.is_entity() {
            match item.property(ENTITY_PROPERTY) {
                Some(Value::EntityRef(reference)) => loader
                    .load(&reference.entity_type, reference.id)?
                    .map(Value::entity)
                    .ok_or_else(|| Error::entity_not_found(&*reference.entity_type, reference.id))?,
                Some(entity @ Value::Entity(_)) => entity.clone(),
                _ => return Ok(value),
            }
        } else {
            item.main_property().cloned().unwrap_or(item)
        };

        Ok(adapted)
    }
}

// =============================================================================
// Context Config
// =============================================================================

/// A data processor attached to a context, with its settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorConfig {
    /// Processor plugin id (`rules_tokens`).
    pub id: String,
    /// Processor settings.
    pub settings: BTreeMap<String, Value>,
}

/// Where an expression's context values come from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextConfig {
    mapping: BTreeMap<String, String>,
    values: BTreeMap<String, Value>,
    processors: BTreeMap<String, Vec<ProcessorConfig>>,
    config_keys: BTreeMap<String, Value>,
    provides: BTreeMap<String, String>,
}

impl ContextConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a context to a data selector.
    #[must_use]
    pub fn map(mut self, context: impl Into<String>, selector: impl Into<String>) -> Self {
        let context = context.into();
        self.values.remove(&context);
        self.mapping.insert(context, selector.into());
        self
    }

    /// Sets a literal value for a context.
    #[must_use]
    pub fn set_value(mut self, context: impl Into<String>, value: impl Into<Value>) -> Self {
        let context = context.into();
        self.mapping.remove(&context);
        self.values.insert(context, value.into());
        self
    }

    /// Appends a data processor with no settings to a context.
    #[must_use]
    pub fn process(self, context: impl Into<String>, processor: impl Into<String>) -> Self {
        self.process_with(context, processor, BTreeMap::new())
    }

    /// Appends a data processor with settings to a context.
    #[must_use]
    pub fn process_with(
        mut self,
        context: impl Into<String>,
        processor: impl Into<String>,
        settings: BTreeMap<String, Value>,
    ) -> Self {
        self.processors
            .entry(context.into())
            .or_default()
            .push(ProcessorConfig {
                id: processor.into(),
                settings,
            });
        self
    }

    /// Sets an expression-level configuration key (`action_id`, `negate`).
    #[must_use]
    pub fn set_config_key(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config_keys.insert(key.into(), value.into());
        self
    }

    /// Renames a variable provided by the plugin.
    #[must_use]
    pub fn provide_as(mut self, provided: impl Into<String>, name: impl Into<String>) -> Self {
        self.provides.insert(provided.into(), name.into());
        self
    }

    /// Returns the selector mapped to a context.
    #[must_use]
    pub fn mapping(&self, context: &str) -> Option<&str> {
        self.mapping.get(context).map(String::as_str)
    }

    /// Iterates over all context mappings.
    pub fn mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mapping.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the literal value of a context.
    #[must_use]
    pub fn value(&self, context: &str) -> Option<&Value> {
        self.values.get(context)
    }

    /// Iterates over all literal values.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the processors attached to a context, in order.
    #[must_use]
    pub fn processors(&self, context: &str) -> &[ProcessorConfig] {
        self.processors.get(context).map_or(&[], Vec::as_slice)
    }

    /// Iterates over contexts that have processors.
    pub fn processed_contexts(&self) -> impl Iterator<Item = &str> {
        self.processors.keys().map(String::as_str)
    }

    /// Returns an expression-level configuration key.
    #[must_use]
    pub fn config_key(&self, key: &str) -> Option<&Value> {
        self.config_keys.get(key)
    }

    /// Returns the variable name to use for a provided variable.
    #[must_use]
    pub fn provided_name<'a>(&'a self, provided: &'a str) -> &'a str {
        self.provides.get(provided).map_or(provided, String::as_str)
    }
}

// =============================================================================
// Binding
// =============================================================================

/// Validated context values, ready for evaluation.
pub type BoundContext = ExecutionState;

/// Binds values to context definitions.
///
/// Binding is total-or-nothing: either every value passes and every required
/// context has a value, or nothing is bound.
///
/// # Errors
/// Returns the first [`BindError`] found, checking undeclared values first
/// and then definitions in name order.
pub fn bind(
    definitions: &BTreeMap<String, ContextDefinition>,
    values: BTreeMap<String, Value>,
) -> std::result::Result<BoundContext, BindError> {
    if let Some(name) = values.keys().find(|name| !definitions.contains_key(*name)) {
        return Err(BindError::UndefinedContext { name: name.clone() });
    }

    for (name, definition) in definitions {
        match values.get(name) {
            Some(value) if !value.is_nil() => definition.check(name, value)?,
            _ if definition.is_required() => {
                return Err(BindError::MissingContextValue { name: name.clone() });
            }
            _ => {}
        }
    }

    Ok(ExecutionState {
        variables: values.into_iter().filter(|(_, v)| !v.is_nil()).collect(),
    })
}

// =============================================================================
// Execution State
// =============================================================================

/// Variables available while a component evaluates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionState {
    variables: BTreeMap<String, Value>,
}

impl ExecutionState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns true if the variable is set.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Sets a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Iterates over all variables in name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Consumes the state, returning its variables.
    #[must_use]
    pub fn into_variables(self) -> BTreeMap<String, Value> {
        self.variables
    }

    /// Resolves a selector against this state.
    ///
    /// # Errors
    /// Returns [`ResolutionError::UndefinedVariable`] if the root variable is
    /// not set, or any error from resolving the rest of the path.
    pub fn resolve(
        &self,
        selector: &DataSelector,
        loader: &dyn EntityLoader,
        config: &EngineConfig,
    ) -> Result<Value> {
        let root = self
            .variables
            .get(selector.variable())
            .ok_or_else(|| ResolutionError::UndefinedVariable(selector.variable().to_string()))?;
        selector.resolve(root, loader, config)
    }

    /// Writes a value at a selector's path.
    ///
    /// # Errors
    /// Returns [`ResolutionError::UndefinedVariable`] if the root variable is
    /// not set, or any error from writing the rest of the path.
    pub fn assign(
        &mut self,
        selector: &DataSelector,
        value: Value,
    ) -> std::result::Result<(), ResolutionError> {
        let root = self
            .variables
            .get_mut(selector.variable())
            .ok_or_else(|| ResolutionError::UndefinedVariable(selector.variable().to_string()))?;
        selector.assign(root, value)
    }
}
