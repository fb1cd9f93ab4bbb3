//! Executable rules components.
//!
//! A [`RulesComponent`] bundles an expression with the contexts it expects
//! and the values staged for them. Executing it binds the values, evaluates
//! the expression, and saves every entity marked for auto-saving exactly
//! once.

use std::collections::BTreeMap;
use std::sync::Arc;

use rulecraft_foundation::{Entity, EntityRef, Error, Result, Value};
use rulecraft_storage::EntityStorage;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::context::{ContextDefinition, ExecutionState, bind};
use crate::executor::{ExecutionReport, Executor};
use crate::expression::Expression;
use crate::message::MessageSink;
use crate::selector::DataSelector;
use crate::token::TokenWarning;

/// What a successful execution produced.
#[derive(Clone, Debug, Default)]
pub struct ExecutionOutcome {
    /// Variables after execution, including provided ones.
    pub variables: BTreeMap<String, Value>,
    /// Entities saved by auto-save, in save order.
    pub saved: Vec<EntityRef>,
    /// Tokens that could not be replaced.
    pub warnings: Vec<TokenWarning>,
    /// Whether the root expression passed (false if a rule's conditions failed).
    pub passed: bool,
}

impl ExecutionOutcome {
    /// Returns a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns a variable holding an entity.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.variables.get(name).and_then(Value::as_entity)
    }
}

/// An expression together with its context definitions and staged values.
#[derive(Clone, Debug)]
pub struct RulesComponent {
    expression: Expression,
    label: Option<String>,
    definitions: BTreeMap<String, ContextDefinition>,
    values: BTreeMap<String, Value>,
    config: EngineConfig,
}

impl RulesComponent {
    /// Creates a component with no contexts.
    #[must_use]
    pub fn new(expression: impl Into<Expression>) -> Self {
        Self {
            expression: expression.into(),
            label: None,
            definitions: BTreeMap::new(),
            values: BTreeMap::new(),
            config: EngineConfig::default(),
        }
    }

    /// Sets the label used in logs and error contexts.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Declares a context.
    #[must_use]
    pub fn with_context_definition(
        mut self,
        name: impl Into<String>,
        definition: ContextDefinition,
    ) -> Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    /// Stages a context value.
    #[must_use]
    pub fn with_context_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_context_value(name, value);
        self
    }

    /// Stages a context value in place.
    pub fn set_context_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the root expression.
    #[must_use]
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Returns the declared contexts.
    #[must_use]
    pub fn context_definitions(&self) -> &BTreeMap<String, ContextDefinition> {
        &self.definitions
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Binds the staged values, evaluates the expression, and auto-saves.
    ///
    /// If evaluation fails, entities marked by actions that completed before
    /// the failure are still saved and the evaluation error is returned.
    ///
    /// # Errors
    /// Returns a binding error if the staged values do not fit the context
    /// definitions (nothing is evaluated), the first evaluation error, or a
    /// persistence error from auto-saving.
    pub fn execute(
        self,
        storage: &mut dyn EntityStorage,
        messages: &mut dyn MessageSink,
    ) -> Result<ExecutionOutcome> {
        let label = self.label.as_deref().unwrap_or("component").to_string();
        let state = bind(&self.definitions, self.values)
            .map_err(|e| Error::from(e).with_source(&label))?;
        info!(component = %label, contexts = self.definitions.len(), "executing component");

        let (result, report) = {
            let mut executor = Executor::new(state, storage.as_loader(), messages, &self.config);
            let result = executor.evaluate(&self.expression);
            (result, executor.finish())
        };
        let ExecutionReport {
            mut state,
            dirty,
            warnings,
        } = report;

        let passed = match result {
            Ok(passed) => passed,
            Err(err) => {
                if self.config.auto_save && !dirty.is_empty() {
                    if let Err(save_err) = auto_save(&mut state, &dirty, storage, &self.config) {
                        warn!(component = %label, error = %save_err, "auto-save after failed execution failed");
                    }
                }
                return Err(err.with_source(label));
            }
        };

        let saved = if self.config.auto_save {
            auto_save(&mut state, &dirty, storage, &self.config)
                .map_err(|e| e.with_source(&label))?
        } else {
            debug!(component = %label, pending = dirty.len(), "auto-save disabled");
            Vec::new()
        };

        info!(component = %label, passed, saved = saved.len(), "component executed");
        Ok(ExecutionOutcome {
            variables: state.into_variables(),
            saved,
            warnings,
            passed,
        })
    }
}

/// Saves each dirty entity once and writes the saved entity back.
///
/// Every entity is attempted even if an earlier save fails; the first
/// failure is returned after the rest have been saved.
fn auto_save(
    state: &mut ExecutionState,
    dirty: &[DataSelector],
    storage: &mut dyn EntityStorage,
    config: &EngineConfig,
) -> Result<Vec<EntityRef>> {
    let mut saved = Vec::with_capacity(dirty.len());
    let mut first_error: Option<Error> = None;

    for selector in dirty {
        let current = if selector.is_variable() {
            state.get(selector.variable()).cloned()
        } else {
            state.resolve(selector, storage.as_loader(), config).ok()
        };
        let Some(Value::Entity(entity)) = current else {
            warn!(selector = %selector, "marked data no longer holds an entity, not saved");
            continue;
        };

        let mut entity = Arc::unwrap_or_clone(entity);
        let id = match storage.save(&mut entity) {
            Ok(id) => id,
            Err(err) => {
                warn!(entity = %entity.label(), error = %err, "auto-save failed");
                first_error.get_or_insert(err);
                continue;
            }
        };
        info!(entity = %entity.label(), "auto-saved entity");
        saved.push(EntityRef::new(entity.entity_type(), id));

        if let Err(err) = state.assign(selector, Value::entity(entity)) {
            debug!(selector = %selector, error = %err, "saved entity not written back");
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(saved),
    }
}
