//! Expression evaluation.
//!
//! The executor walks an expression tree against an [`ExecutionState`].
//! Conditions are AND-ed with short-circuit; actions run in order. An
//! action's recorded effects (context writes, auto-save marks, provided
//! variables) are applied only after the action returns successfully.

use std::collections::BTreeMap;

use rulecraft_foundation::{Result, Value};
use rulecraft_storage::EntityLoader;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::context::ExecutionState;
use crate::expression::{
    ActionExpression, ConditionExpression, Expression, Parameter, ParameterSource, Rule,
};
use crate::message::MessageSink;
use crate::plugin::{ActionContext, ActionEffects, Arguments, ProcessEnv};
use crate::selector::DataSelector;
use crate::token::TokenWarning;

/// What an evaluation leaves behind.
#[derive(Clone, Debug, Default)]
pub struct ExecutionReport {
    /// Variables after evaluation.
    pub state: ExecutionState,
    /// Selectors of entities to save, in the order they were marked.
    pub dirty: Vec<DataSelector>,
    /// Token warnings collected by data processors.
    pub warnings: Vec<TokenWarning>,
}

/// Evaluates expressions against an execution state.
pub struct Executor<'a> {
    state: ExecutionState,
    loader: &'a dyn EntityLoader,
    messages: &'a mut dyn MessageSink,
    config: &'a EngineConfig,
    dirty: Vec<DataSelector>,
    warnings: Vec<TokenWarning>,
}

impl<'a> Executor<'a> {
    /// Creates an executor over bound variables.
    pub fn new(
        state: ExecutionState,
        loader: &'a dyn EntityLoader,
        messages: &'a mut dyn MessageSink,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            state,
            loader,
            messages,
            config,
            dirty: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns the current variables.
    #[must_use]
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Returns the entities marked for saving so far.
    #[must_use]
    pub fn dirty(&self) -> &[DataSelector] {
        &self.dirty
    }

    /// Consumes the executor, returning what evaluation left behind.
    #[must_use]
    pub fn finish(self) -> ExecutionReport {
        ExecutionReport {
            state: self.state,
            dirty: self.dirty,
            warnings: self.warnings,
        }
    }

    /// Evaluates an expression.
    ///
    /// Returns the condition result for conditions, whether the conditions
    /// passed for rules, and `true` for actions.
    ///
    /// # Errors
    /// Returns the first error raised by a selector, processor, or plugin,
    /// with the expression path recorded in its context.
    pub fn evaluate(&mut self, expression: &Expression) -> Result<bool> {
        match expression {
            Expression::Rule(rule) => self.evaluate_rule(rule),
            Expression::Condition(condition) => self.evaluate_condition(condition),
            Expression::Action(action) => self.execute_action(action).map(|()| true),
        }
    }

    fn evaluate_rule(&mut self, rule: &Rule) -> Result<bool> {
        let frame = rule.frame();

        for condition in rule.conditions() {
            if !self
                .evaluate_condition(condition)
                .map_err(|e| e.with_frame(&frame))?
            {
                debug!(rule = %frame, "rule conditions not met");
                return Ok(false);
            }
        }

        for action in rule.actions() {
            self.evaluate(action).map_err(|e| e.with_frame(&frame))?;
        }
        Ok(true)
    }

    fn evaluate_condition(&mut self, condition: &ConditionExpression) -> Result<bool> {
        let id = condition.plugin_id();

        let args = self
            .arguments(id, condition.parameters())
            .map_err(|e| e.with_frame(condition.frame()))?;
        let result = condition
            .plugin()
            .evaluate(&args)
            .map_err(|e| e.with_frame(condition.frame()))?;
        let result = result != condition.is_negated();
        debug!(condition = id, negated = condition.is_negated(), result, "evaluated condition");
        Ok(result)
    }

    fn execute_action(&mut self, action: &ActionExpression) -> Result<()> {
        let id = action.plugin_id();
        let frame = action.frame();

        let args = self
            .arguments(id, action.parameters())
            .map_err(|e| e.with_frame(&frame))?;
        let mut ctx = ActionContext::new(
            action.plugin().definition(),
            args,
            action.selectors(),
            &mut *self.messages,
            self.loader,
        );
        action
            .plugin()
            .execute(&mut ctx)
            .map_err(|e| e.with_frame(&frame))?;
        let effects = ctx.into_effects();

        info!(action = id, "executed action");
        self.apply(action, effects).map_err(|e| e.with_frame(&frame))
    }

    /// Resolves, processes, adapts, and checks every parameter of a plugin.
    fn arguments(&mut self, plugin: &str, parameters: &[Parameter]) -> Result<Arguments> {
        let mut values = BTreeMap::new();

        for parameter in parameters {
            let mut value = match &parameter.source {
                ParameterSource::Selector(selector) => {
                    self.state.resolve(selector, self.loader, self.config)?
                }
                ParameterSource::Literal(value) => value.clone(),
                ParameterSource::Omitted => continue,
            };

            for bound in &parameter.processors {
                let mut env = ProcessEnv {
                    state: &self.state,
                    loader: self.loader,
                    config: self.config,
                    warnings: &mut self.warnings,
                };
                value = bound.processor.process(value, &bound.settings, &mut env)?;
            }

            let value = parameter.definition.adapt(value, self.loader)?;
            if value.is_nil() && !parameter.definition.is_required() {
                continue;
            }
            parameter.definition.check(&parameter.name, &value)?;
            values.insert(parameter.name.clone(), value);
        }

        Ok(Arguments::new(plugin, values))
    }

    fn apply(&mut self, action: &ActionExpression, effects: ActionEffects) -> Result<()> {
        let id = action.plugin_id();

        for (context, value) in effects.writes {
            match action.selectors().get(&context) {
                Some(selector) => {
                    debug!(action = id, context = %context, selector = %selector, "writing context value back");
                    self.state.assign(selector, value)?;
                }
                None => debug!(action = id, context = %context, "context is not mapped, value not written back"),
            }
        }

        for context in effects.auto_save {
            let Some(selector) = action.selectors().get(&context) else {
                debug!(action = id, context = %context, "context is not mapped, nothing to auto-save");
                continue;
            };
            match self.owning_entity(selector) {
                Some(owner) if !self.dirty.contains(&owner) => {
                    debug!(action = id, entity = %owner, "marked for auto-save");
                    self.dirty.push(owner);
                }
                Some(_) => {}
                None => debug!(action = id, selector = %selector, "no entity owns the selected data"),
            }
        }

        for (provided, value) in effects.provided {
            let name = action.provided_name(&provided).to_string();
            debug!(action = id, variable = %name, "provided variable");
            self.state.set(name, value);
        }

        Ok(())
    }

    /// Finds the longest prefix of `selector` that resolves to an entity.
    ///
    /// Saving happens at the entity owning the selected data: for
    /// `node:title` that is `node`, for `node:uid:entity:name` it is the
    /// referenced user.
    fn owning_entity(&self, selector: &DataSelector) -> Option<DataSelector> {
        (0..=selector.segments().len()).rev().find_map(|len| {
            let prefix = selector.prefix(len);
            match self.state.resolve(&prefix, self.loader, self.config) {
                Ok(Value::Entity(_)) => Some(prefix),
                _ => None,
            }
        })
    }
}
