//! Data selectors, token replacement, expressions, and execution for Rulecraft.
//!
//! This crate provides:
//! - [`DataSelector`] - Colon-separated paths into context data
//! - [`ContextDefinition`] / [`ContextConfig`] - Typed contexts and their wiring
//! - [`TokenProcessor`] - `[selector]` token replacement in text
//! - [`PluginRegistry`] - Conditions, actions, and data processors
//! - [`ExpressionManager`] - Building rules, conditions, and actions
//! - [`Executor`] - Evaluating expression trees against bound contexts
//! - [`RulesComponent`] - Binding, execution, and auto-saving in one call

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component;
pub mod config;
pub mod context;
pub mod date;
pub mod executor;
pub mod expression;
pub mod message;
pub mod plugin;
pub mod selector;
pub mod token;

pub use component::{ExecutionOutcome, RulesComponent};
pub use config::EngineConfig;
pub use context::{
    BoundContext, ContextConfig, ContextDefinition, ExecutionState, ProcessorConfig, bind,
};
pub use date::format_timestamp;
pub use executor::{ExecutionReport, Executor};
pub use expression::{
    ACTION_EXPRESSION, ActionExpression, BoundProcessor, CONDITION_EXPRESSION,
    ConditionExpression, Expression, ExpressionManager, Parameter, ParameterSource,
    RULE_EXPRESSION, Rule,
};
pub use message::{MessageLog, MessageSink};
pub use plugin::{
    ActionContext, ActionEffects, ActionPlugin, Arguments, ConditionPlugin, DataProcessor, Plugin,
    PluginDefinition, PluginRegistry, ProcessEnv,
};
pub use selector::DataSelector;
pub use token::{Substitution, TokenProcessor, TokenWarning, TokensProcessor};
