//! Built-in conditions, actions, and data processors for Rulecraft.
//!
//! This crate provides plugins organized by kind:
//! - Conditions (data comparison, emptiness, entity bundle checks)
//! - Actions (system messages, setting data, saving entities, adding variables)
//! - Processors (numeric offsets; token replacement lives in the engine)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod actions;
pub mod conditions;
pub mod processors;

use rulecraft_engine::PluginRegistry;
use rulecraft_foundation::Result;

pub use actions::{DataSet, EntitySave, SystemMessage, VariableAdd};
pub use conditions::{DataComparison, DataIsEmpty, EntityIsOfBundle};
pub use processors::NumericOffset;

/// Registers every built-in plugin.
///
/// # Errors
/// Returns an error if a built-in id is already registered.
pub fn register_all(registry: &mut PluginRegistry) -> Result<()> {
    registry.register_condition(DataComparison::new())?;
    registry.register_condition(DataIsEmpty::new())?;
    registry.register_condition(EntityIsOfBundle::new())?;

    registry.register_action(SystemMessage::new())?;
    registry.register_action(DataSet::new())?;
    registry.register_action(EntitySave::new())?;
    registry.register_action(VariableAdd::new())?;

    registry.register_processor(NumericOffset)?;
    Ok(())
}

/// Creates a registry with the core processors and every built-in plugin.
///
/// # Errors
/// Returns an error if a built-in id collides with a core plugin.
pub fn registry() -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new_with_core();
    register_all(&mut registry)?;
    Ok(registry)
}
