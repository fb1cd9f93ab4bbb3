//! Built-in action plugins.

use rulecraft_engine::{ActionContext, ActionPlugin, ContextDefinition, PluginDefinition};
use rulecraft_foundation::{Error, Result, Type, Value};
use tracing::debug;

// =============================================================================
// System Message
// =============================================================================

/// `rules_system_message`: posts a message to the session.
///
/// The `type` context selects the channel (`status`, `warning` or
/// `error`; `status` when omitted).
pub struct SystemMessage {
    definition: PluginDefinition,
}

impl SystemMessage {
    /// Plugin id.
    pub const ID: &'static str = "rules_system_message";

    /// Channel used when no type is given.
    pub const DEFAULT_CHANNEL: &'static str = "status";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        let channels = ["status", "warning", "error"].map(Value::from);
        Self {
            definition: PluginDefinition::new(Self::ID, "Show a message on the site")
                .with_context("message", ContextDefinition::new(Type::String).with_label("Message"))
                .with_context(
                    "type",
                    ContextDefinition::new(Type::String)
                        .with_label("Message type")
                        .optional()
                        .with_allowed_values(channels),
                ),
        }
    }
}

impl Default for SystemMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for SystemMessage {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        let message = ctx.args().str("message")?.to_string();
        let channel = ctx
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(Self::DEFAULT_CHANNEL)
            .to_string();
        ctx.post_message(&channel, &message);
        Ok(())
    }
}

// =============================================================================
// Data Set
// =============================================================================

/// `rules_data_set`: sets selected data to a new value.
///
/// The entity owning the data is saved after execution.
pub struct DataSet {
    definition: PluginDefinition,
}

impl DataSet {
    /// Plugin id.
    pub const ID: &'static str = "rules_data_set";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: PluginDefinition::new(Self::ID, "Set a data value")
                .with_context("data", ContextDefinition::new(Type::Any).with_label("Data"))
                .with_context(
                    "value",
                    ContextDefinition::new(Type::Any).with_label("Value").optional(),
                ),
        }
    }
}

impl Default for DataSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for DataSet {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        if ctx.selector("data").is_none() {
            return Err(Error::plugin(
                Self::ID,
                "data must be selected, a fixed value cannot be set",
            ));
        }
        let value = ctx.get("value").cloned().unwrap_or(Value::Nil);
        ctx.set_context_value("data", value)?;
        ctx.mark_for_auto_save("data")
    }
}

// =============================================================================
// Entity Save
// =============================================================================

/// `rules_entity_save`: saves an entity after execution.
///
/// Saving is deferred to the end of execution so an entity changed by
/// several actions is written once. `immediate` is accepted for
/// configuration compatibility and has the same effect.
pub struct EntitySave {
    definition: PluginDefinition,
}

impl EntitySave {
    /// Plugin id.
    pub const ID: &'static str = "rules_entity_save";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: PluginDefinition::new(Self::ID, "Save entity")
                .with_context(
                    "entity",
                    ContextDefinition::new(Type::any_entity()).with_label("Entity"),
                )
                .with_context(
                    "immediate",
                    ContextDefinition::new(Type::Boolean)
                        .with_label("Force saving immediately")
                        .optional(),
                ),
        }
    }
}

impl Default for EntitySave {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for EntitySave {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        if ctx.get("immediate").and_then(Value::as_bool) == Some(true) {
            debug!("immediate save requested, saving with the other marked entities");
        }
        ctx.mark_for_auto_save("entity")
    }
}

// =============================================================================
// Variable Add
// =============================================================================

/// `rules_variable_add`: provides a new variable of a given type.
///
/// The variable is provided as `variable_added` unless renamed in the
/// action's configuration.
pub struct VariableAdd {
    definition: PluginDefinition,
}

impl VariableAdd {
    /// Plugin id.
    pub const ID: &'static str = "rules_variable_add";

    /// Name of the provided variable.
    pub const PROVIDED: &'static str = "variable_added";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: PluginDefinition::new(Self::ID, "Add a variable")
                .with_context("type", ContextDefinition::new(Type::String).with_label("Type"))
                .with_context(
                    "value",
                    ContextDefinition::new(Type::Any).with_label("Value").optional(),
                )
                .with_provided(
                    Self::PROVIDED,
                    ContextDefinition::new(Type::Any).with_label("Added variable"),
                ),
        }
    }
}

impl Default for VariableAdd {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPlugin for VariableAdd {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        let ty: Type = ctx.args().str("type")?.parse()?;
        let value = ctx.get("value").cloned().unwrap_or(Value::Nil);
        if !value.is_nil() && !ty.accepts_value(&value) {
            return Err(Error::type_mismatch(ty, value.value_type()));
        }
        ctx.provide(Self::PROVIDED, value)
    }
}
