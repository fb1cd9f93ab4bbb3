//! Built-in condition plugins.

use std::cmp::Ordering;

use rulecraft_engine::{Arguments, ConditionPlugin, ContextDefinition, PluginDefinition};
use rulecraft_foundation::{Error, Result, Type, Value};

/// Reduces selected field data to the value it stands for.
///
/// A single-item field list becomes its item, and a field item its main
/// property. Anything else is returned as is.
pub(crate) fn scalar(value: &Value) -> &Value {
    match value {
        Value::List(items) if items.len() == 1 => items.first().map_or(value, scalar),
        Value::Map(_) => value.main_property().unwrap_or(value),
        _ => value,
    }
}

fn string_context() -> ContextDefinition {
    ContextDefinition::new(Type::String)
}

// =============================================================================
// Data Comparison
// =============================================================================

/// `rules_data_comparison`: compares data with a value.
///
/// Operations are `==` (default), `<`, `>`, `contains` (substring or list
/// member) and `in` (member of the value list).
pub struct DataComparison {
    definition: PluginDefinition,
}

impl DataComparison {
    /// Plugin id.
    pub const ID: &'static str = "rules_data_comparison";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        let operations = ["==", "<", ">", "contains", "in"].map(Value::from);
        Self {
            definition: PluginDefinition::new(Self::ID, "Data comparison")
                .with_context(
                    "data",
                    ContextDefinition::new(Type::Any).with_label("Data to compare"),
                )
                .with_context(
                    "operation",
                    string_context()
                        .with_label("Operator")
                        .optional()
                        .with_allowed_values(operations),
                )
                .with_context("value", ContextDefinition::new(Type::Any).with_label("Data value")),
        }
    }
}

impl Default for DataComparison {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionPlugin for DataComparison {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn evaluate(&self, args: &Arguments) -> Result<bool> {
        let data = scalar(args.require("data")?);
        let value = scalar(args.require("value")?);
        let operation = args.get("operation").and_then(Value::as_str).unwrap_or("==");

        let passed = match operation {
            "==" => data == value,
            "<" => compare(data, value)? == Ordering::Less,
            ">" => compare(data, value)? == Ordering::Greater,
            "contains" => contains(data, value),
            "in" => contains(value, data),
            other => {
                return Err(Error::plugin(Self::ID, format!("unknown operation {other}")));
            }
        };
        Ok(passed)
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    a.partial_cmp(b).ok_or_else(|| Error::type_mismatch(a.value_type(), b.value_type()))
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(text), Value::String(part)) => text.contains(&**part),
        (Value::List(items), _) => items.iter().any(|item| scalar(item) == needle),
        _ => false,
    }
}

// =============================================================================
// Data Is Empty
// =============================================================================

/// `rules_data_is_empty`: passes if the data carries no value.
pub struct DataIsEmpty {
    definition: PluginDefinition,
}

impl DataIsEmpty {
    /// Plugin id.
    pub const ID: &'static str = "rules_data_is_empty";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: PluginDefinition::new(Self::ID, "Data value is empty").with_context(
                "data",
                ContextDefinition::new(Type::Any).with_label("Data to check").optional(),
            ),
        }
    }
}

impl Default for DataIsEmpty {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionPlugin for DataIsEmpty {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn evaluate(&self, args: &Arguments) -> Result<bool> {
        Ok(args.get("data").is_none_or(Value::is_empty))
    }
}

// =============================================================================
// Entity Is Of Bundle
// =============================================================================

/// `rules_entity_is_of_bundle`: checks an entity's type and bundle.
pub struct EntityIsOfBundle {
    definition: PluginDefinition,
}

impl EntityIsOfBundle {
    /// Plugin id.
    pub const ID: &'static str = "rules_entity_is_of_bundle";

    /// Creates the plugin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: PluginDefinition::new(Self::ID, "Entity is of bundle")
                .with_context("entity", ContextDefinition::new(Type::any_entity()))
                .with_context("type", string_context().with_label("Type"))
                .with_context("bundle", string_context().with_label("Bundle")),
        }
    }
}

impl Default for EntityIsOfBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionPlugin for EntityIsOfBundle {
    fn definition(&self) -> &PluginDefinition {
        &self.definition
    }

    fn evaluate(&self, args: &Arguments) -> Result<bool> {
        let value = args.require("entity")?;
        let entity = value
            .as_entity()
            .ok_or_else(|| Error::type_mismatch(Type::any_entity(), value.value_type()))?;
        Ok(entity.entity_type() == args.str("type")? && entity.bundle() == args.str("bundle")?)
    }
}
