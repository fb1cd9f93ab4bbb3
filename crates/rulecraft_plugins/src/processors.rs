//! Built-in data processors.

use std::collections::BTreeMap;

use rulecraft_engine::{DataProcessor, ProcessEnv};
use rulecraft_foundation::{Error, Result, Type, Value};

use crate::conditions::scalar;

/// `rules_numeric_offset`: adds the `offset` setting to a number.
///
/// Integers and timestamps keep their type for integer offsets; any float
/// involved makes the result a float.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericOffset;

impl NumericOffset {
    /// Processor id.
    pub const ID: &'static str = "rules_numeric_offset";
}

impl DataProcessor for NumericOffset {
    fn id(&self) -> &str {
        Self::ID
    }

    #[allow(clippy::cast_precision_loss)]
    fn process(
        &self,
        value: Value,
        settings: &BTreeMap<String, Value>,
        _env: &mut ProcessEnv<'_>,
    ) -> Result<Value> {
        let offset = settings.get("offset").ok_or_else(|| {
            Error::invalid_configuration(format!("{} needs an offset setting", Self::ID))
        })?;

        let shifted = match (scalar(&value), offset) {
            (Value::Int(n), Value::Int(by)) => Value::Int(checked(n.checked_add(*by))?),
            (Value::Timestamp(t), Value::Int(by)) => Value::Timestamp(checked(t.checked_add(*by))?),
            (Value::Float(n), Value::Int(by)) => Value::Float(n + *by as f64),
            (number, Value::Float(by)) => match number.as_number() {
                Some(n) => Value::Float(n + by),
                None => return Err(Error::type_mismatch(Type::Float, number.value_type())),
            },
            (number, Value::Int(_)) => {
                return Err(Error::type_mismatch(Type::Integer, number.value_type()));
            }
            (_, other) => return Err(Error::type_mismatch(Type::Integer, other.value_type())),
        };
        Ok(shifted)
    }
}

fn checked(result: Option<i64>) -> Result<i64> {
    result.ok_or_else(|| Error::plugin(NumericOffset::ID, "offset overflows"))
}
