//! Type tags for context definitions and runtime checks.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// Declared data type of a context or plugin parameter.
///
/// Type tags have a textual form (`"string"`, `"entity:node"`,
/// `"list:integer"`) that round-trips through [`FromStr`] and [`fmt::Display`].
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub enum Type {
    /// The nil type (only value: nil).
    Nil,
    /// Boolean type.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point.
    Float,
    /// String type.
    String,
    /// Unix timestamp in seconds.
    Timestamp,
    /// Structured value with named properties (field items).
    Map,
    /// Homogeneous list type.
    List(Box<Type>),
    /// Content entity, optionally restricted to an entity type and bundle.
    Entity {
        /// Required entity type, if any.
        entity_type: Option<String>,
        /// Required bundle, if any.
        bundle: Option<String>,
    },
    /// Any type (accepts any value).
    Any,
}

impl Type {
    /// Creates an entity type restricted to `entity_type`.
    #[must_use]
    pub fn entity(entity_type: impl Into<String>) -> Self {
        Self::Entity {
            entity_type: Some(entity_type.into()),
            bundle: None,
        }
    }

    /// Creates an entity type accepting any entity.
    #[must_use]
    pub const fn any_entity() -> Self {
        Self::Entity {
            entity_type: None,
            bundle: None,
        }
    }

    /// Creates a list type with the given element type.
    #[must_use]
    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    /// Returns true if this type is `Any`.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns true for entity types.
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self, Self::Entity { .. })
    }

    /// Checks if a value type is accepted by this type.
    ///
    /// - `Any` accepts all types
    /// - Integers are accepted where floats or timestamps are expected
    /// - Entity types accept entities of the same or a narrower type/bundle
    /// - List types check element types recursively
    #[must_use]
    pub fn accepts(&self, value_type: &Type) -> bool {
        match (self, value_type) {
            (Self::Any, _)
            | (Self::Nil, Self::Nil)
            | (Self::Boolean, Self::Boolean)
            | (Self::Integer | Self::Float | Self::Timestamp, Self::Integer)
            | (Self::Float, Self::Float)
            | (Self::Timestamp, Self::Timestamp)
            | (Self::String, Self::String)
            | (Self::Map, Self::Map) => true,

            // Runtime lists report `list:any`; element checks happen per value.
            (Self::List(expected), Self::List(actual)) => {
                actual.is_any() || expected.accepts(actual)
            }

            (
                Self::Entity {
                    entity_type: want_type,
                    bundle: want_bundle,
                },
                Self::Entity {
                    entity_type: have_type,
                    bundle: have_bundle,
                },
            ) => {
                let type_ok = want_type.is_none() || want_type == have_type;
                let bundle_ok = want_bundle.is_none() || want_bundle == have_bundle;
                type_ok && bundle_ok
            }

            _ => false,
        }
    }

    /// Checks a concrete value against this type, including list elements.
    #[must_use]
    pub fn accepts_value(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::List(element), Value::List(items)) => {
                items.iter().all(|item| element.accepts_value(item))
            }
            _ => self.accepts(&value.value_type()),
        }
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        let head = parts.next().unwrap_or_default();
        let rest = parts.next();

        let ty = match (head, rest) {
            ("any", None) => Self::Any,
            ("nil", None) => Self::Nil,
            ("boolean", None) => Self::Boolean,
            ("integer", None) => Self::Integer,
            ("float", None) => Self::Float,
            ("string", None) => Self::String,
            ("timestamp", None) => Self::Timestamp,
            ("map", None) => Self::Map,
            ("list", None) => Self::list(Self::Any),
            ("list", Some(inner)) => Self::list(inner.parse()?),
            ("entity", None) => Self::any_entity(),
            ("entity", Some(rest)) => {
                let mut pieces = rest.splitn(2, ':');
                let entity_type = pieces.next().filter(|p| !p.is_empty());
                let bundle = pieces.next().filter(|p| !p.is_empty());
                if entity_type.is_none() {
                    return Err(Error::invalid_configuration(format!(
                        "malformed entity type tag: {s}"
                    )));
                }
                Self::Entity {
                    entity_type: entity_type.map(str::to_string),
                    bundle: bundle.map(str::to_string),
                }
            }
            _ => {
                return Err(Error::invalid_configuration(format!(
                    "unknown type tag: {s}"
                )));
            }
        };
        Ok(ty)
    }
}

impl TryFrom<String> for Type {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Type> for String {
    fn from(ty: Type) -> Self {
        ty.to_string()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Map => write!(f, "map"),
            Self::List(t) if t.is_any() => write!(f, "list"),
            Self::List(t) => write!(f, "list:{t:?}"),
            Self::Entity {
                entity_type,
                bundle,
            } => {
                write!(f, "entity")?;
                if let Some(entity_type) = entity_type {
                    write!(f, ":{entity_type}")?;
                    if let Some(bundle) = bundle {
                        write!(f, ":{bundle}")?;
                    }
                }
                Ok(())
            }
            Self::Any => write!(f, "any"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
