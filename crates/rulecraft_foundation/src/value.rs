//! Core value type for all Rulecraft data.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::collections::{LtMap, LtVec};
use crate::entity::{Entity, EntityRef, TARGET_ID_PROPERTY, VALUE_PROPERTY};
use crate::types::Type;

/// Core value type for all Rulecraft data.
///
/// Values are cheaply cloneable. Entities are shared behind an `Arc` and
/// copied on write, lists and maps use structural sharing.
#[derive(Clone)]
pub enum Value {
    /// The nil value (represents absence).
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// Unix timestamp in seconds.
    Timestamp(i64),
    /// Persistent list (field item lists, multi-valued contexts).
    List(LtVec<Value>),
    /// Persistent map of named properties (field items).
    Map(LtMap<Arc<str>, Value>),
    /// Reference to a stored entity.
    EntityRef(EntityRef),
    /// Entity held by value.
    Entity(Arc<Entity>),
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Self::String(s.into())
    }

    /// Creates a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Creates a map value from property names and values.
    #[must_use]
    pub fn map<K: Into<Arc<str>>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Creates a field item holding a single main value.
    #[must_use]
    pub fn item(value: Value) -> Self {
        Self::map([(VALUE_PROPERTY, value)])
    }

    /// Wraps an entity.
    #[must_use]
    pub fn entity(entity: Entity) -> Self {
        Self::Entity(Arc::new(entity))
    }

    /// Returns the type of this value.
    #[must_use]
    pub fn value_type(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Boolean,
            Self::Int(_) => Type::Integer,
            Self::Float(_) => Type::Float,
            Self::String(_) => Type::String,
            Self::Timestamp(_) => Type::Timestamp,
            Self::List(_) => Type::list(Type::Any),
            Self::Map(_) => Type::Map,
            Self::EntityRef(reference) => Type::entity(&*reference.entity_type),
            Self::Entity(entity) => Type::Entity {
                entity_type: Some(entity.entity_type().to_string()),
                bundle: Some(entity.bundle().to_string()),
            },
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value carries no data.
    ///
    /// Nil, empty strings, and empty lists are empty. A list is also empty
    /// when all its items are, and a field item is empty when its main
    /// property is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nil => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.iter().all(Value::is_empty),
            Self::Map(props) => match self.main_property() {
                Some(main) => main.is_empty(),
                None => props.is_empty(),
            },
            _ => false,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) | Self::Timestamp(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a point in time; integers are read as unix seconds.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(n) | Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list reference.
    #[must_use]
    pub const fn as_list(&self) -> Option<&LtVec<Value>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a map reference.
    #[must_use]
    pub const fn as_map(&self) -> Option<&LtMap<Arc<str>, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Attempts to extract an entity reference.
    #[must_use]
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Attempts to extract a mutable entity, cloning it if shared.
    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Self::Entity(e) => Some(Arc::make_mut(e)),
            _ => None,
        }
    }

    /// Returns true for list values.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the first item of a list.
    #[must_use]
    pub fn first_item(&self) -> Option<&Value> {
        self.as_list()?.first()
    }

    /// Returns a named property of a map or a field of an entity.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Map(props) => props.get(name),
            Self::Entity(entity) => entity.field(name),
            _ => None,
        }
    }

    /// Returns the main property of a field item (`value`, else `target_id`).
    #[must_use]
    pub fn main_property(&self) -> Option<&Value> {
        let props = self.as_map()?;
        props
            .get(VALUE_PROPERTY)
            .or_else(|| props.get(TARGET_ID_PROPERTY))
    }

    /// Returns the name of the main property of a field item.
    #[must_use]
    pub fn main_property_name(&self) -> Option<&'static str> {
        let props = self.as_map()?;
        if props.contains_key(VALUE_PROPERTY) {
            Some(VALUE_PROPERTY)
        } else if props.contains_key(TARGET_ID_PROPERTY) {
            Some(TARGET_ID_PROPERTY)
        } else {
            None
        }
    }
}

// Implement PartialEq manually to handle float comparison
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) | (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::EntityRef(a), Self::EntityRef(b)) => a == b,
            (Self::Entity(a), Self::Entity(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Nil, Self::Nil) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            (Self::Int(a) | Self::Timestamp(a), Self::Int(b) | Self::Timestamp(b)) => {
                a.partial_cmp(b)
            }
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            // Cross-type numeric comparison intentionally loses precision for large i64
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            _ => None, // Different types or non-comparable
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Timestamp(n) => write!(f, "@{n}"),
            Self::List(v) => write!(f, "{v:?}"),
            Self::Map(m) => write!(f, "{m:?}"),
            Self::EntityRef(r) => write!(f, "&{r}"),
            Self::Entity(e) => write!(f, "{e:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) | Self::Timestamp(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} {v}")?;
                }
                write!(f, "}}")
            }
            Self::EntityRef(r) => write!(f, "{r}"),
            Self::Entity(e) => write!(f, "{}", e.label()),
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Entity> for Value {
    fn from(entity: Entity) -> Self {
        Self::entity(entity)
    }
}

impl From<EntityRef> for Value {
    fn from(reference: EntityRef) -> Self {
        Self::EntityRef(reference)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}
