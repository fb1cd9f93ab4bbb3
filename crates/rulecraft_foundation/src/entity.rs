//! Entity identifiers and content entities.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::collections::{LtMap, LtVec};
use crate::value::Value;

/// Property name of the main value inside a scalar field item.
pub const VALUE_PROPERTY: &str = "value";
/// Property name of the referenced id inside a reference field item.
pub const TARGET_ID_PROPERTY: &str = "target_id";
/// Property name of the referenced entity inside a reference field item.
pub const ENTITY_PROPERTY: &str = "entity";

/// Storage-assigned entity identifier.
///
/// Identifiers are unique per entity type and are only assigned when the
/// host storage saves an entity for the first time.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub u64);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pointer to a stored entity: entity type plus identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    /// The referenced entity type.
    pub entity_type: Arc<str>,
    /// The referenced identifier.
    pub id: EntityId,
}

impl EntityRef {
    /// Creates a new entity reference.
    #[must_use]
    pub fn new(entity_type: impl Into<Arc<str>>, id: EntityId) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// A content entity: typed, bundled, and made of field item lists.
///
/// Every field is stored as a list of items, and every item is a map of
/// named properties. Scalar fields keep their data under `value`;
/// entity reference fields keep `target_id` and `entity`.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    entity_type: Arc<str>,
    bundle: Arc<str>,
    id: Option<EntityId>,
    fields: LtMap<Arc<str>, Value>,
}

impl Entity {
    /// Creates a new, unsaved entity with no fields.
    #[must_use]
    pub fn new(entity_type: impl Into<Arc<str>>, bundle: impl Into<Arc<str>>) -> Self {
        Self {
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            id: None,
            fields: LtMap::new(),
        }
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the bundle.
    #[must_use]
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// Returns the identifier, if the entity has been saved.
    #[must_use]
    pub const fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Sets the identifier. Only the host storage should call this.
    pub fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    /// Returns true if the entity has never been saved.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Returns a reference to this entity, if it has been saved.
    #[must_use]
    pub fn reference(&self) -> Option<EntityRef> {
        self.id
            .map(|id| EntityRef::new(Arc::clone(&self.entity_type), id))
    }

    /// Returns the item list of a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the item list of a field for in-place edits.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.get_mut(name)
    }

    /// Returns true if the entity has the field.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over field names and item lists in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (&**k, v))
    }

    /// Replaces a field's item list.
    ///
    /// A non-list value is wrapped into a single-item list, and a scalar item
    /// is wrapped into `{value: …}`.
    pub fn set_field(&mut self, name: impl Into<Arc<str>>, items: Value) {
        let items = match items {
            Value::List(_) => items,
            Value::Nil => Value::List(LtVec::new()),
            Value::Map(_) => Value::list([items]),
            scalar => Value::list([Value::item(scalar)]),
        };
        self.fields.insert_mut(name.into(), items);
    }

    /// Returns the main property of the first item of a field.
    #[must_use]
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.field(name)?.first_item()?.main_property()
    }

    /// Points a reference field at `target`.
    ///
    /// Saved targets are stored by reference; unsaved targets are embedded
    /// so that they stay reachable before they get an id.
    pub fn set_reference(&mut self, name: impl Into<Arc<str>>, target: &Entity) {
        let item = match target.reference() {
            Some(reference) => Value::map([
                (TARGET_ID_PROPERTY, Value::Int(id_as_int(reference.id))),
                (ENTITY_PROPERTY, Value::EntityRef(reference)),
            ]),
            None => Value::map([
                (TARGET_ID_PROPERTY, Value::Nil),
                (ENTITY_PROPERTY, Value::Entity(Arc::new(target.clone()))),
            ]),
        };
        self.fields.insert_mut(name.into(), Value::list([item]));
    }

    /// Returns the identifier stored in the first item of a reference field.
    #[must_use]
    pub fn reference_target(&self, name: &str) -> Option<EntityId> {
        let item = self.field(name)?.first_item()?;
        match item.property(ENTITY_PROPERTY) {
            Some(Value::EntityRef(reference)) => Some(reference.id),
            Some(Value::Entity(entity)) => entity.id(),
            _ => item
                .property(TARGET_ID_PROPERTY)
                .and_then(Value::as_int)
                .and_then(|id| u64::try_from(id).ok())
                .map(EntityId),
        }
    }

    /// Returns a short label (`node:3`, or `node:new` before saving).
    #[must_use]
    pub fn label(&self) -> String {
        match self.id {
            Some(id) => format!("{}:{id}", self.entity_type),
            None => format!("{}:new", self.entity_type),
        }
    }
}

/// Converts an id into the integer form stored in `target_id` properties.
#[must_use]
pub fn id_as_int(id: EntityId) -> i64 {
    i64::try_from(id.get()).unwrap_or(i64::MAX)
}
