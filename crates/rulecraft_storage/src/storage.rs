//! Host entity collaborator traits.
//!
//! The engine never owns persistence. It reads referenced entities through
//! [`EntityLoader`] while resolving selectors, and asks [`EntityStorage`] to
//! save entities that actions marked for auto-saving.

use rulecraft_foundation::{Entity, EntityId, Result, Value};

/// Read access to stored entities.
pub trait EntityLoader {
    /// Loads an entity by type and id.
    ///
    /// Returns `Ok(None)` if no such entity exists.
    ///
    /// # Errors
    /// Returns an error if the entity type is unknown or the backend fails.
    fn load(&self, entity_type: &str, id: EntityId) -> Result<Option<Entity>>;
}

/// Full entity storage: creation, saving, and loading.
pub trait EntityStorage: EntityLoader {
    /// Creates a new, unsaved entity with the given field values.
    ///
    /// # Errors
    /// Returns an error if the entity type or bundle is unknown, or a field
    /// value does not fit the field's schema.
    fn create(
        &self,
        entity_type: &str,
        bundle: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<Entity>;

    /// Saves an entity, assigning an id if it is new.
    ///
    /// # Errors
    /// Returns a persistence error if the entity cannot be stored.
    fn save(&mut self, entity: &mut Entity) -> Result<EntityId>;

    /// Returns this storage as a loader.
    fn as_loader(&self) -> &dyn EntityLoader;
}

/// A loader with no entities, for evaluations that never cross references.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLoader;

impl EntityLoader for NullLoader {
    fn load(&self, _entity_type: &str, _id: EntityId) -> Result<Option<Entity>> {
        Ok(None)
    }
}
