//! In-memory entity storage.
//!
//! Ids are allocated sequentially per entity type starting at 1. Every save
//! is recorded so callers can check how often an entity was written.

use std::collections::{BTreeMap, HashMap};

use rulecraft_foundation::{
    ENTITY_PROPERTY, Entity, EntityId, EntityRef, Error, LtVec, Result, TARGET_ID_PROPERTY, Type,
    Value, id_as_int,
};
use tracing::debug;

use crate::schema::{EntityTypeSchema, FieldDefault, FieldSchema};
use crate::storage::{EntityLoader, EntityStorage};

/// Entity storage kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    schemas: HashMap<String, EntityTypeSchema>,
    entities: HashMap<String, BTreeMap<EntityId, Entity>>,
    next_ids: HashMap<String, u64>,
    save_log: Vec<EntityRef>,
}

impl MemoryStorage {
    /// Creates an empty storage with no entity types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type.
    ///
    /// # Errors
    /// Returns an error if the entity type is already registered.
    pub fn register_entity_type(&mut self, schema: EntityTypeSchema) -> Result<()> {
        if self.schemas.contains_key(&schema.name) {
            return Err(Error::invalid_configuration(format!(
                "entity type {} is already registered",
                schema.name
            )));
        }
        debug!(entity_type = %schema.name, "registered entity type");
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Adds a bundle to a registered entity type.
    ///
    /// # Errors
    /// Returns an error if the entity type is unknown.
    pub fn add_bundle(&mut self, entity_type: &str, bundle: impl Into<String>) -> Result<()> {
        let schema = self.schemas.get_mut(entity_type).ok_or_else(|| {
            Error::invalid_configuration(format!("unknown entity type: {entity_type}"))
        })?;
        let bundle = bundle.into();
        if !schema.bundles.contains(&bundle) {
            schema.bundles.push(bundle);
        }
        Ok(())
    }

    /// Returns the schema of an entity type.
    #[must_use]
    pub fn schema(&self, entity_type: &str) -> Option<&EntityTypeSchema> {
        self.schemas.get(entity_type)
    }

    /// Returns the number of stored entities of a type.
    #[must_use]
    pub fn count(&self, entity_type: &str) -> usize {
        self.entities.get(entity_type).map_or(0, BTreeMap::len)
    }

    /// Returns every save performed, in order.
    #[must_use]
    pub fn save_log(&self) -> &[EntityRef] {
        &self.save_log
    }

    /// Returns how many times a given entity was saved.
    #[must_use]
    pub fn save_count(&self, entity_type: &str, id: EntityId) -> usize {
        self.save_log
            .iter()
            .filter(|r| &*r.entity_type == entity_type && r.id == id)
            .count()
    }

    fn schema_or_err(&self, entity_type: &str) -> Result<&EntityTypeSchema> {
        self.schemas.get(entity_type).ok_or_else(|| {
            Error::invalid_configuration(format!("unknown entity type: {entity_type}"))
        })
    }
}

impl EntityLoader for MemoryStorage {
    fn load(&self, entity_type: &str, id: EntityId) -> Result<Option<Entity>> {
        self.schema_or_err(entity_type)?;
        Ok(self
            .entities
            .get(entity_type)
            .and_then(|by_id| by_id.get(&id))
            .cloned())
    }
}

impl EntityStorage for MemoryStorage {
    fn create(
        &self,
        entity_type: &str,
        bundle: &str,
        fields: Vec<(String, Value)>,
    ) -> Result<Entity> {
        let schema = self.schema_or_err(entity_type)?;
        if !schema.has_bundle(bundle) {
            return Err(Error::invalid_configuration(format!(
                "unknown bundle {bundle} for entity type {entity_type}"
            )));
        }

        let mut entity = Entity::new(entity_type, bundle);
        for (name, value) in fields {
            let field = schema.field(&name).ok_or_else(|| {
                Error::invalid_configuration(format!("{entity_type} has no field {name}"))
            })?;
            let items = normalize_field(field, value)?;
            entity.set_field(name, items);
        }

        for field in &schema.fields {
            if entity.has_field(&field.name) {
                continue;
            }
            let items = match &field.default {
                Some(FieldDefault::Value(value)) => normalize_field(field, value.clone())?,
                Some(FieldDefault::CurrentTime) => {
                    Value::list([Value::item(Value::Timestamp(chrono::Utc::now().timestamp()))])
                }
                None => Value::List(LtVec::new()),
            };
            entity.set_field(field.name.as_str(), items);
        }

        Ok(entity)
    }

    fn save(&mut self, entity: &mut Entity) -> Result<EntityId> {
        let entity_type = entity.entity_type().to_string();
        let schema = self
            .schemas
            .get(&entity_type)
            .ok_or_else(|| Error::persistence(&entity_type, "unknown entity type"))?;

        for field in schema.fields.iter().filter(|f| f.required) {
            if entity.field(&field.name).is_none_or(Value::is_empty) {
                return Err(Error::persistence(
                    &entity_type,
                    format!("field {} is required", field.name),
                ));
            }
        }

        let id = if let Some(id) = entity.id() {
            id
        } else {
            let next = self.next_ids.entry(entity_type.clone()).or_insert(1);
            let id = EntityId::new(*next);
            *next += 1;
            entity.set_id(id);
            id
        };

        debug!(entity_type = %entity_type, id = %id, "saved entity");
        self.entities
            .entry(entity_type.clone())
            .or_default()
            .insert(id, entity.clone());
        self.save_log.push(EntityRef::new(entity_type, id));
        Ok(id)
    }

    fn as_loader(&self) -> &dyn EntityLoader {
        self
    }
}

/// Converts a caller-supplied field value into a validated item list.
fn normalize_field(field: &FieldSchema, value: Value) -> Result<Value> {
    let raw_items: Vec<Value> = match value {
        Value::List(items) => items.into_iter().collect(),
        Value::Nil => Vec::new(),
        single => vec![single],
    };

    if !field.cardinality.allows(raw_items.len()) {
        return Err(Error::invalid_configuration(format!(
            "field {} accepts {:?} items, got {}",
            field.name,
            field.cardinality,
            raw_items.len()
        )));
    }

    let items = raw_items
        .into_iter()
        .map(|item| normalize_item(field, item))
        .collect::<Result<LtVec<Value>>>()?;
    Ok(Value::List(items))
}

fn normalize_item(field: &FieldSchema, item: Value) -> Result<Value> {
    if let Some(target_type) = field.target_type() {
        return reference_item(field, target_type, item);
    }

    let value = match item {
        Value::Map(_) => return Ok(item),
        Value::Int(n) if field.ty == Type::Timestamp => Value::Timestamp(n),
        other => other,
    };
    if !field.ty.accepts_value(&value) {
        return Err(Error::type_mismatch(field.ty.clone(), value.value_type()));
    }
    Ok(Value::item(value))
}

fn reference_item(field: &FieldSchema, target_type: &str, item: Value) -> Result<Value> {
    match item {
        Value::Map(_) => Ok(item),
        Value::Entity(entity) => {
            if !field.ty.accepts_value(&Value::Entity(entity.clone())) {
                return Err(Error::type_mismatch(
                    field.ty.clone(),
                    Value::Entity(entity).value_type(),
                ));
            }
            let item = match entity.reference() {
                Some(reference) => Value::map([
                    (TARGET_ID_PROPERTY, Value::Int(id_as_int(reference.id))),
                    (ENTITY_PROPERTY, Value::EntityRef(reference)),
                ]),
                None => Value::map([
                    (TARGET_ID_PROPERTY, Value::Nil),
                    (ENTITY_PROPERTY, Value::Entity(entity)),
                ]),
            };
            Ok(item)
        }
        Value::EntityRef(reference) if &*reference.entity_type == target_type => {
            Ok(Value::map([
                (TARGET_ID_PROPERTY, Value::Int(id_as_int(reference.id))),
                (ENTITY_PROPERTY, Value::EntityRef(reference)),
            ]))
        }
        Value::Int(raw) => {
            let id = u64::try_from(raw).map_err(|_| {
                Error::invalid_configuration(format!("invalid id {raw} for field {}", field.name))
            })?;
            Ok(Value::map([
                (TARGET_ID_PROPERTY, Value::Int(raw)),
                (
                    ENTITY_PROPERTY,
                    Value::EntityRef(EntityRef::new(target_type, EntityId::new(id))),
                ),
            ]))
        }
        other => Err(Error::type_mismatch(field.ty.clone(), other.value_type())),
    }
}
