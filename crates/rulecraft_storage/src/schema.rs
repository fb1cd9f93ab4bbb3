//! Schema definitions for entity types and their fields.
//!
//! Schemas define the fields an entity type carries, which bundles exist,
//! and how field values are validated and defaulted on creation.

use rulecraft_foundation::{Type, Value};

/// Schema definition for an entity type.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityTypeSchema {
    /// Entity type name (e.g., `node`, `user`).
    pub name: String,
    /// Known bundles. An empty list means the bundle equals the type name.
    pub bundles: Vec<String>,
    /// Field definitions.
    pub fields: Vec<FieldSchema>,
}

impl EntityTypeSchema {
    /// Creates a new entity type schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundles: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the schema.
    #[must_use]
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a bundle to the schema.
    #[must_use]
    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundles.push(bundle.into());
        self
    }

    /// Returns the field schema by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if entities of this type may use `bundle`.
    #[must_use]
    pub fn has_bundle(&self, bundle: &str) -> bool {
        if self.bundles.is_empty() {
            bundle == self.name
        } else {
            self.bundles.iter().any(|b| b == bundle)
        }
    }
}

/// Schema definition for a field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// Type of each item's main property. Entity types make a reference field.
    pub ty: Type,
    /// How many items the field may hold.
    pub cardinality: Cardinality,
    /// Default applied on creation when no value is given.
    pub default: Option<FieldDefault>,
    /// Whether the field must be non-empty when saved.
    pub required: bool,
}

impl FieldSchema {
    /// Creates a required single-valued field with no default.
    #[must_use]
    pub fn required(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            cardinality: Cardinality::Single,
            default: None,
            required: true,
        }
    }

    /// Creates an optional single-valued field with a default.
    #[must_use]
    pub fn optional(name: impl Into<String>, ty: Type, default: FieldDefault) -> Self {
        Self {
            name: name.into(),
            ty,
            cardinality: Cardinality::Single,
            default: Some(default),
            required: false,
        }
    }

    /// Creates an optional single-valued field with no default (empty).
    #[must_use]
    pub fn optional_empty(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            cardinality: Cardinality::Single,
            default: None,
            required: false,
        }
    }

    /// Sets the cardinality.
    #[must_use]
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Returns the referenced entity type for reference fields.
    #[must_use]
    pub fn target_type(&self) -> Option<&str> {
        match &self.ty {
            Type::Entity { entity_type, .. } => entity_type.as_deref(),
            _ => None,
        }
    }
}

/// Default value of a field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldDefault {
    /// A fixed value.
    Value(Value),
    /// The time of creation, as a unix timestamp.
    CurrentTime,
}

/// How many items a field may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// At most one item.
    Single,
    /// At most this many items.
    Limited(usize),
    /// No limit.
    Unlimited,
}

impl Cardinality {
    /// Returns true if `count` items are allowed.
    #[must_use]
    pub const fn allows(self, count: usize) -> bool {
        match self {
            Self::Single => count <= 1,
            Self::Limited(max) => count <= max,
            Self::Unlimited => true,
        }
    }
}
