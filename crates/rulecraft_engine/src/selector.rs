//! Data selectors: colon-delimited paths into bound context data.
//!
//! A selector such as `node:uid:entity:name:value` names a root variable
//! (`node`) followed by segments. Resolution walks the segments like a
//! reducer over the current value:
//!
//! - a list takes a numeric segment as an index; any other segment selects
//!   item 0 and is applied again to that item
//! - an entity takes a field name or a base property (`id`, `bundle`,
//!   `entity_type`)
//! - a map (field item) takes a property name
//! - an entity reference is loaded through the host [`EntityLoader`] and the
//!   segment is applied to the loaded entity
//! - a temporal value takes a formatting qualifier (`custom:<pattern>`, a
//!   named format, or `raw`)

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rulecraft_foundation::{
    ENTITY_PROPERTY, EntityRef, Error, LtMap, LtVec, ResolutionError, Result, TARGET_ID_PROPERTY,
    VALUE_PROPERTY, Value, id_as_int,
};
use rulecraft_storage::EntityLoader;

use crate::config::EngineConfig;
use crate::date::format_timestamp;

/// Qualifier introducing a literal date pattern (`created:custom:Y-m-d`).
pub const CUSTOM_QUALIFIER: &str = "custom";
/// Qualifier returning the unformatted timestamp.
pub const RAW_QUALIFIER: &str = "raw";

const BASE_PROPERTIES: [&str; 3] = ["id", "bundle", "entity_type"];

/// A parsed data selector.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DataSelector {
    source: String,
    variable: String,
    segments: Vec<String>,
}

impl DataSelector {
    /// Parses a selector string.
    ///
    /// # Errors
    /// Returns [`ResolutionError::EmptyPath`] for an empty string or a missing
    /// root variable, and [`ResolutionError::UnknownProperty`] for an empty
    /// segment (`node::title`).
    pub fn parse(source: &str) -> std::result::Result<Self, ResolutionError> {
        let source = source.trim();
        let mut parts = source.split(':');
        let variable = match parts.next() {
            Some(variable) if !variable.is_empty() => variable.to_string(),
            _ => return Err(ResolutionError::EmptyPath),
        };

        let mut segments = Vec::new();
        for part in parts {
            if part.is_empty() {
                return Err(ResolutionError::UnknownProperty {
                    property: String::new(),
                    path: source.to_string(),
                });
            }
            segments.push(part.to_string());
        }

        Ok(Self {
            source: source.to_string(),
            variable,
            segments,
        })
    }

    /// Returns the root variable name.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Returns the segments after the root variable.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if the selector is only a variable name.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the selector as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the selector made of the variable and the first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        let segments: Vec<String> = self.segments.iter().take(len).cloned().collect();
        let mut source = self.variable.clone();
        for segment in &segments {
            source.push(':');
            source.push_str(segment);
        }
        Self {
            source,
            variable: self.variable.clone(),
            segments,
        }
    }

    /// Resolves the selector against the value of its root variable.
    ///
    /// Resolution never modifies `root`. A final entity reference is loaded
    /// so that callers always receive entities by value.
    ///
    /// # Errors
    /// Returns a resolution error if a segment does not apply to the value it
    /// reaches, or the loader's error if loading a referenced entity fails.
    pub fn resolve(
        &self,
        root: &Value,
        loader: &dyn EntityLoader,
        config: &EngineConfig,
    ) -> Result<Value> {
        let mut current = root.clone();
        let mut index = 0;

        while index < self.segments.len() {
            let segment = self.segments[index].as_str();
            current = match current {
                Value::List(items) => match segment.parse::<usize>() {
                    Ok(position) => {
                        index += 1;
                        self.list_item(&items, position)?
                    }
                    // Implicit first item; the segment applies to it next.
                    Err(_) => self.list_item(&items, 0)?,
                },
                Value::Entity(entity) => {
                    index += 1;
                    if let Some(items) = entity.field(segment) {
                        items.clone()
                    } else {
                        match segment {
                            "id" => entity.id().map_or(Value::Nil, |id| Value::Int(id_as_int(id))),
                            "bundle" => Value::string(entity.bundle()),
                            "entity_type" => Value::string(entity.entity_type()),
                            _ => return Err(self.unknown(segment).into()),
                        }
                    }
                }
                Value::Map(props) => {
                    if let Some(value) = props.get(segment) {
                        index += 1;
                        value.clone()
                    } else {
                        let main = main_property_name(&props)
                            .and_then(|name| props.get(name))
                            .and_then(Value::as_timestamp);
                        match main {
                            Some(timestamp) if self.is_qualifier(segment, config) => {
                                return self.qualify(timestamp, index, config);
                            }
                            _ => return Err(self.unknown(segment).into()),
                        }
                    }
                }
                Value::EntityRef(reference) => load_reference(&reference, loader)?,
                Value::Timestamp(timestamp) | Value::Int(timestamp)
                    if self.is_qualifier(segment, config) =>
                {
                    return self.qualify(timestamp, index, config);
                }
                other => {
                    return Err(ResolutionError::TypeMismatch {
                        segment: segment.to_string(),
                        path: self.source.clone(),
                        expected: "list, entity or field item".to_string(),
                        actual: other.value_type(),
                    }
                    .into());
                }
            };
        }

        match current {
            Value::EntityRef(reference) => load_reference(&reference, loader),
            resolved => Ok(resolved),
        }
    }

    /// Writes `value` at the selector's path inside `root`.
    ///
    /// Assigning a non-list value to a field item list replaces the main
    /// property of item 0 (creating the item if the list is empty). Writing
    /// through an entity reference or a base property fails.
    ///
    /// # Errors
    /// Returns a resolution error if the path does not exist or cannot be
    /// written.
    pub fn assign(
        &self,
        root: &mut Value,
        value: Value,
    ) -> std::result::Result<(), ResolutionError> {
        self.assign_at(root, &self.segments, value)
    }

    fn assign_at(
        &self,
        current: &mut Value,
        segments: &[String],
        value: Value,
    ) -> std::result::Result<(), ResolutionError> {
        let Some((segment, rest)) = segments.split_first() else {
            store(current, value);
            return Ok(());
        };

        match current {
            Value::List(items) => {
                let length = items.len();
                match segment.parse::<usize>() {
                    Ok(position) => {
                        let item = items.get_mut(position).ok_or_else(|| {
                            ResolutionError::IndexOutOfBounds {
                                index: position,
                                length,
                                path: self.source.clone(),
                            }
                        })?;
                        self.assign_at(item, rest, value)
                    }
                    Err(_) => {
                        let item = items.get_mut(0).ok_or_else(|| {
                            ResolutionError::IndexOutOfBounds {
                                index: 0,
                                length,
                                path: self.source.clone(),
                            }
                        })?;
                        self.assign_at(item, segments, value)
                    }
                }
            }
            Value::Entity(entity) => {
                let entity = Arc::make_mut(entity);
                if let Some(items) = entity.field_mut(segment) {
                    self.assign_at(items, rest, value)
                } else if BASE_PROPERTIES.contains(&segment.as_str()) {
                    Err(self.not_writable())
                } else {
                    Err(self.unknown(segment))
                }
            }
            Value::Map(props) => {
                if let Some(property) = props.get_mut(segment.as_str()) {
                    self.assign_at(property, rest, value)?;
                    if rest.is_empty() && segment == ENTITY_PROPERTY {
                        sync_target_id(props);
                    }
                    Ok(())
                } else if rest.is_empty() {
                    props.insert_mut(Arc::from(segment.as_str()), value);
                    Ok(())
                } else {
                    Err(self.unknown(segment))
                }
            }
            Value::EntityRef(_) => Err(self.not_writable()),
            other => Err(ResolutionError::TypeMismatch {
                segment: segment.clone(),
                path: self.source.clone(),
                expected: "list, entity or field item".to_string(),
                actual: other.value_type(),
            }),
        }
    }

    fn list_item(&self, items: &LtVec<Value>, position: usize) -> Result<Value> {
        items.get(position).cloned().ok_or_else(|| {
            ResolutionError::IndexOutOfBounds {
                index: position,
                length: items.len(),
                path: self.source.clone(),
            }
            .into()
        })
    }

    fn is_qualifier(&self, segment: &str, config: &EngineConfig) -> bool {
        segment == CUSTOM_QUALIFIER
            || segment == RAW_QUALIFIER
            || config.date_format(segment).is_some()
    }

    /// Formats a timestamp using the qualifier at `index` and the segments after it.
    fn qualify(&self, timestamp: i64, index: usize, config: &EngineConfig) -> Result<Value> {
        let qualifier = self.segments[index].as_str();
        let rest = &self.segments[index + 1..];

        let pattern = match (qualifier, rest.first()) {
            (CUSTOM_QUALIFIER, None) => return Err(self.unknown(qualifier).into()),
            (CUSTOM_QUALIFIER, Some(_)) => rest.join(":"),
            (_, Some(extra)) => return Err(self.unknown(extra).into()),
            (RAW_QUALIFIER, None) => return Ok(Value::Timestamp(timestamp)),
            (named, None) => match config.date_format(named) {
                Some(pattern) => pattern.to_string(),
                None => return Err(self.unknown(named).into()),
            },
        };

        format_timestamp(timestamp, &pattern, config.timezone())
            .map(Value::from)
            .ok_or_else(|| {
                ResolutionError::TypeMismatch {
                    segment: qualifier.to_string(),
                    path: self.source.clone(),
                    expected: "timestamp within the supported date range".to_string(),
                    actual: Value::Timestamp(timestamp).value_type(),
                }
                .into()
            })
    }

    fn unknown(&self, segment: &str) -> ResolutionError {
        ResolutionError::UnknownProperty {
            property: segment.to_string(),
            path: self.source.clone(),
        }
    }

    fn not_writable(&self) -> ResolutionError {
        ResolutionError::NotWritable {
            path: self.source.clone(),
        }
    }
}

/// Stores `value` in place of `current`, keeping field item structure intact.
fn store(current: &mut Value, value: Value) {
    match (current, value) {
        (Value::List(items), value @ (Value::Entity(_) | Value::EntityRef(_))) => {
            *items = LtVec::new();
            items.push_back_mut(reference_item(value));
        }
        (current @ Value::List(_), value @ (Value::List(_) | Value::Nil)) => *current = value,
        (Value::List(items), value) => match items.get_mut(0) {
            Some(item) => store(item, value),
            None => items.push_back_mut(match value {
                Value::Map(_) => value,
                scalar => Value::item(scalar),
            }),
        },
        (current @ Value::Map(_), value @ (Value::Entity(_) | Value::EntityRef(_))) => {
            *current = reference_item(value);
        }
        (current @ Value::Map(_), value @ Value::Map(_)) => *current = value,
        (Value::Map(props), scalar) => {
            let name = main_property_name(props).unwrap_or(VALUE_PROPERTY);
            props.insert_mut(Arc::from(name), scalar);
        }
        (current, value) => *current = value,
    }
}

/// Points a reference item's `target_id` at its entity once that has an id.
fn sync_target_id(props: &mut LtMap<Arc<str>, Value>) {
    let id = match props.get(ENTITY_PROPERTY) {
        Some(Value::Entity(entity)) => entity.id(),
        Some(Value::EntityRef(reference)) => Some(reference.id),
        _ => None,
    };
    if let Some(id) = id {
        props.insert_mut(Arc::from(TARGET_ID_PROPERTY), Value::Int(id_as_int(id)));
    }
}

fn load_reference(reference: &EntityRef, loader: &dyn EntityLoader) -> Result<Value> {
    loader
        .load(&reference.entity_type, reference.id)?
        .map(Value::entity)
        .ok_or_else(|| Error::entity_not_found(&*reference.entity_type, reference.id))
}

fn main_property_name(props: &LtMap<Arc<str>, Value>) -> Option<&'static str> {
    [VALUE_PROPERTY, TARGET_ID_PROPERTY]
        .into_iter()
        .find(|name| props.contains_key(*name))
}

/// Builds a reference field item pointing at an entity or entity reference.
fn reference_item(target: Value) -> Value {
    let target_id = match &target {
        Value::Entity(entity) => entity.id().map_or(Value::Nil, |id| Value::Int(id_as_int(id))),
        Value::EntityRef(reference) => Value::Int(id_as_int(reference.id)),
        _ => Value::Nil,
    };
    Value::map([(TARGET_ID_PROPERTY, target_id), (ENTITY_PROPERTY, target)])
}

impl FromStr for DataSelector {
    type Err = ResolutionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for DataSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataSelector({})", self.source)
    }
}

impl fmt::Display for DataSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
