//! Core values, type tags, entities, and errors for Rulecraft.
//!
//! This crate provides:
//! - [`Value`] - The core value type for all context data
//! - [`Entity`] and [`EntityId`] - Content entities made of field item lists
//! - [`Type`] - Type tags for context definitions
//! - [`Error`] - Rich error types with context
//! - Persistent collections ([`LtVec`], [`LtMap`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collections;
pub mod entity;
pub mod error;
pub mod types;
pub mod value;

pub use collections::{LtMap, LtVec};
pub use entity::{
    ENTITY_PROPERTY, Entity, EntityId, EntityRef, TARGET_ID_PROPERTY, VALUE_PROPERTY, id_as_int,
};
pub use error::{BindError, Error, ErrorContext, ErrorKind, ResolutionError};
pub use types::Type;
pub use value::Value;

/// Result type alias using the Rulecraft [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
