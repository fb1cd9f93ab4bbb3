//! Entity schemas and host storage collaborators for Rulecraft.
//!
//! This crate provides:
//! - [`EntityLoader`] / [`EntityStorage`] - The host persistence interface
//! - [`MemoryStorage`] - In-memory storage with per-type sequential ids
//! - [`EntityTypeSchema`] / [`FieldSchema`] - Field validation and defaults

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod memory;
pub mod schema;
pub mod storage;

pub use memory::MemoryStorage;
pub use schema::{Cardinality, EntityTypeSchema, FieldDefault, FieldSchema};
pub use storage::{EntityLoader, EntityStorage, NullLoader};
