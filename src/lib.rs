//! Rulecraft - Business-rules engine
//!
//! This crate re-exports all layers of the Rulecraft system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: rulecraft_plugins    — Built-in conditions, actions, processors
//! Layer 2: rulecraft_engine     — Selectors, contexts, tokens, expressions, execution
//! Layer 1: rulecraft_storage    — Entity schemas, loading and saving
//! Layer 0: rulecraft_foundation — Core types (Value, Entity, Type, Error)
//! ```

pub use rulecraft_engine as engine;
pub use rulecraft_foundation as foundation;
pub use rulecraft_plugins as plugins;
pub use rulecraft_storage as storage;
