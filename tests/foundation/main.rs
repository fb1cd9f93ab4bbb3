//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Entity, Type, Error, and persistent collections.

mod entities;
mod errors;
mod values;
