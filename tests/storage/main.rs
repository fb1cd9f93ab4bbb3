//! Integration tests for Layer 1: Storage
//!
//! Tests for entity schemas and the in-memory host storage.

mod memory;
mod schemas;
