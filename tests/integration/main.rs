//! End-to-end tests: rules components executed against in-memory storage.

#[path = "../support/mod.rs"]
mod support;

mod nodes;
mod persistence;
