//! Configuration module for mapping projects
//!
//! Provides types and parsing for `mappings.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
