//! SchemaFold engine
//!
//! This crate implements the two stages downstream of conversion:
//! - Schema processor: folds ordered migrations into a schema state
//! - SQL generator: renders a schema state as SQLite DDL
//! - Migration history: reading and writing migration files

pub mod history;
pub mod processor;
pub mod sql_generator;

pub use history::{load_migrations, write_migration, LoadError};
pub use processor::{ProcessError, SchemaProcessor};
pub use sql_generator::{generate_schema, SqlGenerator};
