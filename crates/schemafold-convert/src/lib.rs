//! SchemaFold converter
//!
//! Turns a framework-level logical schema (models with typed fields) into the
//! initial migration: ordered `createTable` operations followed by the
//! foreign-key indexes each table needs.

pub mod converter;
pub mod logical;

pub use converter::{convert, SchemaConverter, INITIAL_MIGRATION_NAME};
pub use logical::{FieldDefault, FieldDescriptor, FieldReference, FieldType, LogicalSchema, LogicalTable};
