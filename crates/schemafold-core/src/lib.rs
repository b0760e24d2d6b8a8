//! SchemaFold Core
//!
//! Core domain model shared by every pipeline stage: column/index/table
//! definitions, the materialized schema state, the closed migration
//! operation vocabulary and its error taxonomy.
//! Never rename error codes or operation tags - they are persisted in migration files.

pub mod config;
pub mod error;
pub mod migration;
pub mod naming;
pub mod ordered;
pub mod schema;

pub use config::{Config, ConfigError, GeneratorConfig, PathsConfig, ProcessorConfig};
pub use error::{MigrationFormatError, SchemaError};
pub use migration::{MigrationOperation, OperationalMigration};
pub use naming::physical_table_name;
pub use ordered::OrderedMap;
pub use schema::{
    ColumnDefinition, ColumnType, DefaultValue, ForeignKey, IndexDefinition, ReferentialAction,
    SchemaState, TableDefinition, CURRENT_TIMESTAMP,
};
