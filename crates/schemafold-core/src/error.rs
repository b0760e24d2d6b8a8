//! Schema error taxonomy
//!
//! IMPORTANT: error codes are stable identifiers.
//! NEVER rename or remove codes - callers match on them.

/// A violated structural precondition of a migration operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// createTable on a table name that already exists
    #[error("table '{table}' already exists")]
    DuplicateTable { table: String },

    /// Any table-scoped operation on a table that does not exist
    #[error("table '{table}' does not exist")]
    UnknownTable { table: String },

    /// addColumn on a column that already exists
    #[error("column '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// dropColumn / alterColumn on a missing column
    #[error("column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// createIndex with a name already used on the table
    #[error("index '{index}' already exists on table '{table}'")]
    DuplicateIndex { table: String, index: String },

    /// dropIndex naming an index absent from a table that has indexes
    #[error("index '{index}' does not exist on table '{table}'")]
    UnknownIndex { table: String, index: String },

    /// createTable / createIndex with an index that lists no columns
    #[error("index '{index}' on table '{table}' has no columns")]
    EmptyIndex { table: String, index: String },

    /// Operation tag outside the closed set (only reachable when decoding migration files)
    #[error("unrecognized operation type '{kind}'")]
    UnrecognizedOperation { kind: String },
}

impl SchemaError {
    /// Stable string identifier for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateTable { .. } => "DUPLICATE_TABLE",
            Self::UnknownTable { .. } => "UNKNOWN_TABLE",
            Self::DuplicateColumn { .. } => "DUPLICATE_COLUMN",
            Self::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Self::DuplicateIndex { .. } => "DUPLICATE_INDEX",
            Self::UnknownIndex { .. } => "UNKNOWN_INDEX",
            Self::EmptyIndex { .. } => "EMPTY_INDEX",
            Self::UnrecognizedOperation { .. } => "UNRECOGNIZED_OPERATION",
        }
    }
}

/// Failure to decode a persisted migration
#[derive(Debug, thiserror::Error)]
pub enum MigrationFormatError {
    #[error("invalid migration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Operation(#[from] SchemaError),
}
