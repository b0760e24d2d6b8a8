//! Migration operation vocabulary
//!
//! The operation set is closed: adding a kind means adding a variant here and
//! handling it everywhere operations are matched.

use crate::error::{MigrationFormatError, SchemaError};
use crate::ordered::OrderedMap;
use crate::schema::{ColumnDefinition, IndexDefinition};
use serde::{Deserialize, Serialize};

/// A primitive schema change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MigrationOperation {
    CreateTable {
        table: String,
        columns: OrderedMap<ColumnDefinition>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        indexes: Vec<IndexDefinition>,
    },
    DropTable {
        table: String,
    },
    AddColumn {
        table: String,
        column: String,
        definition: ColumnDefinition,
    },
    DropColumn {
        table: String,
        column: String,
    },
    AlterColumn {
        table: String,
        column: String,
        definition: ColumnDefinition,
    },
    CreateIndex {
        table: String,
        index: IndexDefinition,
    },
    DropIndex {
        table: String,
        #[serde(rename = "indexName")]
        index_name: String,
    },
}

impl MigrationOperation {
    /// Every operation tag, as persisted in the `type` field
    pub const KINDS: [&'static str; 7] = [
        "createTable",
        "dropTable",
        "addColumn",
        "dropColumn",
        "alterColumn",
        "createIndex",
        "dropIndex",
    ];

    /// The persisted tag of this operation
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "createTable",
            Self::DropTable { .. } => "dropTable",
            Self::AddColumn { .. } => "addColumn",
            Self::DropColumn { .. } => "dropColumn",
            Self::AlterColumn { .. } => "alterColumn",
            Self::CreateIndex { .. } => "createIndex",
            Self::DropIndex { .. } => "dropIndex",
        }
    }

    /// The table this operation targets
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { table, .. }
            | Self::DropTable { table }
            | Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::CreateIndex { table, .. }
            | Self::DropIndex { table, .. } => table.as_str(),
        }
    }
}

/// A named, ordered batch of operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalMigration {
    pub name: String,

    #[serde(default)]
    pub operations: Vec<MigrationOperation>,
}

impl OperationalMigration {
    /// Create an empty migration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Append an operation
    pub fn with_operation(mut self, operation: MigrationOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Decode a migration from its JSON file form.
    ///
    /// Operation tags are checked before structural decoding so an unknown tag
    /// surfaces as [`SchemaError::UnrecognizedOperation`] instead of a generic
    /// parse error. Both passes decode from the text so column order is kept.
    pub fn from_json(json: &str) -> Result<Self, MigrationFormatError> {
        let tags: OperationTags = serde_json::from_str(json)?;

        if let Some(kind) = tags
            .operations
            .into_iter()
            .filter_map(|op| op.kind)
            .find(|kind| !Self::is_known_kind(kind))
        {
            return Err(SchemaError::UnrecognizedOperation { kind }.into());
        }

        Ok(serde_json::from_str(json)?)
    }

    /// Encode as pretty-printed JSON for a migration file
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn is_known_kind(kind: &str) -> bool {
        MigrationOperation::KINDS.contains(&kind)
    }
}

/// Just the `type` tags of a migration file
#[derive(Deserialize)]
struct OperationTags {
    #[serde(default)]
    operations: Vec<OperationTag>,
}

#[derive(Deserialize)]
struct OperationTag {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn operation_tags_are_camel_case() {
        let op = MigrationOperation::DropIndex {
            table: "user".into(),
            index_name: "idx_user_email".into(),
        };
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "type": "dropIndex", "table": "user", "indexName": "idx_user_email" })
        );
        assert_eq!(op.kind(), "dropIndex");
        assert_eq!(op.table(), "user");
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let ops = vec![
            MigrationOperation::CreateTable {
                table: "t".into(),
                columns: OrderedMap::new(),
                indexes: Vec::new(),
            },
            MigrationOperation::AddColumn {
                table: "t".into(),
                column: "c".into(),
                definition: ColumnDefinition::new(ColumnType::Text),
            },
            MigrationOperation::CreateIndex {
                table: "t".into(),
                index: IndexDefinition::new("i", ["c"]),
            },
        ];

        for op in ops {
            let json = serde_json::to_value(&op).unwrap();
            assert_eq!(json["type"], op.kind());
            assert!(MigrationOperation::KINDS.contains(&op.kind()));
        }
    }

    #[test]
    fn parses_migration_file() {
        let json = r#"{
            "name": "0002_add_user_image",
            "operations": [
                { "type": "addColumn", "table": "user", "column": "image",
                  "definition": { "type": "TEXT", "nullable": true } }
            ]
        }"#;

        let migration = OperationalMigration::from_json(json).unwrap();
        assert_eq!(migration.name, "0002_add_user_image");
        assert_eq!(migration.operations.len(), 1);
        assert_eq!(migration.operations[0].kind(), "addColumn");
    }

    #[test]
    fn unknown_tag_is_unrecognized_operation() {
        let json = r#"{ "name": "0003", "operations": [ { "type": "renameTable", "table": "user" } ] }"#;

        match OperationalMigration::from_json(json) {
            Err(MigrationFormatError::Operation(SchemaError::UnrecognizedOperation { kind })) => {
                assert_eq!(kind, "renameTable");
            }
            other => panic!("expected UnrecognizedOperation, got {:?}", other),
        }
    }

    #[test]
    fn from_json_keeps_column_order() {
        let json = r#"{
            "name": "0001",
            "operations": [
                { "type": "createTable", "table": "t", "columns": {
                    "id": { "type": "TEXT", "primaryKey": true },
                    "zeta": { "type": "TEXT" },
                    "alpha": { "type": "INTEGER" }
                } }
            ]
        }"#;

        let migration = OperationalMigration::from_json(json).unwrap();
        match &migration.operations[0] {
            MigrationOperation::CreateTable { columns, .. } => {
                assert_eq!(columns.keys().collect::<Vec<_>>(), vec!["id", "zeta", "alpha"]);
            }
            other => panic!("expected createTable, got {}", other.kind()),
        }
    }

    #[test]
    fn malformed_json_is_json_error() {
        let result = OperationalMigration::from_json("{ not json");
        assert!(matches!(result, Err(MigrationFormatError::Json(_))));
    }
}
