//! Logical schema -> initial migration
//!
//! Conversion is total: unknown logical types fall back to TEXT and
//! unrecognized foreign key actions are dropped, so any structurally valid
//! logical schema produces a migration.

use crate::logical::{FieldDefault, FieldDescriptor, FieldType, LogicalSchema, LogicalTable};
use schemafold_core::{
    physical_table_name, ColumnDefinition, ColumnType, DefaultValue, ForeignKey, IndexDefinition,
    MigrationOperation, OperationalMigration, OrderedMap, ReferentialAction, CURRENT_TIMESTAMP,
};
use tracing::{debug, warn};

/// Name of the single migration produced by a conversion
pub const INITIAL_MIGRATION_NAME: &str = "0001_create_initial_tables";

/// Name of the implicit primary key added to every table
const ID_COLUMN: &str = "id";

/// Converts logical schemas using one table naming convention
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaConverter {
    use_plural: bool,
}

impl SchemaConverter {
    pub fn new(use_plural: bool) -> Self {
        Self { use_plural }
    }

    /// Convert every logical table into `createTable` + foreign key `createIndex` operations.
    ///
    /// Tables are emitted by ascending `order` (missing = 0); equal orders keep
    /// declaration order. Callers assign `order` so referenced tables come first.
    ///
    /// Every table gets a leading `id TEXT PRIMARY KEY`. A field whose column
    /// name is `id` replaces that definition wholesale (keeping the first
    /// position), so it is only a primary key if the caller makes it one.
    pub fn convert(&self, tables: &LogicalSchema) -> OperationalMigration {
        let mut sorted: Vec<(&str, &LogicalTable)> = tables.iter().collect();
        // Stable: ties keep declaration order
        sorted.sort_by_key(|(_, table)| table.order.unwrap_or(0));

        let mut migration = OperationalMigration::new(INITIAL_MIGRATION_NAME);

        for (model, table) in sorted {
            let table_name = physical_table_name(model, self.use_plural);

            let mut columns = OrderedMap::new();
            columns.insert(ID_COLUMN, ColumnDefinition::new(ColumnType::Text).primary_key());

            for (field_name, field) in table.fields.iter() {
                let column = field.column_name(field_name);
                columns.insert(column, self.convert_field(&table_name, column, field));
            }

            debug!(table = %table_name, columns = columns.len(), "converted table");

            migration.operations.push(MigrationOperation::CreateTable {
                table: table_name.clone(),
                columns,
                indexes: Vec::new(),
            });

            // Unique foreign keys are already backed by their UNIQUE constraint
            for (field_name, field) in table.fields.iter() {
                if field.references.is_none() || field.unique {
                    continue;
                }

                let column = field.column_name(field_name);
                let index_name = format!("idx_{}_{}", table_name, column);
                debug!(table = %table_name, index = %index_name, "inferred foreign key index");

                migration.operations.push(MigrationOperation::CreateIndex {
                    table: table_name.clone(),
                    index: IndexDefinition::new(index_name, [column]),
                });
            }
        }

        migration
    }

    fn convert_field(&self, table_name: &str, column_name: &str, field: &FieldDescriptor) -> ColumnDefinition {
        let mut column = ColumnDefinition::new(map_type(field)).nullable(field.required == Some(false));

        if field.unique {
            column.unique = true;
        }

        column.default_value = field.default_value.as_ref().and_then(convert_default);

        if let Some(reference) = &field.references {
            let mut foreign_key = ForeignKey::new(
                physical_table_name(&reference.model, self.use_plural),
                reference.field.clone(),
            );

            if let Some(action) = &reference.on_delete {
                match action.parse::<ReferentialAction>() {
                    Ok(action) => foreign_key.on_delete = Some(action),
                    Err(e) => warn!(
                        table = %table_name,
                        column = %column_name,
                        references = %reference.model,
                        "dropping ON DELETE: {}",
                        e
                    ),
                }
            }

            column.references = Some(foreign_key);
        }

        column
    }
}

/// Convert with a one-off converter
pub fn convert(tables: &LogicalSchema, use_plural: bool) -> OperationalMigration {
    SchemaConverter::new(use_plural).convert(tables)
}

/// Map a logical field type to its physical column type
fn map_type(field: &FieldDescriptor) -> ColumnType {
    match &field.field_type {
        // Arrays are stored as JSON text
        FieldType::Named(name) if name.ends_with("[]") => ColumnType::Text,
        FieldType::Named(name) => match name.as_str() {
            "string" if field.sortable => ColumnType::Varchar,
            "number" if field.bigint => ColumnType::BigInt,
            "number" => ColumnType::Integer,
            "boolean" => ColumnType::Boolean,
            // "string", "date" (ISO strings) and anything unknown
            _ => ColumnType::Text,
        },
        FieldType::Literals(_) | FieldType::Other(_) => ColumnType::Text,
    }
}

/// SQL-level default for a logical default, if it has one
fn convert_default(default: &FieldDefault) -> Option<DefaultValue> {
    match default {
        FieldDefault::Computed(_) => None,
        FieldDefault::Value(DefaultValue::Text(text)) => match text.as_str() {
            "now()" | CURRENT_TIMESTAMP => Some(DefaultValue::from(CURRENT_TIMESTAMP)),
            // Application-generated ids
            "uuid()" | "cuid()" => None,
            _ => Some(DefaultValue::Text(text.clone())),
        },
        FieldDefault::Value(value) => Some(value.clone()),
    }
}
