//! SQLite DDL generation from a schema state
//!
//! Output is a pure function of the state: tables and columns render in the
//! state's insertion order, so a fixed migration history always produces the
//! same text.

use schemafold_core::{
    ColumnDefinition, ColumnType, DefaultValue, IndexDefinition, SchemaState, TableDefinition,
    CURRENT_TIMESTAMP,
};

/// Default first header line
pub const DEFAULT_TITLE: &str = "SQLite Schema";

const GENERATED_NOTICE: &str = "-- Generated automatically - do not edit manually";

/// Renders schema states as `CREATE TABLE` / `CREATE INDEX` statements
#[derive(Debug, Clone)]
pub struct SqlGenerator {
    title: String,
}

impl Default for SqlGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGenerator {
    pub fn new() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }

    /// Use a custom first header line (`-- <title>`)
    pub fn with_title(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// Generate the complete DDL for a schema state.
    ///
    /// Layout: two header comment lines and a blank line, every CREATE TABLE
    /// block followed by a blank line, then each table's CREATE INDEX
    /// statements followed by a blank line. The result is trimmed.
    pub fn generate_schema(&self, state: &SchemaState) -> String {
        let mut statements: Vec<String> = vec![
            format!("-- {}", self.title),
            GENERATED_NOTICE.to_string(),
            String::new(),
        ];

        for table in state.tables.values() {
            statements.push(create_table(table));
            statements.push(String::new());
        }

        for (table_name, table) in state.tables.iter() {
            if table.indexes.is_empty() {
                continue;
            }
            for index in &table.indexes {
                statements.push(create_index(table_name, index));
            }
            statements.push(String::new());
        }

        statements.join("\n").trim().to_string()
    }
}

/// Generate DDL with the default header
pub fn generate_schema(state: &SchemaState) -> String {
    SqlGenerator::new().generate_schema(state)
}

fn create_table(table: &TableDefinition) -> String {
    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|(name, column)| format!("    {}", column_definition(name, column)))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n);",
        table.name,
        column_defs.join(",\n")
    )
}

fn column_definition(name: &str, column: &ColumnDefinition) -> String {
    let mut definition = format!("\"{}\" {}", name, physical_type(column));

    if column.primary_key {
        definition.push_str(" PRIMARY KEY");
    }

    if is_not_null(column) {
        definition.push_str(" NOT NULL");
    }

    // Primary keys are unique already
    if column.unique && !column.primary_key {
        definition.push_str(" UNIQUE");
    }

    if let Some(default) = &column.default_value {
        definition.push_str(" DEFAULT ");
        definition.push_str(&default_literal(default));
    }

    if let Some(reference) = &column.references {
        definition.push_str(&format!(
            " REFERENCES \"{}\"(\"{}\")",
            reference.table, reference.column
        ));
        if let Some(action) = reference.on_delete {
            definition.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = reference.on_update {
            definition.push_str(&format!(" ON UPDATE {}", action));
        }
    }

    definition
}

/// SQLite has no boolean type; booleans are stored as INTEGER 0/1
fn physical_type(column: &ColumnDefinition) -> String {
    match (column.column_type, column.length) {
        (ColumnType::Varchar, Some(length)) if length > 0 => format!("VARCHAR({})", length),
        (ColumnType::Boolean, _) => ColumnType::Integer.to_string(),
        (column_type, _) => column_type.to_string(),
    }
}

/// Unset nullability means required, except on primary keys
fn is_not_null(column: &ColumnDefinition) -> bool {
    match column.nullable {
        Some(nullable) => !nullable,
        None => !column.primary_key,
    }
}

/// Embedded single quotes are not escaped; defaults come from trusted schema definitions
fn default_literal(value: &DefaultValue) -> String {
    match value {
        DefaultValue::Text(text) if text == CURRENT_TIMESTAMP => CURRENT_TIMESTAMP.to_string(),
        DefaultValue::Text(text) => format!("'{}'", text),
        DefaultValue::Number(number) => number.to_string(),
        DefaultValue::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
        DefaultValue::Null => "NULL".to_string(),
    }
}

fn create_index(table_name: &str, index: &IndexDefinition) -> String {
    let unique = if index.unique { "UNIQUE " } else { "" };
    let columns = index
        .columns
        .iter()
        .map(|col| format!("\"{}\"", col))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE {}INDEX IF NOT EXISTS \"{}\" ON \"{}\"({});",
        unique, index.name, table_name, columns
    )
}
