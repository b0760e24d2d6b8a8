//! Schema processor: folds migrations into a schema state
//!
//! Operations are applied strictly in order. Every stored definition is an
//! owned copy of the operation's definition, so the caller's migrations are
//! never aliased by the state.
//!
//! By default a failing operation stops its migration immediately and the
//! state keeps every operation applied before it (no rollback). An atomic
//! processor instead applies each migration to a scratch copy and only
//! commits on success.

use schemafold_core::{
    ColumnDefinition, IndexDefinition, MigrationOperation, OperationalMigration, OrderedMap,
    SchemaError, SchemaState, TableDefinition,
};
use tracing::{debug, info, warn};

/// A migration stopped at a violated precondition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("migration '{migration}' failed at operation {index} ({kind}): {source}")]
pub struct ProcessError {
    /// Name of the failing migration
    pub migration: String,

    /// Zero-based position of the failing operation
    pub index: usize,

    /// Tag of the failing operation
    pub kind: &'static str,

    #[source]
    pub source: SchemaError,
}

impl ProcessError {
    pub fn schema_error(&self) -> &SchemaError {
        &self.source
    }
}

/// Stateful migration folder; one instance per migration run
#[derive(Debug, Clone, Default)]
pub struct SchemaProcessor {
    state: SchemaState,
    atomic: bool,
}

impl SchemaProcessor {
    /// Start from an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously captured snapshot
    pub fn with_state(state: SchemaState) -> Self {
        Self {
            state,
            atomic: false,
        }
    }

    /// Apply each migration all-or-nothing
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    /// Apply one migration's operations in order
    pub fn apply_migration(&mut self, migration: &OperationalMigration) -> Result<(), ProcessError> {
        if self.atomic {
            let mut scratch = self.state.clone();
            fold_migration(&mut scratch, migration)?;
            self.state = scratch;
        } else {
            fold_migration(&mut self.state, migration)?;
        }

        info!(
            migration = %migration.name,
            operations = migration.operations.len(),
            "applied migration"
        );
        Ok(())
    }

    /// Apply migrations in the given order, stopping at the first failure
    pub fn apply_migrations<'a, I>(&mut self, migrations: I) -> Result<(), ProcessError>
    where
        I: IntoIterator<Item = &'a OperationalMigration>,
    {
        for migration in migrations {
            self.apply_migration(migration)?;
        }
        Ok(())
    }

    /// Apply a single operation outside of any migration
    pub fn apply_operation(&mut self, operation: &MigrationOperation) -> Result<(), SchemaError> {
        apply_operation(&mut self.state, operation)
    }

    /// Independent copy of the current state; mutating it never affects the processor
    pub fn state(&self) -> SchemaState {
        self.state.clone()
    }

    /// Consume the processor, yielding its state
    pub fn into_state(self) -> SchemaState {
        self.state
    }
}

fn fold_migration(state: &mut SchemaState, migration: &OperationalMigration) -> Result<(), ProcessError> {
    for (index, operation) in migration.operations.iter().enumerate() {
        if let Err(source) = apply_operation(state, operation) {
            warn!(
                migration = %migration.name,
                index,
                kind = operation.kind(),
                "migration stopped: {}",
                source
            );
            return Err(ProcessError {
                migration: migration.name.clone(),
                index,
                kind: operation.kind(),
                source,
            });
        }
    }
    Ok(())
}

fn apply_operation(state: &mut SchemaState, operation: &MigrationOperation) -> Result<(), SchemaError> {
    debug!(kind = operation.kind(), table = operation.table(), "applying operation");

    match operation {
        MigrationOperation::CreateTable { table, columns, indexes } => {
            create_table(state, table, columns, indexes)
        }
        MigrationOperation::DropTable { table } => drop_table(state, table),
        MigrationOperation::AddColumn { table, column, definition } => {
            add_column(state, table, column, definition)
        }
        MigrationOperation::DropColumn { table, column } => drop_column(state, table, column),
        MigrationOperation::AlterColumn { table, column, definition } => {
            alter_column(state, table, column, definition)
        }
        MigrationOperation::CreateIndex { table, index } => create_index(state, table, index),
        MigrationOperation::DropIndex { table, index_name } => drop_index(state, table, index_name),
    }
}

fn table_mut<'a>(state: &'a mut SchemaState, table: &str) -> Result<&'a mut TableDefinition, SchemaError> {
    state.tables.get_mut(table).ok_or_else(|| SchemaError::UnknownTable {
        table: table.to_string(),
    })
}

fn create_table(
    state: &mut SchemaState,
    table: &str,
    columns: &OrderedMap<ColumnDefinition>,
    indexes: &[IndexDefinition],
) -> Result<(), SchemaError> {
    if state.tables.contains_key(table) {
        return Err(SchemaError::DuplicateTable {
            table: table.to_string(),
        });
    }
    for index in indexes {
        ensure_index_columns(table, index)?;
    }

    state.tables.insert(
        table,
        TableDefinition {
            name: table.to_string(),
            columns: columns.clone(),
            indexes: indexes.to_vec(),
        },
    );
    Ok(())
}

fn drop_table(state: &mut SchemaState, table: &str) -> Result<(), SchemaError> {
    state
        .tables
        .remove(table)
        .map(|_| ())
        .ok_or_else(|| SchemaError::UnknownTable {
            table: table.to_string(),
        })
}

fn add_column(
    state: &mut SchemaState,
    table: &str,
    column: &str,
    definition: &ColumnDefinition,
) -> Result<(), SchemaError> {
    let target = table_mut(state, table)?;
    if target.columns.contains_key(column) {
        return Err(SchemaError::DuplicateColumn {
            table: table.to_string(),
            column: column.to_string(),
        });
    }

    target.columns.insert(column, definition.clone());
    Ok(())
}

fn drop_column(state: &mut SchemaState, table: &str, column: &str) -> Result<(), SchemaError> {
    let target = table_mut(state, table)?;
    target
        .columns
        .remove(column)
        .map(|_| ())
        .ok_or_else(|| SchemaError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn alter_column(
    state: &mut SchemaState,
    table: &str,
    column: &str,
    definition: &ColumnDefinition,
) -> Result<(), SchemaError> {
    let target = table_mut(state, table)?;
    match target.columns.get_mut(column) {
        Some(existing) => {
            // Wholesale replacement, position unchanged
            *existing = definition.clone();
            Ok(())
        }
        None => Err(SchemaError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }),
    }
}

fn create_index(state: &mut SchemaState, table: &str, index: &IndexDefinition) -> Result<(), SchemaError> {
    let target = table_mut(state, table)?;
    ensure_index_columns(table, index)?;
    if target.index(&index.name).is_some() {
        return Err(SchemaError::DuplicateIndex {
            table: table.to_string(),
            index: index.name.clone(),
        });
    }

    target.indexes.push(index.clone());
    Ok(())
}

/// An index must cover at least one column
fn ensure_index_columns(table: &str, index: &IndexDefinition) -> Result<(), SchemaError> {
    if index.columns.is_empty() {
        return Err(SchemaError::EmptyIndex {
            table: table.to_string(),
            index: index.name.clone(),
        });
    }
    Ok(())
}

fn drop_index(state: &mut SchemaState, table: &str, index_name: &str) -> Result<(), SchemaError> {
    let target = table_mut(state, table)?;

    // Nothing to drop from a table without indexes
    if target.indexes.is_empty() {
        return Ok(());
    }

    match target.indexes.iter().position(|idx| idx.name == index_name) {
        Some(position) => {
            target.indexes.remove(position);
            Ok(())
        }
        None => Err(SchemaError::UnknownIndex {
            table: table.to_string(),
            index: index_name.to_string(),
        }),
    }
}
