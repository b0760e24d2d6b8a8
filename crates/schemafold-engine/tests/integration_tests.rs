//! End-to-end tests for the convert -> process -> generate pipeline
//!
//! ```bash
//! cargo test -p schemafold-engine --test integration_tests
//! ```

use pretty_assertions::assert_eq;
use schemafold_convert::{convert, FieldDescriptor, FieldReference, LogicalSchema, LogicalTable};
use schemafold_core::{
    ColumnDefinition, ColumnType, IndexDefinition, MigrationOperation, OperationalMigration,
    OrderedMap, SchemaError, SchemaState,
};
use schemafold_engine::{generate_schema, load_migrations, write_migration, SchemaProcessor};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Two-table auth schema: `session.userId` references `user.id`
fn auth_schema() -> LogicalSchema {
    let mut schema = LogicalSchema::new();
    // Declared child-first; `order` must still put the user table first
    schema.insert(
        "session",
        LogicalTable::new()
            .with_order(2)
            .with_field(
                "userId",
                FieldDescriptor::new("string")
                    .required(true)
                    .references(FieldReference::new("user", "id").on_delete("cascade")),
            )
            .with_field("expiresAt", FieldDescriptor::new("date").required(true)),
    );
    schema.insert(
        "user",
        LogicalTable::new()
            .with_order(1)
            .with_field("email", FieldDescriptor::new("string").required(true).unique())
            .with_field("emailVerified", FieldDescriptor::new("boolean").with_default(false))
            .with_field("name", FieldDescriptor::new("string").required(false)),
    );
    schema
}

fn build(schema: &LogicalSchema, use_plural: bool) -> String {
    let migration = convert(schema, use_plural);
    let mut processor = SchemaProcessor::new();
    processor.apply_migration(&migration).unwrap();
    generate_schema(&processor.state())
}

fn create_table(name: &str, columns: Vec<(&str, ColumnDefinition)>) -> MigrationOperation {
    MigrationOperation::CreateTable {
        table: name.into(),
        columns: columns.into_iter().collect::<OrderedMap<_>>(),
        indexes: Vec::new(),
    }
}

fn id() -> ColumnDefinition {
    ColumnDefinition::new(ColumnType::Text).primary_key()
}

// =============================================================================
// Pipeline
// =============================================================================

#[test]
fn user_with_unique_email() {
    let mut schema = LogicalSchema::new();
    schema.insert(
        "user",
        LogicalTable::new()
            .with_field("email", FieldDescriptor::new("string").required(true).unique()),
    );

    let sql = build(&schema, false);

    assert_eq!(
        sql,
        [
            "-- SQLite Schema",
            "-- Generated automatically - do not edit manually",
            "",
            "CREATE TABLE IF NOT EXISTS \"user\" (",
            "    \"id\" TEXT PRIMARY KEY NOT NULL,",
            "    \"email\" TEXT NOT NULL UNIQUE",
            ");",
        ]
        .join("\n")
    );
}

#[test]
fn unset_required_from_json_is_not_null() {
    let schema: LogicalSchema = serde_json::from_str(
        r#"{"user":{"fields":{"email":{"type":"string","unique":true}}}}"#,
    )
    .unwrap();

    let sql = build(&schema, false);

    assert!(sql.contains("    \"id\" TEXT PRIMARY KEY NOT NULL,\n    \"email\" TEXT NOT NULL UNIQUE\n);"));
}

#[test]
fn referenced_table_created_first() {
    let sql = build(&auth_schema(), false);

    let user = sql.find("CREATE TABLE IF NOT EXISTS \"user\"").unwrap();
    let session = sql.find("CREATE TABLE IF NOT EXISTS \"session\"").unwrap();
    assert!(user < session);

    assert!(sql.contains(
        "\"userId\" TEXT NOT NULL REFERENCES \"user\"(\"id\") ON DELETE CASCADE"
    ));
    assert!(sql.contains(
        "CREATE INDEX IF NOT EXISTS \"idx_session_userId\" ON \"session\"(\"userId\");"
    ));
}

#[test]
fn plural_names_apply_to_tables_and_references() {
    let sql = build(&auth_schema(), true);

    assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"users\""));
    assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"sessions\""));
    assert!(sql.contains("REFERENCES \"users\"(\"id\")"));
    assert!(sql.contains("\"idx_sessions_userId\" ON \"sessions\""));
    assert!(!sql.contains("\"user\""));
}

#[test]
fn booleans_stored_as_integer() {
    let sql = build(&auth_schema(), false);

    assert!(sql.contains("\"emailVerified\" INTEGER NOT NULL DEFAULT 0"));
    assert!(!sql.contains("BOOLEAN"));
}

#[test]
fn optional_fields_are_nullable() {
    let sql = build(&auth_schema(), false);

    assert!(sql.contains("    \"name\" TEXT\n"));
    assert!(sql.contains("\"expiresAt\" TEXT NOT NULL"));
}

#[test]
fn unique_foreign_key_gets_no_index() {
    let mut schema = LogicalSchema::new();
    schema.insert("user", LogicalTable::new().with_order(1));
    schema.insert(
        "profile",
        LogicalTable::new().with_order(2).with_field(
            "userId",
            FieldDescriptor::new("string")
                .unique()
                .references(FieldReference::new("user", "id")),
        ),
    );

    let migration = convert(&schema, false);
    assert!(migration
        .operations
        .iter()
        .all(|op| op.kind() != "createIndex"));

    let sql = build(&schema, false);
    assert!(sql.contains("\"userId\" TEXT NOT NULL UNIQUE REFERENCES \"user\"(\"id\")"));
    assert!(!sql.contains("CREATE INDEX"));
}

#[test]
fn output_is_deterministic() {
    let schema = auth_schema();
    assert_eq!(build(&schema, true), build(&schema, true));

    let first = convert(&schema, false);
    let second = convert(&schema, false);
    assert_eq!(first, second);
}

#[test]
fn empty_logical_schema() {
    let sql = build(&LogicalSchema::new(), false);
    assert_eq!(
        sql,
        "-- SQLite Schema\n-- Generated automatically - do not edit manually"
    );
}

// =============================================================================
// Processor properties
// =============================================================================

#[test]
fn empty_migration_is_noop() {
    let mut processor = SchemaProcessor::new();
    processor
        .apply_migration(&convert(&auth_schema(), false))
        .unwrap();
    let before = processor.state();

    processor
        .apply_migration(&OperationalMigration::new("0002_empty"))
        .unwrap();

    assert_eq!(processor.state(), before);
}

#[test]
fn duplicate_table_keeps_first_definition() {
    let migration = OperationalMigration::new("0001")
        .with_operation(create_table("user", vec![("id", id())]))
        .with_operation(create_table(
            "user",
            vec![("id", id()), ("email", ColumnDefinition::new(ColumnType::Text))],
        ));

    let mut processor = SchemaProcessor::new();
    let err = processor.apply_migration(&migration).unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.kind, "createTable");
    assert_eq!(
        err.schema_error(),
        &SchemaError::DuplicateTable { table: "user".into() }
    );

    let state = processor.state();
    assert_eq!(state.table_names(), vec!["user"]);
    assert!(state.table("user").unwrap().column("email").is_none());
}

#[test]
fn atomic_mode_discards_partial_migration() {
    let migration = OperationalMigration::new("0001")
        .with_operation(create_table("user", vec![("id", id())]))
        .with_operation(MigrationOperation::DropTable {
            table: "missing".into(),
        });

    let mut processor = SchemaProcessor::new().atomic(true);
    assert!(processor.apply_migration(&migration).is_err());
    assert_eq!(processor.state(), SchemaState::new());
}

#[test]
fn drop_index_on_table_without_indexes() {
    let mut processor = SchemaProcessor::new();
    processor
        .apply_migration(
            &OperationalMigration::new("0001").with_operation(create_table("user", vec![("id", id())])),
        )
        .unwrap();
    let before = processor.state();

    processor
        .apply_migration(&OperationalMigration::new("0002").with_operation(
            MigrationOperation::DropIndex {
                table: "user".into(),
                index_name: "idx_user_email".into(),
            },
        ))
        .unwrap();

    assert_eq!(processor.state(), before);
}

#[test]
fn evolving_schema_across_migrations() {
    let initial = convert(&auth_schema(), false);
    let follow_up = OperationalMigration::new("0002_profile_fields")
        .with_operation(MigrationOperation::AddColumn {
            table: "user".into(),
            column: "image".into(),
            definition: ColumnDefinition::new(ColumnType::Text).nullable(true),
        })
        .with_operation(MigrationOperation::DropColumn {
            table: "user".into(),
            column: "name".into(),
        })
        .with_operation(MigrationOperation::CreateIndex {
            table: "user".into(),
            index: IndexDefinition::new("idx_user_email_name", ["email", "image"]).unique(),
        })
        .with_operation(MigrationOperation::DropIndex {
            table: "session".into(),
            index_name: "idx_session_userId".into(),
        });

    let mut processor = SchemaProcessor::new();
    processor.apply_migrations([&initial, &follow_up]).unwrap();
    let sql = generate_schema(&processor.state());

    assert!(sql.contains("    \"image\" TEXT\n"));
    assert!(!sql.contains("\"name\""));
    assert!(sql.contains(
        "CREATE UNIQUE INDEX IF NOT EXISTS \"idx_user_email_name\" ON \"user\"(\"email\", \"image\");"
    ));
    assert!(!sql.contains("idx_session_userId"));
}

// =============================================================================
// Migration history
// =============================================================================

#[test]
fn history_round_trip_produces_same_schema() {
    let dir = TempDir::new().unwrap();
    let migration = convert(&auth_schema(), true);
    write_migration(dir.path(), &migration).unwrap();

    let loaded = load_migrations(dir.path()).unwrap();
    let mut processor = SchemaProcessor::new();
    processor.apply_migrations(&loaded).unwrap();

    assert_eq!(generate_schema(&processor.state()), build(&auth_schema(), true));
}
