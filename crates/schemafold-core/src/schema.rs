//! Physical schema model: columns, indexes, tables and the folded schema state

use crate::ordered::OrderedMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Default sentinel rendered as a bare SQL keyword rather than a quoted literal
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Physical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Blob,
    /// Logical boolean; stored as INTEGER by the SQLite dialect
    Boolean,
    BigInt,
    /// Variable-length string, optionally bounded by `ColumnDefinition::length`
    Varchar,
}

impl ColumnType {
    /// SQL name of the type as stored in the schema state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Blob => "BLOB",
            Self::Boolean => "BOOLEAN",
            Self::BigInt => "BIGINT",
            Self::Varchar => "VARCHAR",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Foreign key action for ON DELETE / ON UPDATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
}

impl ReferentialAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
        }
    }
}

impl std::fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a referential action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized referential action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for ReferentialAction {
    type Err = ParseActionError;

    /// Case-insensitive: `cascade`, `Set Null` and `NO ACTION` are all accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "SET NULL" => Ok(Self::SetNull),
            "RESTRICT" => Ok(Self::Restrict),
            "NO ACTION" => Ok(Self::NoAction),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// Literal column default
///
/// Variant order matters for untagged deserialization: `null` must be tried
/// before the scalar forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Deserialize a present value into `Some`, even when the value is JSON `null`.
///
/// Combined with `#[serde(default)]` this keeps "key absent" (`None`) apart
/// from "key explicitly null" (`Some(DefaultValue::Null)`).
pub fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Foreign key target of a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// Referenced (physical) table
    pub table: String,

    /// Referenced column
    pub column: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// A single physical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Physical type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Length bound, only meaningful for VARCHAR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    /// Nullability. Unset means NOT NULL unless the column is a primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<DefaultValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ForeignKey>,
}

impl ColumnDefinition {
    /// Create a column of the given type with every modifier unset
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            length: None,
            nullable: None,
            unique: false,
            primary_key: false,
            default_value: None,
            references: None,
        }
    }

    /// Mark as primary key; primary keys are never nullable
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = Some(false);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn references(mut self, foreign_key: ForeignKey) -> Self {
        self.references = Some(foreign_key);
        self
    }
}

/// A named index over one or more columns of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, unique within its table
    pub name: String,

    /// Indexed columns in key order
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
}

impl IndexDefinition {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A materialized table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,

    /// Columns in rendering order
    pub columns: OrderedMap<ColumnDefinition>,

    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: OrderedMap::new(),
            indexes: Vec::new(),
        }
    }

    /// Find a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    /// Find an index by name
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|idx| idx.name == name)
    }
}

/// The folded result of every applied migration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaState {
    /// Tables in creation order
    #[serde(default)]
    pub tables: OrderedMap<TableDefinition>,
}

impl SchemaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
