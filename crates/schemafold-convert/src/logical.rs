//! Logical schema input
//!
//! This is the host framework's description of its models. Only the
//! attributes the converter reads are modelled; unknown keys are ignored.

use schemafold_core::schema::deserialize_present;
use schemafold_core::{DefaultValue, OrderedMap};
use serde::{Deserialize, Serialize};

/// Model name -> table description, in declaration order
pub type LogicalSchema = OrderedMap<LogicalTable>;

/// One logical model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalTable {
    /// Creation priority; lower first, missing treated as 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(default)]
    pub fields: OrderedMap<FieldDescriptor>,
}

impl LogicalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.insert(name, field);
        self
    }
}

/// Declared type of a field
///
/// Frameworks use a type name (`"string"`, `"number[]"`, ...) or a list of
/// literal values for enum-like fields. Anything else is kept as-is and
/// degrades to TEXT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldType {
    Named(String),
    Literals(Vec<serde_json::Value>),
    Other(serde_json::Value),
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

/// Declared default of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldDefault {
    /// A literal scalar (or null)
    Value(DefaultValue),

    /// Computed by the application at write time (a function in the host
    /// framework); never becomes a SQL default
    Computed(serde_json::Value),
}

/// Foreign key declared on a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    /// Referenced logical model
    pub model: String,

    /// Referenced field
    pub field: String,

    /// Free-form action, e.g. `"cascade"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl FieldReference {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
            on_delete: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }
}

/// One logical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default)]
    pub unique: bool,

    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<FieldDefault>,

    /// Physical column name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<FieldReference>,

    /// Strings that need ordering get VARCHAR instead of TEXT
    #[serde(default)]
    pub sortable: bool,

    /// Numbers that need 64-bit storage get BIGINT instead of INTEGER
    #[serde(default)]
    pub bigint: bool,
}

impl FieldDescriptor {
    pub fn new(field_type: impl Into<FieldType>) -> Self {
        Self {
            field_type: field_type.into(),
            required: None,
            unique: false,
            default_value: None,
            field_name: None,
            references: None,
            sortable: false,
            bigint: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Default produced by application code rather than the database
    pub fn with_computed_default(mut self, marker: serde_json::Value) -> Self {
        self.default_value = Some(FieldDefault::Computed(marker));
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }

    pub fn references(mut self, reference: FieldReference) -> Self {
        self.references = Some(reference);
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn bigint(mut self) -> Self {
        self.bigint = true;
        self
    }

    /// Physical column name: the override if present, else the logical name
    pub fn column_name<'a>(&'a self, logical_name: &'a str) -> &'a str {
        self.field_name.as_deref().unwrap_or(logical_name)
    }
}
