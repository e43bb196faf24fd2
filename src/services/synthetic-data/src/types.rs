//! Core data model shared by the interpreter, extractor and generators.

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Record count used when the request text carries no number
pub const DEFAULT_RECORD_COUNT: usize = 100;

/// Maximum number of distinct categorical values kept per column
pub const MAX_CATEGORICAL_VALUES: usize = 10;

/// Leading sample rows carried in a pattern summary
pub const SAMPLE_ROW_COUNT: usize = 3;

// ============================================================================
// Values and records
// ============================================================================

/// A single scalar cell of a generated or sampled record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Integer and float cells are numeric; everything else is categorical
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Key used to group equal values; distinguishes `1` from `"1"`
    pub(crate) fn grouping_key(&self) -> String {
        format!("{:?}", self)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            FieldValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

/// One row: an ordered mapping of field name to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Sets a field, keeping its original position if it already exists
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style variant of [`Record::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A parsed tabular sample with its column order preserved
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl SampleTable {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// Derives the column list from the records in first-seen order
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.field_names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Self { columns, rows }
    }
}

// ============================================================================
// Requests and plans
// ============================================================================

/// Built-in dataset archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Customer,
    Equipment,
    Sales,
    Employee,
    Financial,
    Product,
    TimeSeries,
    Custom,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Customer => "customer",
            Category::Equipment => "equipment",
            Category::Sales => "sales",
            Category::Employee => "employee",
            Category::Financial => "financial",
            Category::Product => "product",
            Category::TimeSeries => "time_series",
            Category::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound request as the serving boundary receives it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub raw_text: String,
    pub requested_count: Option<u32>,
}

impl GenerationRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            requested_count: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.requested_count = Some(count);
        self
    }

    /// Folds an explicit count into the text, which is where the count is read from
    pub fn effective_text(&self) -> String {
        match self.requested_count {
            Some(count) => format!("{} with {} records", self.raw_text, count),
            None => self.raw_text.clone(),
        }
    }
}

/// Resolved category and count derived from free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub category: Category,
    pub record_count: usize,
    pub source_text: String,
}

// ============================================================================
// Pattern summaries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// A distinct categorical value and how often the sample contained it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: FieldValue,
    pub count: usize,
}

/// Per-column statistical digest learned from an uploaded sample
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternSummary {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub column_kind: BTreeMap<String, ColumnKind>,
    /// Top values per categorical column, most frequent first
    pub categorical_values: BTreeMap<String, Vec<FieldValue>>,
    /// The same values paired with their observed counts
    pub categorical_counts: BTreeMap<String, Vec<ValueCount>>,
    pub numeric_range: BTreeMap<String, NumericRange>,
    /// First [`SAMPLE_ROW_COUNT`] rows of the sample, as read
    pub sample_rows: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PatternSummary {
    /// A summary standing in for a failed analysis
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.column_kind.get(column).copied()
    }
}

// ============================================================================
// Custom schemas
// ============================================================================

/// Declared type of a custom-schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Email,
    Integer,
    Float,
    Date,
    Boolean,
    /// Unrecognized token, generated like a string
    Other(String),
}

impl FieldType {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "string" | "text" | "name" => FieldType::String,
            "email" => FieldType::Email,
            "int" | "integer" | "number" => FieldType::Integer,
            "float" | "decimal" => FieldType::Float,
            "date" => FieldType::Date,
            "bool" | "boolean" => FieldType::Boolean,
            _ => FieldType::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Other(token) => token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub declared_type: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, declared_type: &str) -> Self {
        Self {
            name: name.into(),
            declared_type: FieldType::parse(declared_type),
        }
    }
}
