//! Schema-driven generation: records from an explicit field list or from a
//! learned [`PatternSummary`].

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

use crate::error::{Result, SyntheticDataError};
use crate::fakers;
use crate::types::{ColumnKind, FieldSpec, FieldType, FieldValue, PatternSummary, Record};

/// A user-supplied, ordered list of uniquely named fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSchema {
    fields: Vec<FieldSpec>,
}

impl CustomSchema {
    /// Validates the field list: at least one field, names non-empty and unique
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(SyntheticDataError::InvalidSchema(
                "schema must declare at least one field".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SyntheticDataError::InvalidSchema(
                    "field names must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SyntheticDataError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Parses `{"name": "type", ...}` or `[{"name": .., "type": ..}, ...]`
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SyntheticDataError::InvalidSchema(e.to_string()))
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

impl<'de> Deserialize<'de> for CustomSchema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SchemaVisitor)
    }
}

#[derive(Deserialize)]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
}

struct SchemaVisitor;

impl<'de> Visitor<'de> for SchemaVisitor {
    type Value = CustomSchema;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object mapping field names to type names")
    }

    // entries arrive in document order, duplicates included
    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields = Vec::new();
        while let Some((name, declared_type)) = map.next_entry::<String, String>()? {
            fields.push(FieldSpec::new(name, &declared_type));
        }
        CustomSchema::new(fields).map_err(de::Error::custom)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut fields = Vec::new();
        while let Some(entry) = seq.next_element::<FieldEntry>()? {
            fields.push(FieldSpec::new(entry.name, &entry.field_type));
        }
        CustomSchema::new(fields).map_err(de::Error::custom)
    }
}

/// One record per iteration, fields in schema order.
///
/// Unknown type tokens are generated like strings and never fail.
pub fn generate_from_schema<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    fields: &[FieldSpec],
    count: usize,
) -> Vec<Record> {
    info!(
        "Generating {} records from a {}-field schema",
        count,
        fields.len()
    );

    (0..count)
        .map(|_| {
            let mut record = Record::with_capacity(fields.len());
            for field in fields {
                record.insert(field.name.clone(), value_for_type(rng, now, &field.declared_type));
            }
            record
        })
        .collect()
}

fn value_for_type<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    declared_type: &FieldType,
) -> FieldValue {
    match declared_type {
        FieldType::String | FieldType::Other(_) => fakers::word(rng).into(),
        FieldType::Email => fakers::email(rng).into(),
        FieldType::Integer => FieldValue::Integer(rng.gen_range(1..=1000)),
        FieldType::Float => fakers::uniform_rounded(rng, 0.0, 1000.0, 2).into(),
        FieldType::Date => fakers::any_date(rng, now).into(),
        FieldType::Boolean => rng.gen_bool(0.5).into(),
    }
}

/// Resamples every column of `summary`.
///
/// Categorical values are drawn uniformly over the distinct values, not by
/// observed frequency. Numeric values are uniform in `[min, max]` at two
/// decimals. Columns the summary has no statistics for fall back to guesses
/// from the column name.
pub fn generate_from_patterns<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    summary: &PatternSummary,
    count: usize,
) -> Result<Vec<Record>> {
    if let Some(error) = &summary.error {
        return Err(SyntheticDataError::PatternSummary(error.clone()));
    }

    info!(
        "Generating {} records from patterns over {} columns",
        count,
        summary.columns.len()
    );

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let mut record = Record::with_capacity(summary.columns.len());
        for column in &summary.columns {
            record.insert(column.clone(), value_for_column(rng, now, summary, column));
        }
        records.push(record);
    }

    Ok(records)
}

fn value_for_column<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    summary: &PatternSummary,
    column: &str,
) -> FieldValue {
    match summary.kind_of(column) {
        Some(ColumnKind::Categorical) => match summary.categorical_values.get(column) {
            Some(values) if !values.is_empty() => fakers::choose(rng, values).clone(),
            _ => fakers::word(rng).into(),
        },
        Some(ColumnKind::Numeric) => match summary.numeric_range.get(column) {
            Some(range) => {
                let value = fakers::uniform_rounded(rng, range.min, range.max, 2);
                // rounding may step just outside the observed bounds
                value.clamp(range.min, range.max).into()
            }
            None => fakers::word(rng).into(),
        },
        None => value_from_name(rng, now, column),
    }
}

fn value_from_name<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, column: &str) -> FieldValue {
    let lowered = column.to_lowercase();
    debug!("No statistics for column '{}', guessing from its name", column);

    if lowered.contains("id") {
        FieldValue::Integer(rng.gen_range(1000..=9999))
    } else if lowered.contains("name") {
        fakers::person_name(rng).into()
    } else if lowered.contains("email") {
        fakers::email(rng).into()
    } else if lowered.contains("date") {
        fakers::any_date(rng, now).into()
    } else {
        fakers::word(rng).into()
    }
}
