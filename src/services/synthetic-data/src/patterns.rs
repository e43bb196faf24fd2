//! Pattern extraction: a sample table to a per-column [`PatternSummary`].

use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{Result, SyntheticDataError};
use crate::types::{
    ColumnKind, FieldValue, NumericRange, PatternSummary, Record, SampleTable, ValueCount,
    MAX_CATEGORICAL_VALUES, SAMPLE_ROW_COUNT,
};

/// Summarizes a sample table column by column.
///
/// Fails with [`SyntheticDataError::EmptyDataset`] when no column can be
/// discovered. Columns with no non-missing values stay in `columns` but are
/// left out of every statistic.
pub fn extract(table: &SampleTable) -> Result<PatternSummary> {
    if table.columns.is_empty() {
        return Err(SyntheticDataError::EmptyDataset);
    }

    let mut summary = PatternSummary {
        columns: table.columns.clone(),
        row_count: table.rows.len(),
        sample_rows: table.rows.iter().take(SAMPLE_ROW_COUNT).cloned().collect(),
        ..PatternSummary::default()
    };

    for column in &table.columns {
        let values: Vec<&FieldValue> = table
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|value| !value.is_missing())
            .collect();

        if values.is_empty() {
            debug!("Column '{}' has no values; leaving it to name heuristics", column);
            continue;
        }

        let range = if values.iter().all(|value| value.is_numeric()) {
            numeric_range(&values)
        } else {
            None
        };

        if let Some(range) = range {
            summary.column_kind.insert(column.clone(), ColumnKind::Numeric);
            summary.numeric_range.insert(column.clone(), range);
        } else {
            summary
                .column_kind
                .insert(column.clone(), ColumnKind::Categorical);
            let counts = top_values(&values, MAX_CATEGORICAL_VALUES);
            summary.categorical_values.insert(
                column.clone(),
                counts.iter().map(|entry| entry.value.clone()).collect(),
            );
            summary.categorical_counts.insert(column.clone(), counts);
        }
    }

    info!(
        "Extracted patterns from {} rows across {} columns ({} typed)",
        summary.row_count,
        summary.columns.len(),
        summary.column_kind.len()
    );

    Ok(summary)
}

/// Convenience over [`extract`] for bare records
pub fn extract_records(records: &[Record]) -> Result<PatternSummary> {
    extract(&SampleTable::from_records(records.to_vec()))
}

/// Range over the finite values; `None` when there are none
fn numeric_range(values: &[&FieldValue]) -> Option<NumericRange> {
    let numbers: Vec<f64> = values
        .iter()
        .filter_map(|value| value.as_f64())
        .filter(|number| number.is_finite())
        .collect();
    if numbers.is_empty() {
        return None;
    }
    if numbers.len() < values.len() {
        debug!("Ignoring {} non-finite values", values.len() - numbers.len());
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let count = numbers.len() as f64;
    let sum: f64 = numbers.iter().sum();
    let mean = if sum.is_finite() {
        sum / count
    } else {
        // sum overflowed; average pre-divided terms instead
        numbers.iter().map(|n| n / count).sum()
    };
    Some(NumericRange { min, max, mean })
}

/// Distinct values by descending frequency, ties in first-seen order
fn top_values(values: &[&FieldValue], limit: usize) -> Vec<ValueCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<(String, &FieldValue)> = Vec::new();

    for &value in values {
        let key = value.grouping_key();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push((key, value));
        }
        *count += 1;
    }

    // stable sort keeps first-seen order among equal counts
    first_seen.sort_by(|(a, _), (b, _)| counts[b].cmp(&counts[a]));
    first_seen
        .into_iter()
        .take(limit)
        .map(|(key, value)| ValueCount {
            value: value.clone(),
            count: counts[&key],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, FieldValue)]) -> Record {
        let mut record = Record::new();
        for (name, value) in pairs {
            record.insert(*name, value.clone());
        }
        record
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let err = extract(&SampleTable::default()).unwrap_err();
        assert!(matches!(err, SyntheticDataError::EmptyDataset));
    }

    #[test]
    fn test_header_only_table_keeps_columns() {
        let table = SampleTable::new(vec!["a".to_string(), "b".to_string()], vec![]);
        let summary = extract(&table).unwrap();
        assert_eq!(summary.columns, vec!["a", "b"]);
        assert_eq!(summary.row_count, 0);
        assert!(summary.column_kind.is_empty());
    }

    #[test]
    fn test_numeric_range() {
        let records = vec![
            row(&[("score", FieldValue::Integer(10))]),
            row(&[("score", FieldValue::Float(20.0))]),
            row(&[("score", FieldValue::Null)]),
            row(&[("score", FieldValue::Integer(15))]),
        ];
        let summary = extract_records(&records).unwrap();
        assert_eq!(summary.kind_of("score"), Some(ColumnKind::Numeric));
        let range = summary.numeric_range["score"];
        assert_eq!(range.min, 10.0);
        assert_eq!(range.max, 20.0);
        assert_eq!(range.mean, 15.0);
    }

    #[test]
    fn test_mixed_column_is_categorical() {
        let records = vec![
            row(&[("code", FieldValue::Integer(1))]),
            row(&[("code", FieldValue::text("A"))]),
        ];
        let summary = extract_records(&records).unwrap();
        assert_eq!(summary.kind_of("code"), Some(ColumnKind::Categorical));
        assert!(!summary.numeric_range.contains_key("code"));
    }

    #[test]
    fn test_categorical_ordering_by_frequency_then_first_seen() {
        let colors = ["red", "blue", "green", "blue", "green", "yellow"];
        let records: Vec<Record> = colors
            .iter()
            .map(|c| row(&[("color", FieldValue::text(*c))]))
            .collect();
        let summary = extract_records(&records).unwrap();
        assert_eq!(
            summary.categorical_values["color"],
            vec![
                FieldValue::text("blue"),
                FieldValue::text("green"),
                FieldValue::text("red"),
                FieldValue::text("yellow"),
            ]
        );
    }

    #[test]
    fn test_categorical_counts_and_sample_rows() {
        let colors = ["red", "blue", "green", "blue", "green", "blue"];
        let records: Vec<Record> = colors
            .iter()
            .map(|c| row(&[("color", FieldValue::text(*c))]))
            .collect();
        let summary = extract_records(&records).unwrap();

        let counts: Vec<(String, usize)> = summary.categorical_counts["color"]
            .iter()
            .map(|entry| (entry.value.to_string(), entry.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("blue".to_string(), 3),
                ("green".to_string(), 2),
                ("red".to_string(), 1),
            ]
        );

        assert_eq!(summary.sample_rows, records[..SAMPLE_ROW_COUNT].to_vec());
    }

    #[test]
    fn test_non_finite_values_are_left_out_of_ranges() {
        let records = vec![
            row(&[("score", FieldValue::Float(1.5)), ("ratio", FieldValue::Float(f64::NAN))]),
            row(&[("score", FieldValue::Float(f64::INFINITY)), ("ratio", FieldValue::Float(f64::INFINITY))]),
            row(&[("score", FieldValue::Integer(4)), ("ratio", FieldValue::Null)]),
        ];
        let summary = extract_records(&records).unwrap();

        let score = summary.numeric_range["score"];
        assert_eq!((score.min, score.max), (1.5, 4.0));
        assert_eq!(summary.kind_of("ratio"), Some(ColumnKind::Categorical));
        assert!(!summary.numeric_range.contains_key("ratio"));
    }

    #[test]
    fn test_mean_of_huge_values_stays_finite() {
        let records = vec![
            row(&[("v", FieldValue::Float(1e308))]),
            row(&[("v", FieldValue::Float(1e308))]),
        ];
        let range = extract_records(&records).unwrap().numeric_range["v"];
        assert_eq!(range.mean, 1e308);
    }

    #[test]
    fn test_categorical_values_truncated_to_ten() {
        let records: Vec<Record> = (0..25)
            .map(|i| row(&[("tag", FieldValue::Text(format!("t{}", i % 15)))]))
            .collect();
        let summary = extract_records(&records).unwrap();
        let values = &summary.categorical_values["tag"];
        assert_eq!(values.len(), MAX_CATEGORICAL_VALUES);
        // t0..t9 appear twice, so they outrank t10..t14
        assert_eq!(values[0], FieldValue::text("t0"));
        assert_eq!(values[9], FieldValue::text("t9"));
    }

    #[test]
    fn test_all_missing_column_is_omitted_from_kinds() {
        let records = vec![
            row(&[("id", FieldValue::Integer(1)), ("notes", FieldValue::Null)]),
            row(&[("id", FieldValue::Integer(2)), ("notes", FieldValue::Null)]),
        ];
        let summary = extract_records(&records).unwrap();
        assert_eq!(summary.columns, vec!["id", "notes"]);
        assert_eq!(summary.kind_of("notes"), None);
        assert_eq!(summary.kind_of("id"), Some(ColumnKind::Numeric));
    }
}
