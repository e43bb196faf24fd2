//! CSV artifacts: writing, naming and previewing generated datasets.

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SyntheticDataError};
use crate::types::Record;

/// Header row and leading data rows of a generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Writes `records` as CSV; the header is the first record's field order
pub fn write_csv_to<W: Write>(records: &[Record], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let Some(first) = records.first() else {
        csv_writer.flush()?;
        return Ok(());
    };

    let header: Vec<&str> = first.field_names().collect();
    csv_writer.write_record(&header)?;

    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|name| record.get(name).map(ToString::to_string).unwrap_or_default())
            .collect();
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv(records: &[Record], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv_to(records, file)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// `synthetic_data_{count}_records_{id}.csv`, unique per request
pub fn artifact_file_name(count: usize, request_id: Uuid) -> String {
    format!("synthetic_data_{}_records_{}.csv", count, request_id.simple())
}

/// Plain `.csv` file names only; nothing that can leave the output directory
pub fn is_safe_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && name.to_ascii_lowercase().ends_with(".csv")
}

/// Validates `name` and resolves it to an existing file inside `dir`
pub fn resolve_artifact(dir: &Path, name: &str) -> Result<PathBuf> {
    if !is_safe_artifact_name(name) {
        return Err(SyntheticDataError::Validation(format!(
            "Invalid file name: {}",
            name
        )));
    }
    let path = dir.join(name);
    if !path.is_file() {
        return Err(SyntheticDataError::NotFound(format!("File not found: {}", name)));
    }
    debug!("Resolved artifact {}", path.display());
    Ok(path)
}

pub fn preview_csv(path: &Path, rows: usize) -> Result<CsvPreview> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let columns = reader.headers()?.iter().map(str::to_string).collect();
    let mut preview_rows = Vec::with_capacity(rows);
    for result in reader.records().take(rows) {
        preview_rows.push(result?.iter().map(str::to_string).collect());
    }

    Ok(CsvPreview {
        columns,
        rows: preview_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Vec<Record> {
        vec![
            Record::new()
                .with("id", 1i64)
                .with("name", "Ada, Countess")
                .with("joined", NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
                .with("score", 9.5)
                .with("active", true),
            Record::new()
                .with("id", 2i64)
                .with("name", "Grace")
                .with("joined", NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
                .with("score", 7.0)
                .with("active", false),
        ]
    }

    #[test]
    fn test_write_csv_to_buffer() {
        let mut buffer = Vec::new();
        write_csv_to(&sample(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "id,name,joined,score,active\n1,\"Ada, Countess\",2024-01-02,9.5,true\n2,Grace,2023-12-31,7,false\n"
        );
    }

    #[test]
    fn test_empty_dataset_writes_nothing() {
        let mut buffer = Vec::new();
        write_csv_to(&[], &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_preview_reads_back_head() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&sample(), &path).unwrap();

        let preview = preview_csv(&path, 1).unwrap();
        assert_eq!(preview.columns, vec!["id", "name", "joined", "score", "active"]);
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0][1], "Ada, Countess");
    }

    #[test]
    fn test_artifact_names_are_unique_and_safe() {
        let a = artifact_file_name(10, Uuid::new_v4());
        let b = artifact_file_name(10, Uuid::new_v4());
        assert_ne!(a, b);
        assert!(a.starts_with("synthetic_data_10_records_"));
        assert!(is_safe_artifact_name(&a));

        for bad in ["", "../etc/passwd.csv", "a/b.csv", "a\\b.csv", ".hidden.csv", "data.txt"] {
            assert!(!is_safe_artifact_name(bad), "{} accepted", bad);
        }
    }

    #[test]
    fn test_resolve_artifact() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("present.csv"), "a\n1\n").unwrap();

        assert!(resolve_artifact(dir.path(), "present.csv").is_ok());
        assert!(matches!(
            resolve_artifact(dir.path(), "missing.csv"),
            Err(SyntheticDataError::NotFound(_))
        ));
        assert!(matches!(
            resolve_artifact(dir.path(), "../present.csv"),
            Err(SyntheticDataError::Validation(_))
        ));
    }
}
