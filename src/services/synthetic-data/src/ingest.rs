//! Upload ingestion: file-type dispatch, CSV decoding, Excel worksheets and
//! JSON records.
//!
//! CSV bytes are decoded with each of [`CSV_ENCODINGS`] in turn. The first
//! decoding whose header yields more than one column is used; otherwise the
//! last decoding that yielded any column at all. A decoding with no columns
//! is never chosen.
//!
//! Excel workbooks (`.xlsx`, `.xls`) contribute their first worksheet, with
//! the first row as the header.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{Result, SyntheticDataError};
use crate::patterns;
use crate::types::{FieldValue, PatternSummary, Record, SampleTable};

/// Cell tokens read as missing, mirroring common dataframe loaders
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
    Excel,
}

impl SourceFormat {
    /// Dispatches on the lower-cased file extension
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("json") => Ok(SourceFormat::Json),
            Some("xlsx") | Some("xls") => Ok(SourceFormat::Excel),
            Some(other) => Err(SyntheticDataError::UnsupportedFileType(format!(
                ".{} files are not supported; upload CSV, Excel or JSON",
                other
            ))),
            None => Err(SyntheticDataError::UnsupportedFileType(format!(
                "'{}' has no file extension",
                file_name
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

/// Encodings tried for CSV uploads, in order
pub const CSV_ENCODINGS: &[TextEncoding] = &[
    TextEncoding::Utf8,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

/// cp1252 code points for 0x80..=0x9F; `None` marks undefined bytes
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        }
    }

    /// Decodes `bytes`, or `None` if they are not valid in this encoding
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                std::str::from_utf8(bytes).ok().map(str::to_string)
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => WINDOWS_1252_HIGH[(b - 0x80) as usize],
                    _ => Some(b as char),
                })
                .collect(),
        }
    }
}

/// Parses an upload into a sample table according to its file name
pub fn read_table(file_name: &str, bytes: &[u8]) -> Result<SampleTable> {
    match SourceFormat::from_file_name(file_name)? {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Json => read_json(bytes),
        SourceFormat::Excel => read_excel(bytes),
    }
}

/// Dispatch, decode and summarize an uploaded sample
pub fn analyze_upload(file_name: &str, bytes: &[u8]) -> Result<PatternSummary> {
    info!("Analyzing upload '{}' ({} bytes)", file_name, bytes.len());
    let table = read_table(file_name, bytes)?;
    patterns::extract(&table)
}

pub fn analyze_path(path: &Path) -> Result<PatternSummary> {
    let bytes = std::fs::read(path)?;
    analyze_upload(&path.to_string_lossy(), &bytes)
}

pub fn read_csv(bytes: &[u8]) -> Result<SampleTable> {
    let mut fallback: Option<SampleTable> = None;

    for encoding in CSV_ENCODINGS {
        let Some(text) = encoding.decode(bytes) else {
            debug!("Upload is not valid {}", encoding.as_str());
            continue;
        };

        match parse_csv_text(&text) {
            Ok(table) if table.columns.len() > 1 => {
                debug!(
                    "Decoded CSV as {} with {} columns",
                    encoding.as_str(),
                    table.columns.len()
                );
                return Ok(table);
            }
            Ok(table) if !table.columns.is_empty() => {
                warn!(
                    "Decoding as {} gave a single column, trying the next encoding",
                    encoding.as_str()
                );
                fallback = Some(table);
            }
            Ok(_) => debug!("Decoding as {} gave no columns", encoding.as_str()),
            Err(e) => warn!("Failed to parse CSV as {}: {}", encoding.as_str(), e),
        }
    }

    fallback.ok_or(SyntheticDataError::EmptyDataset)
}

fn parse_csv_text(text: &str) -> Result<SampleTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = unique_column_names(reader.headers()?.iter());
    if columns.is_empty() {
        return Ok(SampleTable::default());
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(row) => raw_rows.push(row.iter().map(str::to_string).collect()),
            Err(e) => warn!("Skipping malformed CSV record: {}", e),
        }
    }

    let column_types: Vec<CellType> = (0..columns.len())
        .map(|index| {
            infer_cell_type(
                raw_rows
                    .iter()
                    .filter_map(|row| row.get(index).map(String::as_str))
                    .filter(|cell| !is_missing_token(cell)),
            )
        })
        .collect();

    let rows = raw_rows
        .iter()
        .map(|raw| {
            let mut record = Record::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let cell = raw.get(index).map(String::as_str).unwrap_or("");
                record.insert(column.clone(), convert_cell(cell, column_types[index]));
            }
            record
        })
        .collect();

    Ok(SampleTable::new(columns, rows))
}

/// Blank headers become `Unnamed: <index>`; repeats get a `.<n>` suffix
fn unique_column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for (index, header) in headers.enumerate() {
        let base = match header.trim() {
            "" => format!("Unnamed: {}", index),
            trimmed => trimmed.to_string(),
        };
        let repeats = seen.entry(base.clone()).or_insert(0);
        let name = if *repeats == 0 {
            base
        } else {
            format!("{}.{}", base, repeats)
        };
        *repeats += 1;
        columns.push(name);
    }

    columns
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Integer,
    Float,
    Boolean,
    Text,
}

fn is_missing_token(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// `inf` and `NaN` spellings parse as `f64` but carry no usable range
fn parse_finite(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn infer_cell_type<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> CellType {
    if cells.clone().all(|c| c.trim().parse::<i64>().is_ok()) {
        CellType::Integer
    } else if cells.clone().all(|c| parse_finite(c).is_some()) {
        CellType::Float
    } else if cells.clone().all(|c| parse_bool(c).is_some()) {
        CellType::Boolean
    } else {
        CellType::Text
    }
}

fn convert_cell(cell: &str, cell_type: CellType) -> FieldValue {
    if is_missing_token(cell) {
        return FieldValue::Null;
    }
    let trimmed = cell.trim();
    match cell_type {
        CellType::Integer => trimmed
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::text(cell)),
        CellType::Float => parse_finite(trimmed)
            .map(FieldValue::Float)
            .unwrap_or_else(|| FieldValue::text(cell)),
        CellType::Boolean => parse_bool(trimmed)
            .map(FieldValue::Bool)
            .unwrap_or_else(|| FieldValue::text(cell)),
        CellType::Text => FieldValue::text(cell),
    }
}

/// First worksheet of an `.xlsx` or `.xls` workbook; row one is the header
pub fn read_excel(bytes: &[u8]) -> Result<SampleTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SyntheticDataError::EmptyDataset)??;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Err(SyntheticDataError::EmptyDataset);
    };
    let header_cells: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();
    let columns = unique_column_names(header_cells.iter().map(String::as_str));

    let rows: Vec<Record> = sheet_rows
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| {
            let mut record = Record::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let value = cells.get(index).map(excel_to_field).unwrap_or(FieldValue::Null);
                record.insert(column.clone(), value);
            }
            record
        })
        .collect();

    debug!(
        "Read worksheet '{}' with {} columns and {} rows",
        sheet_name,
        columns.len(),
        rows.len()
    );
    Ok(SampleTable::new(columns, rows))
}

/// Largest magnitude below which whole floats are stored as integers
const EXCEL_INTEGER_LIMIT: f64 = 9.0e15;

fn excel_to_field(cell: &Data) -> FieldValue {
    match cell {
        Data::Int(v) => FieldValue::Integer(*v),
        // spreadsheets store every number as a float
        Data::Float(v) if v.fract() == 0.0 && v.abs() < EXCEL_INTEGER_LIMIT => {
            FieldValue::Integer(*v as i64)
        }
        Data::Float(v) if v.is_finite() => FieldValue::Float(*v),
        Data::Float(_) => FieldValue::Null,
        Data::Bool(v) => FieldValue::Bool(*v),
        Data::String(s) if is_missing_token(s) => FieldValue::Null,
        Data::String(s) => FieldValue::text(s.as_str()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == chrono::NaiveTime::MIN => value.date().into(),
            Some(value) => value.into(),
            None => FieldValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::text(s.as_str()),
        Data::Error(_) | Data::Empty => FieldValue::Null,
    }
}

/// A JSON array of flat objects; keys keep first-seen order
pub fn read_json(bytes: &[u8]) -> Result<SampleTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let items = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items,
        _ => {
            return Err(SyntheticDataError::Json(
                "expected a JSON array of objects".to_string(),
            ))
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(object) = item else {
            return Err(SyntheticDataError::Json(format!(
                "element {} is not an object",
                index
            )));
        };
        let mut record = Record::with_capacity(object.len());
        for (key, value) in object {
            record.insert(key, json_to_field(value));
        }
        rows.push(record);
    }

    let table = SampleTable::from_records(rows);
    if table.columns.is_empty() {
        return Err(SyntheticDataError::EmptyDataset);
    }
    Ok(table)
}

fn json_to_field(value: Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => n
                .as_f64()
                .map(FieldValue::Float)
                .unwrap_or_else(|| FieldValue::Text(n.to_string())),
        },
        Value::String(s) => FieldValue::Text(s),
        nested => FieldValue::Text(nested.to_string()),
    }
}
