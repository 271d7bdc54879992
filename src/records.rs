//! Product records loaded from a spreadsheet sheet.
//!
//! The first row of the sheet's used range is the header; every row after it
//! becomes one [`ProductRecord`] keyed by those column names. The schema is
//! whatever the spreadsheet author chose, so records are an ordered
//! string-keyed map rather than a fixed struct. The catalog only relies on
//! the category column; everything else is passed through to the template.
//!
//! ## Cell normalization
//!
//! | Sheet cell | [`CellValue`] |
//! |------------|---------------|
//! | empty | `Text("")` |
//! | text equal to the missing sentinel (`Nan`) | `Missing` |
//! | other text | `Text` |
//! | integer / float | `Number` |
//! | boolean | `Bool` |
//! | date, time, duration | `Text` in ISO 8601 |
//! | error (`#N/A`, `#DIV/0!`, …) | `Missing` |
//!
//! Empty cells are deliberately *not* missing: a blank "Акция" column should
//! render as nothing, not as `null`.

use calamine::{Data, Reader, open_workbook_auto};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("cannot open spreadsheet {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    #[error("cannot read sheet '{sheet}': {source}")]
    Read {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

/// Options that control how raw cells become [`CellValue`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Cell text that marks a value as missing. `None` disables the check.
    pub missing_sentinel: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            missing_sentinel: Some("Nan".to_string()),
        }
    }
}

/// A single cell, after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Integral numbers that fit in an `i64`, e.g. a price of `390`.
    fn as_integer(&self) -> Option<i64> {
        match *self {
            CellValue::Number(n)
                if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 =>
            {
                Some(n as i64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(i) = self.as_integer() {
            return write!(f, "{i}");
        }
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Missing => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(i) = self.as_integer() {
            return serializer.serialize_i64(i);
        }
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Missing => serializer.serialize_unit(),
        }
    }
}

/// One spreadsheet row: column name → value, in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductRecord {
    fields: Vec<(String, CellValue)>,
}

impl ProductRecord {
    pub fn new(fields: Vec<(String, CellValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Read every product row from `sheet` in the workbook at `path`.
pub fn load_records(
    path: &Path,
    sheet: &str,
    options: &LoadOptions,
) -> Result<Vec<ProductRecord>, DataSourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|source| DataSourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(DataSourceError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|source| DataSourceError::Read {
            sheet: sheet.to_string(),
            source,
        })?;

    let records = records_from_rows(range.rows(), options);
    tracing::debug!(
        path = %path.display(),
        sheet,
        rows = records.len(),
        "loaded product records"
    );
    Ok(records)
}

/// Turn raw sheet rows (header first) into records.
///
/// An empty sheet yields no records. Rows where every cell is empty are
/// skipped.
pub fn records_from_rows<'a, I>(rows: I, options: &LoadOptions) -> Vec<ProductRecord>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let columns = column_names(header);

    rows.filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| {
            let fields = columns
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let value = row
                        .get(idx)
                        .map(|cell| cell_value(cell, options))
                        .unwrap_or_else(|| CellValue::Text(String::new()));
                    (name.clone(), value)
                })
                .collect();
            ProductRecord::new(fields)
        })
        .collect()
}

/// Header cells as unique column names.
///
/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
fn column_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell_value(cell, &LoadOptions { missing_sentinel: None }) {
                CellValue::Text(s) if s.trim().is_empty() => format!("Unnamed: {idx}"),
                other => other.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(cell: &Data, options: &LoadOptions) -> CellValue {
    match cell {
        Data::Empty => CellValue::Text(String::new()),
        Data::String(s) => {
            if options.missing_sentinel.as_deref() == Some(s.as_str()) {
                CellValue::Missing
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                CellValue::Text(ndt.format("%Y-%m-%d").to_string())
            }
            Some(ndt) => CellValue::Text(ndt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn load(rows: &[Vec<Data>]) -> Vec<ProductRecord> {
        records_from_rows(rows.iter().map(Vec::as_slice), &LoadOptions::default())
    }

    #[test]
    fn header_row_names_fields() {
        let records = load(&[
            vec![text("Категория"), text("Название"), text("Цена")],
            vec![text("Белые вина"), text("Ркацители"), Data::Float(499.0)],
        ]);

        assert_eq!(records.len(), 1);
        let names: Vec<_> = records[0].fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["Категория", "Название", "Цена"]);
        assert_eq!(
            records[0].get("Название"),
            Some(&CellValue::Text("Ркацители".into()))
        );
        assert_eq!(records[0].get("Цена"), Some(&CellValue::Number(499.0)));
    }

    #[test]
    fn preserves_row_order() {
        let records = load(&[
            vec![text("Название")],
            vec![text("c")],
            vec![text("a")],
            vec![text("b")],
        ]);
        let names: Vec<_> = records
            .iter()
            .map(|r| r.get("Название").unwrap().to_string())
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn empty_cells_become_empty_text() {
        let records = load(&[
            vec![text("Категория"), text("Акция")],
            vec![text("Напитки"), Data::Empty],
        ]);
        assert_eq!(records[0].get("Акция"), Some(&CellValue::Text(String::new())));
    }

    #[test]
    fn sentinel_text_becomes_missing() {
        let records = load(&[
            vec![text("Категория"), text("Сорт")],
            vec![text("Напитки"), text("Nan")],
        ]);
        assert!(records[0].get("Сорт").unwrap().is_missing());
    }

    #[test]
    fn sentinel_can_be_disabled() {
        let rows = [
            vec![text("Категория"), text("Сорт")],
            vec![text("Напитки"), text("Nan")],
        ];
        let options = LoadOptions {
            missing_sentinel: None,
        };
        let records = records_from_rows(rows.iter().map(Vec::as_slice), &options);
        assert_eq!(records[0].get("Сорт"), Some(&CellValue::Text("Nan".into())));
    }

    #[test]
    fn error_cells_become_missing() {
        let records = load(&[
            vec![text("Цена")],
            vec![Data::Error(calamine::CellErrorType::NA)],
        ]);
        assert!(records[0].get("Цена").unwrap().is_missing());
    }

    #[test]
    fn blank_rows_are_skipped() {
        let records = load(&[
            vec![text("Категория"), text("Название")],
            vec![text("Белые вина"), text("Шардоне")],
            vec![Data::Empty, Data::Empty],
            vec![text("Напитки"), text("Чача")],
        ]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn empty_sheet_has_no_records() {
        assert!(load(&[]).is_empty());
        assert!(load(&[vec![text("Категория")]]).is_empty());
    }

    #[test]
    fn blank_and_duplicate_headers_get_unique_names() {
        let records = load(&[
            vec![text("Цена"), Data::Empty, text("Цена"), text("Цена")],
            vec![Data::Int(1), Data::Int(2), Data::Int(3), Data::Int(4)],
        ]);
        let names: Vec<_> = records[0].fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["Цена", "Unnamed: 1", "Цена.1", "Цена.2"]);
    }

    #[test]
    fn numeric_header_renders_without_fraction() {
        let records = load(&[vec![Data::Float(2020.0)], vec![text("x")]]);
        assert!(records[0].get("2020").is_some());
    }

    #[test]
    fn integral_numbers_serialize_as_integers() {
        let record = ProductRecord::new(vec![
            ("Цена".into(), CellValue::Number(390.0)),
            ("Крепость".into(), CellValue::Number(12.5)),
            ("Сорт".into(), CellValue::Missing),
            ("Акция".into(), CellValue::Bool(true)),
        ]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Цена":390,"Крепость":12.5,"Сорт":null,"Акция":true}"#
        );
    }

    #[test]
    fn serialized_record_keeps_column_order() {
        let record = ProductRecord::new(vec![
            ("б".into(), CellValue::Text("1".into())),
            ("а".into(), CellValue::Text("2".into())),
        ]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"б":"1","а":"2"}"#);
    }

    #[test]
    fn numbers_beyond_i64_are_not_truncated() {
        let two_pow_63 = 9_223_372_036_854_775_808.0;
        let value = CellValue::Number(two_pow_63);
        assert_eq!(value.to_string(), "9223372036854775808");
        assert!(serde_json::to_value(&value).unwrap().is_f64());
        assert_eq!(
            serde_json::to_string(&CellValue::Number(-two_pow_63)).unwrap(),
            i64::MIN.to_string()
        );
    }

    #[test]
    fn display_formats() {
        assert_eq!(CellValue::Number(390.0).to_string(), "390");
        assert_eq!(CellValue::Number(0.75).to_string(), "0.75");
        assert_eq!(CellValue::Missing.to_string(), "");
        assert_eq!(CellValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn missing_file_is_open_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_records(&tmp.path().join("nope.xlsx"), "Лист1", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, DataSourceError::Open { .. }));
    }

    #[test]
    fn non_workbook_is_open_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wine.xlsx");
        std::fs::write(&path, "not a zip archive").unwrap();
        let err = load_records(&path, "Лист1", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataSourceError::Open { .. }));
    }
}
