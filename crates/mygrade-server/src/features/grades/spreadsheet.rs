//! Grade spreadsheet parsing
//!
//! Only the first worksheet is read. Its first row holds the column names;
//! every later row becomes a record keyed by those names. Blank cells and
//! cells holding spreadsheet errors are left out of the record, and rows
//! with no cells at all are dropped.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use mygrade_common::{grades::value_to_text, sanitize::RawRow};
use serde_json::Value;
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Invalid Excel file.")]
    Unreadable(String),

    #[error("Invalid Excel file.")]
    NoWorksheet,

    #[error("Spreadsheet parser stopped: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Parse a workbook (`.xlsx`, `.xls`, `.ods`) held in memory.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<RawRow>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SpreadsheetError::Unreadable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)?
        .map_err(|e| SpreadsheetError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<Option<String>> = header
        .iter()
        .map(|cell| cell_value(cell).map(|value| value_to_text(&value)))
        .collect();

    let records = rows
        .map(|cells| {
            let mut record = RawRow::new();
            for (column, cell) in columns.iter().zip(cells) {
                if let (Some(column), Some(value)) = (column, cell_value(cell)) {
                    record.insert(column.clone(), value);
                }
            }
            record
        })
        .filter(|record| !record.is_empty())
        .collect();

    Ok(records)
}

/// [`parse_rows`] on the blocking pool
pub async fn read_rows(bytes: Vec<u8>) -> Result<Vec<RawRow>, SpreadsheetError> {
    tokio::task::spawn_blocking(move || parse_rows(&bytes)).await?
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(n) => Some(Value::from(*n)),
        Data::Float(n) => Some(Value::from(*n)),
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(Value::String(text.clone())),
        Data::Bool(flag) => Some(Value::Bool(*flag)),
        other => Some(Value::String(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use serde_json::json;

    fn workbook(rows: &[&[Value]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match value {
                    Value::String(text) => {
                        sheet.write_string(r, c, text).unwrap();
                    },
                    Value::Number(number) => {
                        sheet.write_number(r, c, number.as_f64().unwrap()).unwrap();
                    },
                    Value::Bool(flag) => {
                        sheet.write_boolean(r, c, *flag).unwrap();
                    },
                    _ => {},
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_rows_are_keyed_by_header() {
        let bytes = workbook(&[
            &[json!("idNumber"), json!("firstName"), json!("lastName"), json!("quiz1")],
            &[json!(2022123456), json!("John"), json!("Doe"), json!(85)],
            &[json!("2022000001"), json!("Ana"), json!("Reyes"), Value::Null],
        ]);

        let rows = parse_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["idNumber"].as_f64(), Some(2022123456.0));
        assert_eq!(rows[0]["quiz1"].as_f64(), Some(85.0));
        assert_eq!(rows[1]["idNumber"], json!("2022000001"));
        // blank cells are left out
        assert!(!rows[1].contains_key("quiz1"));
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let bytes = workbook(&[
            &[json!("idNumber"), json!("firstName")],
            &[Value::Null, Value::Null],
            &[json!("1"), json!("A")],
        ]);
        let rows = parse_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_header_only_sheet() {
        let bytes = workbook(&[&[json!("idNumber")]]);
        assert!(parse_rows(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse_rows(b"definitely not a workbook").unwrap_err();
        assert_eq!(err.to_string(), "Invalid Excel file.");
    }

    #[tokio::test]
    async fn test_read_rows_off_the_runtime() {
        let bytes = workbook(&[&[json!("idNumber")], &[json!("7")]]);
        let rows = read_rows(bytes).await.unwrap();
        assert_eq!(rows[0]["idNumber"], json!("7"));
    }
}
