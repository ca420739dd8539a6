//! Read-only import of legacy `.xlsx` metadata workbooks.

use crate::table::Table;
use crate::{Result, StorageError};
use calamine::{open_workbook_auto, DataType, Reader};
use chrono::{Duration, NaiveDate};
use std::path::Path;

/// Reads the first worksheet; the first row becomes the header.
pub fn read_workbook(path: &Path) -> Result<Table> {
    let workbook_err = |message: String| StorageError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_err("workbook has no worksheets".to_string()))?
        .map_err(|e| workbook_err(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(|c| cell_text(c).trim().to_string()).collect(),
        None => return Ok(Table::default()),
    };
    let body = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Ok(Table {
        headers,
        rows: body,
    })
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Empty => String::new(),
        DataType::String(s) => s.clone(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::DateTime(serial) => excel_serial_to_text(*serial),
        other => other.to_string(),
    }
}

/// Excel stores timestamps as fractional days since 1899-12-30.
fn excel_serial_to_text(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return serial.to_string();
    };
    let seconds = (serial * 86_400.0).round() as i64;
    (epoch + Duration::seconds(seconds))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
