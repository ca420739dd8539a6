use crate::{Result, StorageError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A header row plus string cells, as stored on disk.
///
/// Rows may be shorter than the header (missing trailing cells); [`Table::cell`]
/// reads those as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads a CSV file with a header row. Ragged rows are accepted.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| StorageError::csv(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StorageError::csv(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StorageError::csv(path, e))?;
        if record.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Writes `table` to a sibling temp file, fsyncs it and renames it over `path`.
///
/// Readers opening `path` see either the previous file or the complete new one.
pub fn write_table_atomic(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let tmp = temp_path(path);
    if let Err(err) = write_to(&tmp, table) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::io(path, e)
    })?;
    tracing::debug!(path = %path.display(), rows = table.rows.len(), "table written");
    Ok(())
}

fn write_to(path: &Path, table: &Table) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| StorageError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(&table.headers)
        .map_err(|e| StorageError::csv(path, e))?;

    let width = table.headers.len();
    for row in &table.rows {
        // Pad or cut to the header width; the csv writer rejects ragged rows.
        let cells = (0..width).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        writer
            .write_record(cells)
            .map_err(|e| StorageError::csv(path, e))?;
    }

    writer.flush().map_err(|e| StorageError::io(path, e))?;
    let file = writer.into_inner().map_err(|e| {
        StorageError::io(path, io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    file.sync_all().map_err(|e| StorageError::io(path, e))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "table".into());
    name.push(".tmp");
    path.with_file_name(name)
}
