//! Mapping between metadata records and the persisted table layout.

use crate::models::{Field, MetadataRecord};
use storage::Table;
use tracing::warn;

/// Schema columns followed by any extra columns carried over from disk.
pub fn headers(extra_columns: &[String]) -> Vec<String> {
    Field::ALL
        .iter()
        .map(|f| f.name().to_string())
        .chain(extra_columns.iter().cloned())
        .collect()
}

pub fn to_table<'a>(
    records: impl IntoIterator<Item = &'a MetadataRecord>,
    extra_columns: &[String],
) -> Table {
    let mut table = Table::new(headers(extra_columns));
    for record in records {
        let mut row: Vec<String> = Field::ALL
            .iter()
            .map(|f| record.value(*f).into_owned())
            .collect();
        row.extend(
            extra_columns
                .iter()
                .map(|c| record.extra.get(c).cloned().unwrap_or_default()),
        );
        table.rows.push(row);
    }
    table
}

#[derive(Debug, Default)]
pub struct Decoded {
    pub records: Vec<MetadataRecord>,
    pub extra_columns: Vec<String>,
    /// Rows dropped because they had no `file_path`.
    pub skipped: usize,
}

/// Decodes rows permissively: missing cells stay unset and unparsable typed
/// cells are logged and left unset.
pub fn from_table(table: &Table) -> Decoded {
    enum Column {
        Known(Field),
        Extra(String),
        Ignored,
    }

    let mut extra_columns = Vec::new();
    let columns: Vec<Column> = table
        .headers
        .iter()
        .map(|h| {
            if h.is_empty() {
                return Column::Ignored;
            }
            match h.parse::<Field>() {
                Ok(field) => Column::Known(field),
                Err(_) => {
                    if !extra_columns.contains(h) {
                        extra_columns.push(h.clone());
                    }
                    Column::Extra(h.clone())
                }
            }
        })
        .collect();

    let mut decoded = Decoded {
        extra_columns,
        ..Decoded::default()
    };

    for row_idx in 0..table.rows.len() {
        let mut record = MetadataRecord::default();
        for (col_idx, column) in columns.iter().enumerate() {
            let cell = table.cell(row_idx, col_idx);
            match column {
                Column::Known(field) => {
                    if let Err(err) = record.set(*field, cell) {
                        warn!(row = row_idx + 1, error = %err, "unreadable cell left unset");
                    }
                }
                Column::Extra(name) => {
                    if !cell.is_empty() {
                        record.extra.insert(name.clone(), cell.to_string());
                    }
                }
                Column::Ignored => {}
            }
        }
        if record.file_path.trim().is_empty() {
            decoded.skipped += 1;
            continue;
        }
        decoded.records.push(record);
    }

    if decoded.skipped > 0 {
        warn!(skipped = decoded.skipped, "rows without file_path ignored");
    }
    decoded
}
