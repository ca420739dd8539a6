//! Storage layer: tabular metadata files and their backups.
//!
//! Holds the CSV table codec, atomic replacement of the persisted file and the
//! timestamped backup rotation. Cell values are plain strings; typing is the
//! caller's concern.

pub mod backup;
pub mod table;
#[cfg(feature = "xlsx")]
pub mod xlsx;

use std::path::PathBuf;
use thiserror::Error;

pub use backup::{BackupEntry, BackupRotation};
pub use table::{read_table, write_table_atomic, Table};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("workbook error on {path}: {message}")]
    Workbook { path: PathBuf, message: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StorageError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
