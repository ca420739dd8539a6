//! Error taxonomy for metadata operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A write was attempted under a protected prefix.
    #[error("write access denied for protected path: {0}")]
    AccessDenied(String),

    /// Backup, save or load of the persisted file failed.
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: storage::StorageError,
    },

    #[error("unknown metadata field: {0}")]
    UnknownField(String),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    #[error("backup not found: {0}")]
    BackupNotFound(String),

    #[error("network path unavailable: {0}")]
    NetworkUnavailable(String),
}

impl StoreError {
    pub(crate) fn persistence(operation: &'static str, source: storage::StorageError) -> Self {
        StoreError::Persistence { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Why an `execute` call produced no result set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A newer search started before this one finished.
    #[error("search {generation} superseded by a newer request")]
    Superseded { generation: u64 },

    #[error("search {generation} failed: {message}")]
    Failed { generation: u64, message: String },
}
