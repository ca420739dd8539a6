//! Core library: metadata records, the persisted store, search, path safety
//! and folder scanning.

pub mod cache;
pub mod checksum;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;
pub mod pipeline;
pub mod safety;
pub mod scanner;
pub mod schema;
pub mod search;
pub mod store;

pub use error::{SearchError, StoreError};
pub use models::{Field, FilterValue, MetadataRecord, SortOrder};
pub use safety::PathSafetyGate;
pub use search::{SearchEngine, SearchParams};
pub use store::MetadataStore;
