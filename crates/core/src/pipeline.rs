//! Indexing pipeline: expand folders through the scanner, then add default
//! records for every file found.

use crate::scanner::{self, ScanOptions};
use crate::store::MetadataStore;
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    pub discovered: usize,
    pub added: usize,
    pub skipped: Vec<(String, String)>,
    pub cancelled: bool,
}

pub async fn index_paths(
    store: &MetadataStore,
    paths: &[PathBuf],
    options: &ScanOptions,
    cancel: CancellationToken,
) -> anyhow::Result<IndexSummary> {
    info!(roots = paths.len(), "Starting scan phase...");
    let files = scanner::scan(paths, options, cancel.clone()).await?;
    let mut summary = IndexSummary {
        discovered: files.len(),
        ..IndexSummary::default()
    };
    if cancel.is_cancelled() {
        summary.cancelled = true;
        info!(discovered = summary.discovered, "Indexing cancelled before adding files.");
        return Ok(summary);
    }

    let store = store.clone();
    let report = tokio::task::spawn_blocking(move || {
        let paths: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        store.add_basic(&paths)
    })
    .await
    .context("add task panicked")?
    .context("adding files to the metadata store")?;

    summary.added = report.added.len();
    summary.skipped = report.skipped;
    info!(
        discovered = summary.discovered,
        added = summary.added,
        skipped = summary.skipped.len(),
        "Indexing complete."
    );
    Ok(summary)
}
