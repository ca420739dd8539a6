//! Walks folder trees off the async runtime and collects file paths to index.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub exclude: Vec<String>,
    pub include_hidden: bool,
    pub follow_links: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            include_hidden: false,
            follow_links: true,
        }
    }
}

impl From<&crate::config::IndexConfig> for ScanOptions {
    fn from(cfg: &crate::config::IndexConfig) -> Self {
        Self {
            exclude: cfg.exclude.clone(),
            include_hidden: cfg.include_hidden,
            follow_links: cfg.follow_links,
        }
    }
}

/// Files under `roots`, in walk order. A root that is itself a file is
/// returned as is. Stops early, keeping what was found, once `cancel` fires.
pub async fn scan(
    roots: &[PathBuf],
    options: &ScanOptions,
    cancel: CancellationToken,
) -> anyhow::Result<Vec<PathBuf>> {
    let (tx, mut rx) = mpsc::channel(100);
    let exclude_set = build_globset(&options.exclude)?;
    let include_hidden = options.include_hidden;
    let follow_links = options.follow_links;
    let roots = roots.to_vec();
    let walker_cancel = cancel.clone();

    let walker_handle = task::spawn_blocking(move || {
        'roots: for root in roots {
            let walker = WalkDir::new(&root)
                .follow_links(follow_links)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || should_descend(e.path(), include_hidden, &exclude_set));
            for entry in walker {
                if walker_cancel.is_cancelled() {
                    break 'roots;
                }
                let entry = match entry {
                    Ok(e) => e,
                    Err(err) => {
                        warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() && !(entry.depth() == 0 && entry.path().is_file()) {
                    continue;
                }
                if is_excluded(entry.path(), &exclude_set) {
                    continue;
                }
                if tx.blocking_send(entry.into_path()).is_err() {
                    // Receiver dropped, stop walking.
                    break 'roots;
                }
            }
        }
    });

    let mut found = Vec::new();
    loop {
        tokio::select! {
            item = rx.recv() => match item {
                Some(path) => found.push(path),
                None => break,
            },
            _ = cancel.cancelled() => {
                debug!(found = found.len(), "scan cancelled");
                break;
            }
        }
    }
    drop(rx);

    walker_handle.await?;
    info!(files = found.len(), cancelled = cancel.is_cancelled(), "scan finished");
    Ok(found)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn should_descend(path: &Path, include_hidden: bool, excludes: &GlobSet) -> bool {
    if is_excluded(path, excludes) {
        return false;
    }
    if !include_hidden && is_hidden(path) {
        return false;
    }
    true
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.') || s.starts_with('~'))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, excludes: &GlobSet) -> bool {
    excludes.is_match(path)
        || path
            .file_name()
            .map(|name| excludes.is_match(Path::new(name)))
            .unwrap_or(false)
}
