//! Network path handling: normalisation, bounded reachability checks and
//! fallback-root substitution.

use crate::config::NetworkPaths;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Lexically normalises a path string: `\` becomes `/`, repeated separators
/// collapse, `.` and `..` are resolved, the trailing separator is dropped.
/// UNC (`//server/share`) and drive (`P:`) prefixes are kept.
pub fn normalize_path(path: &str, case_insensitive: bool) -> String {
    let unified = path.replace('\\', "/");
    let (lead, rest) = if let Some(rest) = unified.strip_prefix("//") {
        ("//", rest)
    } else if let Some(rest) = unified.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", unified.as_str())
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                let can_pop = parts
                    .last()
                    .map(|p| *p != ".." && !(parts.len() == 1 && p.ends_with(':')))
                    .unwrap_or(false);
                if can_pop {
                    parts.pop();
                } else if lead.is_empty() && parts.iter().all(|p| *p == "..") {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let mut normalized = format!("{}{}", lead, parts.join("/"));
    if normalized.is_empty() {
        normalized.push('.');
    }
    if case_insensitive {
        normalized = normalized.to_lowercase();
    }
    normalized
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootResolution {
    pub path: PathBuf,
    pub network_available: bool,
}

/// Subfolder names mapped to their own subtrees.
pub type FolderTree = BTreeMap<String, FolderTreeNode>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderTreeNode {
    pub children: FolderTree,
}

#[derive(Debug, Clone)]
pub struct PathManager {
    paths: NetworkPaths,
    timeout: Duration,
}

impl PathManager {
    pub fn new(paths: NetworkPaths) -> Self {
        let timeout = Duration::from_millis(paths.connect_timeout_ms.max(1));
        Self { paths, timeout }
    }

    pub fn root(&self) -> &str {
        &self.paths.root
    }

    /// Resolves `path` against the root when relative, then normalises it.
    pub fn normalize(&self, path: &str) -> String {
        let joined = if is_absolute(path) {
            path.to_string()
        } else {
            format!("{}/{}", self.paths.root.trim_end_matches(['/', '\\']), path)
        };
        normalize_path(&joined, false)
    }

    /// Path relative to the root, or the normalised path when outside it.
    pub fn relative_path(&self, path: &str) -> String {
        let root = normalize_path(&self.paths.root, false);
        let full = self.normalize(path);
        match full.strip_prefix(root.as_str()) {
            Some(rest) if rest.is_empty() => ".".to_string(),
            Some(rest) if root.ends_with([':', '/']) || rest.starts_with('/') => {
                rest.trim_start_matches('/').to_string()
            }
            _ => full,
        }
    }

    /// Existence check that gives up after the configured timeout.
    pub async fn verify_path(&self, path: &str) -> bool {
        let target = PathBuf::from(path);
        match tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || target.exists()),
        )
        .await
        {
            Ok(Ok(exists)) => exists,
            Ok(Err(err)) => {
                warn!(path, error = %err, "path check task failed");
                false
            }
            Err(_) => {
                warn!(path, timeout_ms = self.timeout.as_millis() as u64, "path check timed out");
                false
            }
        }
    }

    pub async fn verify_root(&self) -> bool {
        let ok = self.verify_path(&self.paths.root).await;
        if ok {
            info!(root = %self.paths.root, "network access verified");
        } else {
            warn!(root = %self.paths.root, "network root not accessible");
        }
        ok
    }

    /// Reachability of root, projects and templates, in that order.
    pub async fn verify_network_paths(&self) -> Vec<(String, bool)> {
        let mut results = Vec::new();
        for path in [
            &self.paths.root,
            &self.paths.projects,
            &self.paths.templates,
        ] {
            if path.is_empty() {
                continue;
            }
            let ok = self.verify_path(path).await;
            if !ok {
                warn!(path = %path, "network path not accessible");
            }
            results.push((path.clone(), ok));
        }
        results
    }

    /// The network root when reachable, otherwise the fallback root.
    pub async fn resolve_root(&self) -> RootResolution {
        if self.verify_root().await {
            return RootResolution {
                path: PathBuf::from(&self.paths.root),
                network_available: true,
            };
        }
        let fallback = self
            .paths
            .fallback_root
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        warn!(
            root = %self.paths.root,
            fallback = %fallback.display(),
            "network unavailable, using fallback root"
        );
        RootResolution {
            path: fallback,
            network_available: false,
        }
    }

    pub fn subfolders(&self, path: &Path) -> Vec<String> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot list folder");
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Folder hierarchy below `path`; `max_depth` of `None` walks everything.
    pub fn folder_tree(&self, path: &Path, max_depth: Option<usize>) -> FolderTree {
        let mut tree = FolderTree::new();
        if max_depth == Some(0) {
            return tree;
        }
        for name in self.subfolders(path) {
            let children = self.folder_tree(&path.join(&name), max_depth.map(|d| d - 1));
            tree.insert(name, FolderTreeNode { children });
        }
        tree
    }
}

fn is_absolute(path: &str) -> bool {
    let p = path.replace('\\', "/");
    p.starts_with('/') || p.as_bytes().get(1) == Some(&b':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(root: &str) -> PathManager {
        PathManager::new(NetworkPaths {
            root: root.to_string(),
            projects: String::new(),
            templates: String::new(),
            fallback_root: None,
            connect_timeout_ms: 500,
        })
    }

    #[test]
    fn normalizes_windows_and_unc_forms() {
        assert_eq!(normalize_path("P:\\Projects\\\\1234\\", false), "P:/Projects/1234");
        assert_eq!(normalize_path("//server/share/./a/../b", false), "//server/share/b");
        assert_eq!(normalize_path("P:/..", false), "P:");
        assert_eq!(normalize_path("../x", false), "../x");
        assert_eq!(normalize_path("", false), ".");
        assert_eq!(normalize_path("/A/B", true), "/a/b");
    }

    #[test]
    fn relative_paths_are_anchored_at_root() {
        let m = manager("P:/");
        assert_eq!(m.normalize("Projects/1234"), "P:/Projects/1234");
        assert_eq!(m.relative_path("P:/Projects/1234/a.pdf"), "Projects/1234/a.pdf");
        assert_eq!(m.relative_path("C:/elsewhere"), "C:/elsewhere");
    }

    #[test]
    fn folder_tree_respects_depth() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        fs::create_dir_all(temp.path().join("d")).unwrap();
        fs::write(temp.path().join("file.txt"), b"x").unwrap();

        let m = manager(temp.path().to_str().unwrap());
        assert_eq!(m.subfolders(temp.path()), vec!["a", "d"]);
        let shallow = m.folder_tree(temp.path(), Some(1));
        assert!(shallow["a"].children.is_empty());
        let deep = m.folder_tree(temp.path(), None);
        assert!(deep["a"].children["b"].children.contains_key("c"));
    }

    #[tokio::test]
    async fn unreachable_root_falls_back() {
        let temp = tempfile::tempdir().unwrap();
        let mut paths = NetworkPaths {
            root: temp.path().join("missing-share").to_string_lossy().into_owned(),
            ..NetworkPaths::default()
        };
        paths.fallback_root = Some(temp.path().to_string_lossy().into_owned());
        let m = PathManager::new(paths);

        let resolved = m.resolve_root().await;
        assert!(!resolved.network_available);
        assert_eq!(resolved.path, temp.path());
    }

    #[tokio::test]
    async fn reachable_root_is_used() {
        let temp = tempfile::tempdir().unwrap();
        let m = manager(temp.path().to_str().unwrap());
        let resolved = m.resolve_root().await;
        assert!(resolved.network_available);
        assert_eq!(resolved.path, temp.path());
    }
}
