//! Write-safety gate for protected (read-only) network locations.
//!
//! Protection restricts writes only. Reads are decided by the filesystem.

use crate::config::AppConfig;
use crate::paths::normalize_path;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct PathSafetyGate {
    protected: Vec<String>,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub exists: bool,
    pub readable: bool,
    pub protected: bool,
    pub writable: bool,
}

impl PathSafetyGate {
    pub fn new<I, S>(prefixes: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut protected: Vec<String> = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .map(|p| normalize_path(&p, case_insensitive))
            .collect();
        protected.sort();
        protected.dedup();
        Self {
            protected,
            case_insensitive,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let case_insensitive = cfg.safety.case_insensitive.unwrap_or(cfg!(windows));
        Self::new(cfg.protected_paths(), case_insensitive)
    }

    /// A gate that protects nothing.
    pub fn unrestricted() -> Self {
        Self::new(std::iter::empty::<&str>(), cfg!(windows))
    }

    pub fn protected_paths(&self) -> &[String] {
        &self.protected
    }

    pub fn is_protected(&self, path: &str) -> bool {
        let normalized = normalize_path(path, self.case_insensitive);
        self.protected
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()))
    }

    /// False for protected paths; every refusal is logged as a security event.
    pub fn can_write(&self, path: &str) -> bool {
        if self.is_protected(path) {
            warn!(target: "navigator::security", path, "blocked write to protected path");
            return false;
        }
        true
    }

    /// True when the path exists and can be opened for reading.
    pub fn can_read(&self, path: &str) -> bool {
        let path = Path::new(path);
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => fs::read_dir(path).is_ok(),
            Ok(_) => fs::File::open(path).is_ok(),
            Err(_) => false,
        }
    }

    pub fn access(&self, path: &str) -> AccessReport {
        let protected = self.is_protected(path);
        AccessReport {
            exists: Path::new(path).exists(),
            readable: self.can_read(path),
            protected,
            writable: !protected,
        }
    }
}
