//! Timestamped snapshot files with bounded retention.
//!
//! Names look like `metadata_backup_20240131_154500.csv`. Backups taken within
//! the same second get a `_001`, `_002`, ... suffix. Ordering is by stamp and
//! then by the numeric suffix, so `_1000` still sorts after `_999`.

use crate::table::{write_table_atomic, Table};
use crate::{Result, StorageError};
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    /// `YYYYMMDD_HHMMSS` part of the name.
    pub stamp: String,
    pub sequence: u32,
    pub created: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct BackupRotation {
    dir: PathBuf,
    prefix: String,
    extension: String,
    max_backups: usize,
}

impl BackupRotation {
    pub fn new(dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            dir: dir.into(),
            prefix: "metadata_backup_".to_string(),
            extension: "csv".to_string(),
            max_backups,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Writes `table` as a new backup stamped `at`, then prunes old ones.
    ///
    /// Pruning failures are logged and do not fail the backup itself.
    pub fn create(&self, table: &Table, at: NaiveDateTime) -> Result<BackupEntry> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        let stamp = at.format(STAMP_FORMAT).to_string();

        let sequence = self
            .list()?
            .iter()
            .filter(|e| e.stamp == stamp)
            .map(|e| e.sequence + 1)
            .max()
            .unwrap_or(0);
        let name = self.file_name(&stamp, sequence);
        let path = self.dir.join(&name);
        write_table_atomic(&path, table)?;
        tracing::info!(backup = %path.display(), rows = table.rows.len(), "backup created");

        if let Err(err) = self.prune() {
            tracing::warn!(dir = %self.dir.display(), error = %err, "backup cleanup failed");
        }

        Ok(BackupEntry {
            name,
            path,
            stamp,
            sequence,
            created: Some(at),
        })
    }

    /// All backups, oldest first.
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| StorageError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| StorageError::io(&self.dir, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(parsed) = self.parse_name(&name) {
                entries.push(parsed);
            }
        }
        entries.sort_by(|a, b| (&a.stamp, a.sequence).cmp(&(&b.stamp, b.sequence)));
        Ok(entries)
    }

    pub fn latest(&self) -> Result<Option<BackupEntry>> {
        Ok(self.list()?.pop())
    }

    pub fn find(&self, name: &str) -> Result<Option<BackupEntry>> {
        Ok(self.list()?.into_iter().find(|e| e.name == name))
    }

    /// Deletes the oldest backups until at most `max_backups` remain.
    pub fn prune(&self) -> Result<Vec<PathBuf>> {
        let entries = self.list()?;
        let excess = entries.len().saturating_sub(self.max_backups);
        let mut removed = Vec::with_capacity(excess);
        for entry in entries.into_iter().take(excess) {
            fs::remove_file(&entry.path).map_err(|e| StorageError::io(&entry.path, e))?;
            tracing::debug!(backup = %entry.path.display(), "old backup removed");
            removed.push(entry.path);
        }
        Ok(removed)
    }

    fn file_name(&self, stamp: &str, sequence: u32) -> String {
        if sequence == 0 {
            format!("{}{}.{}", self.prefix, stamp, self.extension)
        } else {
            format!("{}{}_{:03}.{}", self.prefix, stamp, sequence, self.extension)
        }
    }

    fn parse_name(&self, name: &str) -> Option<BackupEntry> {
        let body = name
            .strip_prefix(&self.prefix)?
            .strip_suffix(&self.extension)?
            .strip_suffix('.')?;
        if body.len() < STAMP_LEN || !body.is_char_boundary(STAMP_LEN) {
            return None;
        }
        let (stamp, rest) = body.split_at(STAMP_LEN);
        let created = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        let sequence = match rest {
            "" => 0,
            _ => rest.strip_prefix('_')?.parse().ok()?,
        };
        Some(BackupEntry {
            name: name.to_string(),
            path: self.dir.join(name),
            stamp: stamp.to_string(),
            sequence,
            created: Some(created),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn table(marker: &str) -> Table {
        Table {
            headers: vec!["file_path".into()],
            rows: vec![vec![marker.into()]],
        }
    }

    #[test]
    fn keeps_only_newest_backups() {
        let temp = tempfile::tempdir().unwrap();
        let rotation = BackupRotation::new(temp.path(), 2);
        for (i, s) in [1, 2, 3, 4].into_iter().enumerate() {
            rotation.create(&table(&i.to_string()), at(10, 0, s)).unwrap();
        }

        let names: Vec<String> = rotation.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![
                "metadata_backup_20240131_100003.csv".to_string(),
                "metadata_backup_20240131_100004.csv".to_string(),
            ]
        );
    }

    #[test]
    fn same_second_backups_get_ordered_suffixes() {
        let temp = tempfile::tempdir().unwrap();
        let rotation = BackupRotation::new(temp.path(), 10);
        let first = rotation.create(&table("a"), at(9, 30, 0)).unwrap();
        let second = rotation.create(&table("b"), at(9, 30, 0)).unwrap();
        let third = rotation.create(&table("c"), at(9, 30, 1)).unwrap();

        assert_eq!(first.name, "metadata_backup_20240131_093000.csv");
        assert_eq!(second.name, "metadata_backup_20240131_093000_001.csv");
        let latest = rotation.latest().unwrap().unwrap();
        assert_eq!(latest.name, third.name);
    }

    #[test]
    fn suffix_continues_after_base_name_was_pruned() {
        let temp = tempfile::tempdir().unwrap();
        let rotation = BackupRotation::new(temp.path(), 1);
        rotation.create(&table("a"), at(8, 0, 0)).unwrap();
        let second = rotation.create(&table("b"), at(8, 0, 0)).unwrap();
        let third = rotation.create(&table("c"), at(8, 0, 0)).unwrap();

        assert_eq!(second.sequence, 1);
        assert_eq!(third.sequence, 2);
        let remaining = rotation.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, third.name);
    }

    #[test]
    fn four_digit_suffixes_sort_after_three_digit_ones() {
        let temp = tempfile::tempdir().unwrap();
        for name in [
            "metadata_backup_20240131_080000_998.csv",
            "metadata_backup_20240131_080000_999.csv",
        ] {
            fs::write(temp.path().join(name), "file_path\n").unwrap();
        }
        let rotation = BackupRotation::new(temp.path(), 2);
        let newest = rotation.create(&table("z"), at(8, 0, 0)).unwrap();

        assert_eq!(newest.name, "metadata_backup_20240131_080000_1000.csv");
        let names: Vec<String> = rotation.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![
                "metadata_backup_20240131_080000_999.csv".to_string(),
                "metadata_backup_20240131_080000_1000.csv".to_string(),
            ]
        );
        assert_eq!(rotation.latest().unwrap().unwrap().name, newest.name);
    }

    #[test]
    fn foreign_files_are_ignored() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "keep me").unwrap();
        fs::write(temp.path().join("metadata_backup_garbage.csv"), "x").unwrap();
        let rotation = BackupRotation::new(temp.path(), 0);

        assert!(rotation.list().unwrap().is_empty());
        assert!(rotation.prune().unwrap().is_empty());
        assert!(temp.path().join("notes.txt").exists());
    }
}
