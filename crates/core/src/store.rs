//! The metadata store: an in-memory record set backed by one CSV file.
//!
//! Mutations are serialised on a single write gate. Each one clones the
//! committed set, applies the change to the clone, backs up the pre-mutation
//! file content, writes the candidate atomically and only then swaps it in.
//! A failed backup or write therefore leaves memory exactly as it was.

use crate::cache::{CacheStats, MetadataCache};
use crate::checksum::HashMode;
use crate::config::MetadataConfig;
use crate::error::{Result, StoreError};
use crate::models::{self, Field, FilterValue, MetadataRecord, RecordId};
use crate::safety::PathSafetyGate;
use crate::schema;
use chrono::NaiveDateTime;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::{read_table, write_table_atomic, BackupEntry, BackupRotation, StorageError, Table};
use tracing::{debug, error, info, warn};

/// A column of the record set: a schema field or a carried-over extra column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Schema(Field),
    Extra(String),
}

impl Column {
    pub fn value<'a>(&self, record: &'a MetadataRecord) -> Cow<'a, str> {
        match self {
            Column::Schema(field) => record.value(*field),
            Column::Extra(name) => Cow::Borrowed(record.extra.get(name).map(String::as_str).unwrap_or("")),
        }
    }

    pub fn is_textual(&self) -> bool {
        match self {
            Column::Schema(field) => field.is_textual(),
            Column::Extra(_) => true,
        }
    }
}

/// Records in insertion order with a path index. Replacing a record keeps
/// its slot, so ids stay valid for the lifetime of one set.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<MetadataRecord>,
    by_path: HashMap<String, RecordId>,
    extra_columns: Vec<String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_decoded(decoded: schema::Decoded) -> Self {
        let mut set = RecordSet {
            extra_columns: decoded.extra_columns,
            ..RecordSet::default()
        };
        for record in decoded.records {
            set.upsert(record);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&MetadataRecord> {
        self.records.get(id)
    }

    pub fn id_of(&self, path: &str) -> Option<RecordId> {
        self.by_path.get(path).copied()
    }

    pub fn find(&self, path: &str) -> Option<&MetadataRecord> {
        self.id_of(path).map(|id| &self.records[id])
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn ids(&self) -> std::ops::Range<RecordId> {
        0..self.records.len()
    }

    /// Resolves a column name; `None` for names neither in the schema nor on disk.
    pub fn column(&self, name: &str) -> Option<Column> {
        match name.parse::<Field>() {
            Ok(field) => Some(Column::Schema(field)),
            Err(_) => self
                .extra_columns
                .iter()
                .find(|c| c.as_str() == name)
                .map(|c| Column::Extra(c.clone())),
        }
    }

    /// Inserts or replaces the record keyed by its `file_path`.
    pub fn upsert(&mut self, record: MetadataRecord) -> RecordId {
        for key in record.extra.keys() {
            if !self.extra_columns.contains(key) {
                self.extra_columns.push(key.clone());
            }
        }
        match self.by_path.get(&record.file_path) {
            Some(&id) => {
                self.records[id] = record;
                id
            }
            None => {
                let id = self.records.len();
                self.by_path.insert(record.file_path.clone(), id);
                self.records.push(record);
                id
            }
        }
    }

    /// Ids of records satisfying every non-empty criterion.
    ///
    /// A list value means exact membership, a single value a case-insensitive
    /// substring match. Unknown columns are logged and ignored.
    pub fn matching(&self, criteria: &BTreeMap<String, FilterValue>) -> Vec<RecordId> {
        let mut predicates: Vec<(Column, Predicate)> = Vec::new();
        for (name, value) in criteria {
            if value.is_empty() {
                continue;
            }
            let Some(column) = self.column(name) else {
                warn!(field = %name, "ignoring filter on unknown column");
                continue;
            };
            let predicate = match value {
                FilterValue::One(text) => Predicate::Contains(text.to_lowercase()),
                FilterValue::Many(values) => Predicate::OneOf(values.iter().cloned().collect()),
            };
            predicates.push((column, predicate));
        }

        self.ids()
            .filter(|&id| {
                let record = &self.records[id];
                predicates
                    .iter()
                    .all(|(column, predicate)| predicate.accepts(&column.value(record)))
            })
            .collect()
    }

    fn to_table(&self) -> Table {
        schema::to_table(&self.records, &self.extra_columns)
    }
}

enum Predicate {
    Contains(String),
    OneOf(HashSet<String>),
}

impl Predicate {
    fn accepts(&self, value: &str) -> bool {
        match self {
            Predicate::Contains(needle) => value.to_lowercase().contains(needle.as_str()),
            Predicate::OneOf(values) => values.contains(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub added: Vec<String>,
    /// Path and reason for each path that was not indexed.
    pub skipped: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_files: usize,
    pub departments: Vec<String>,
    pub file_types: Vec<String>,
    pub newest_file: Option<NaiveDateTime>,
    pub oldest_file: Option<NaiveDateTime>,
}

/// Which cache entries a commit has to refresh.
enum Touched {
    Paths(Vec<String>),
    Everything,
}

#[derive(Clone)]
pub struct MetadataStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    rotation: BackupRotation,
    coalesce_window_secs: u64,
    gate: Arc<PathSafetyGate>,
    hash_mode: HashMode,
    records: RwLock<RecordSet>,
    cache: MetadataCache,
    write_gate: Mutex<()>,
    revision: AtomicU64,
}

impl MetadataStore {
    /// Loads the metadata file, creating it with only a header when missing.
    pub fn open(cfg: &MetadataConfig, gate: Arc<PathSafetyGate>, hash_mode: HashMode) -> Result<Self> {
        let path = PathBuf::from(&cfg.path);
        let backup_dir = PathBuf::from(&cfg.backup_dir);
        fs::create_dir_all(&backup_dir).map_err(|source| {
            StoreError::persistence(
                "open",
                StorageError::Io {
                    path: backup_dir.clone(),
                    source,
                },
            )
        })?;

        if !path.exists() {
            write_table_atomic(&path, &Table::new(schema::headers(&[])))
                .map_err(|e| StoreError::persistence("create", e))?;
            info!(path = %path.display(), "created empty metadata file");
        }
        let set = load_set(&path)?;
        info!(path = %path.display(), records = set.len(), "metadata loaded");

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                rotation: BackupRotation::new(backup_dir, cfg.max_backups),
                coalesce_window_secs: cfg.coalesce_window_secs,
                gate,
                hash_mode,
                records: RwLock::new(set),
                cache: MetadataCache::new(),
                write_gate: Mutex::new(()),
                revision: AtomicU64::new(0),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn gate(&self) -> &PathSafetyGate {
        &self.inner.gate
    }

    /// Runs `f` against the committed record set under a read lock.
    pub fn read<T>(&self, f: impl FnOnce(&RecordSet) -> T) -> T {
        f(&self.inner.records.read())
    }

    /// Counter bumped by every committed mutation and reload.
    pub fn revision(&self) -> u64 {
        self.inner.revision.load(Ordering::SeqCst)
    }

    /// Adds default records for `paths`, replacing existing ones.
    ///
    /// Protected and unreadable paths are skipped. The batch fails as a whole
    /// only when the backup or the write fails.
    pub fn add_basic<I, S>(&self, paths: I) -> Result<IndexReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = IndexReport::default();
        let mut fresh = Vec::new();
        let mut seen = HashSet::new();
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() || !seen.insert(path.to_string()) {
                continue;
            }
            if !self.inner.gate.can_write(path) {
                report.skipped.push((path.to_string(), "protected".to_string()));
                continue;
            }
            match MetadataRecord::from_file(path, self.inner.hash_mode) {
                Ok(record) => fresh.push(record),
                Err(err) => {
                    warn!(path, error = %err, "skipping unreadable path");
                    report.skipped.push((path.to_string(), err.to_string()));
                }
            }
        }

        if fresh.is_empty() {
            debug!(skipped = report.skipped.len(), "nothing to add");
            return Ok(report);
        }
        report.added = fresh.iter().map(|r| r.file_path.clone()).collect();
        let touched = report.added.clone();
        self.mutate("add", move |set| {
            for record in fresh {
                set.upsert(record);
            }
            Touched::Paths(touched)
        })?;
        info!(added = report.added.len(), skipped = report.skipped.len(), "files added");
        Ok(report)
    }

    /// Cache first, then the record set.
    pub fn get(&self, path: &str) -> Option<MetadataRecord> {
        if let Some(record) = self.inner.cache.get(path) {
            return Some(record);
        }
        // Filled under the read guard so a concurrent commit cannot be
        // overwritten with the record it replaced.
        let set = self.inner.records.read();
        let record = set.find(path).cloned()?;
        self.inner.cache.put(record.clone());
        drop(set);
        Some(record)
    }

    /// The stored record or, for a readable file without one, a transient
    /// default built from the filesystem. Nothing is persisted.
    pub fn get_for_display(&self, path: &str) -> Option<MetadataRecord> {
        if let Some(record) = self.get(path) {
            return Some(record);
        }
        if !self.inner.gate.can_read(path) {
            return None;
        }
        match MetadataRecord::from_file(path, HashMode::None) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(path, error = %err, "no file facts for display");
                Some(MetadataRecord::placeholder(path))
            }
        }
    }

    /// Replaces the record for `path`, stamping `file_path` and `last_modified`.
    pub fn update(&self, path: &str, mut record: MetadataRecord) -> Result<()> {
        if !self.inner.gate.can_write(path) {
            return Err(StoreError::AccessDenied(path.to_string()));
        }
        record.file_path = path.to_string();
        if record.file_name.is_empty() {
            fill_path_facts(&mut record);
        }
        record.last_modified = Some(models::now());

        let key = path.to_string();
        self.mutate("update", move |set| {
            set.upsert(record);
            Touched::Paths(vec![key])
        })?;
        info!(path, "metadata updated");
        Ok(())
    }

    pub fn search(&self, criteria: &BTreeMap<String, FilterValue>) -> Vec<MetadataRecord> {
        let set = self.inner.records.read();
        set.matching(criteria)
            .into_iter()
            .map(|id| set.records[id].clone())
            .collect()
    }

    /// Distinct non-empty values of a column, ascending.
    pub fn unique_values(&self, field: &str) -> Vec<String> {
        let set = self.inner.records.read();
        let Some(column) = set.column(field) else {
            warn!(field, "unique values requested for unknown column");
            return Vec::new();
        };
        unique(&set, &column)
    }

    pub fn statistics(&self) -> Statistics {
        let set = self.inner.records.read();
        let dates = || set.records.iter().filter_map(|r| r.date_added);
        Statistics {
            total_files: set.len(),
            departments: unique(&set, &Column::Schema(Field::Department)),
            file_types: unique(&set, &Column::Schema(Field::DocumentType)),
            newest_file: dates().max(),
            oldest_file: dates().min(),
        }
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        debug!("metadata cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    pub fn get_file_count(&self) -> usize {
        self.inner.records.read().len()
    }

    /// Re-reads the persisted file; it wins over anything held in memory.
    pub fn reload(&self) -> Result<usize> {
        let _guard = self.inner.write_gate.lock();
        let set = load_set(&self.inner.path)?;
        let count = set.len();
        let mut records = self.inner.records.write();
        *records = set;
        self.inner.cache.clear();
        drop(records);
        self.inner.revision.fetch_add(1, Ordering::SeqCst);
        info!(path = %self.inner.path.display(), records = count, "metadata reloaded");
        Ok(count)
    }

    /// Backups, oldest first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        self.inner
            .rotation
            .list()
            .map_err(|e| StoreError::persistence("list backups", e))
    }

    /// Replaces the record set with a backup's content. The current state is
    /// itself backed up first, so a restore can be undone.
    pub fn restore_backup(&self, name: &str) -> Result<usize> {
        let entry = self
            .inner
            .rotation
            .find(name)
            .map_err(|e| StoreError::persistence("restore", e))?
            .ok_or_else(|| StoreError::BackupNotFound(name.to_string()))?;
        let restored = load_set(&entry.path)?;
        let count = restored.len();
        self.mutate("restore", move |set| {
            *set = restored;
            Touched::Everything
        })?;
        info!(backup = %entry.name, records = count, "backup restored");
        Ok(count)
    }

    /// Merges rows from another table file keyed by `file_path`. Rows under
    /// protected prefixes are skipped.
    pub fn import_table(&self, path: &Path) -> Result<IndexReport> {
        let table = read_import(path)?;
        let decoded = schema::from_table(&table);
        let mut report = IndexReport::default();
        let mut rows = Vec::new();
        for mut record in decoded.records {
            if record.file_name.is_empty() {
                fill_path_facts(&mut record);
            }
            if self.inner.gate.can_write(&record.file_path) {
                report.added.push(record.file_path.clone());
                rows.push(record);
            } else {
                report.skipped.push((record.file_path, "protected".to_string()));
            }
        }
        if rows.is_empty() {
            return Ok(report);
        }

        let extra_columns = decoded.extra_columns;
        let touched = report.added.clone();
        self.mutate("import", move |set| {
            for column in extra_columns {
                if !set.extra_columns.contains(&column) {
                    set.extra_columns.push(column);
                }
            }
            for record in rows {
                set.upsert(record);
            }
            Touched::Paths(touched)
        })?;
        info!(source = %path.display(), imported = report.added.len(), "table imported");
        Ok(report)
    }

    fn mutate<F>(&self, operation: &'static str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut RecordSet) -> Touched,
    {
        let _guard = self.inner.write_gate.lock();
        let (before, mut candidate) = {
            let current = self.inner.records.read();
            (current.to_table(), current.clone())
        };
        let touched = apply(&mut candidate);

        self.backup(&before)?;
        write_table_atomic(&self.inner.path, &candidate.to_table()).map_err(|e| {
            error!(operation, path = %self.inner.path.display(), error = %e, "persist failed");
            StoreError::persistence("save", e)
        })?;

        let mut records = self.inner.records.write();
        *records = candidate;
        match touched {
            Touched::Paths(paths) => {
                for path in paths {
                    match records.find(&path) {
                        Some(record) => self.inner.cache.put(record.clone()),
                        None => self.inner.cache.invalidate(&path),
                    }
                }
            }
            Touched::Everything => self.inner.cache.clear(),
        }
        drop(records);
        let revision = self.inner.revision.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(operation, revision, "mutation committed");
        Ok(())
    }

    /// Snapshot of the pre-mutation state, unless a recent one can be reused.
    fn backup(&self, before: &Table) -> Result<()> {
        let now = models::now();
        if self.inner.coalesce_window_secs > 0 {
            if let Ok(Some(BackupEntry {
                created: Some(created),
                name,
                ..
            })) = self.inner.rotation.latest()
            {
                let age = (now - created).num_seconds();
                if (0..self.inner.coalesce_window_secs as i64).contains(&age) {
                    debug!(backup = %name, age, "reusing recent backup");
                    return Ok(());
                }
            }
        }
        self.inner.rotation.create(before, now).map_err(|e| {
            error!(dir = %self.inner.rotation.dir().display(), error = %e, "backup failed");
            StoreError::persistence("backup", e)
        })?;
        Ok(())
    }
}

/// Fills name, location and extension from `file_path`.
fn fill_path_facts(record: &mut MetadataRecord) {
    let derived = MetadataRecord::placeholder(&record.file_path);
    record.file_name = derived.file_name;
    record.file_location = derived.file_location;
    record.file_extension = derived.file_extension;
}

fn load_set(path: &Path) -> Result<RecordSet> {
    let table = read_table(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "load failed");
        StoreError::persistence("load", e)
    })?;
    Ok(RecordSet::from_decoded(schema::from_table(&table)))
}

fn read_import(path: &Path) -> Result<Table> {
    let is_workbook = matches!(
        models::extension_of(path).as_str(),
        ".xlsx" | ".xlsm" | ".xls" | ".ods"
    );
    let table = if is_workbook {
        read_workbook(path)
    } else {
        read_table(path)
    };
    table.map_err(|e| StoreError::persistence("import", e))
}

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> storage::Result<Table> {
    storage::xlsx::read_workbook(path)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(path: &Path) -> storage::Result<Table> {
    Err(StorageError::Workbook {
        path: path.to_path_buf(),
        message: "built without the `xlsx` feature".to_string(),
    })
}

fn unique(set: &RecordSet, column: &Column) -> Vec<String> {
    set.records
        .iter()
        .map(|r| column.value(r))
        .filter(|v| !v.is_empty())
        .map(Cow::into_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
