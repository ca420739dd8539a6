//! Search over the record set: free text, exact filters, sort, result cache,
//! history and suggestions.
//!
//! Queries run on the blocking pool. Every `execute` takes a generation
//! ticket; once a newer call has started, older ones stop at the next stage
//! boundary and report [`SearchEvent::Superseded`].

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::models::{FilterValue, MetadataRecord, RecordId, SortOrder};
use crate::store::{Column, MetadataStore, RecordSet};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Filter value meaning "no constraint".
pub const ALL: &str = "All";

/// Inclusive bounds on `last_modified`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateRange {
    fn contains(&self, ts: Option<NaiveDateTime>) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(ts) = ts else {
            return false;
        };
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub text: String,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub date_range: Option<DateRange>,
}

impl SearchParams {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.to_string(), value.into());
        self
    }

    pub fn sorted(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = Some(field.to_string());
        self.sort_order = order;
        self
    }

    /// Cache key. Filters are a `BTreeMap`, so equal params serialise equally.
    fn signature(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub generation: u64,
    pub cached: bool,
    pub records: Vec<MetadataRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    Started { generation: u64 },
    Completed { generation: u64, count: usize, cached: bool },
    Failed { generation: u64, message: String },
    Superseded { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub params: SearchParams,
    pub timestamp: NaiveDateTime,
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularSearch {
    pub text: String,
    pub count: usize,
    pub last_used: NaiveDateTime,
}

/// FIFO result cache tied to one store revision. When full, the oldest half
/// is dropped in one go.
struct ResultCache {
    revision: u64,
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, Vec<RecordId>>,
}

impl ResultCache {
    fn new(capacity: usize) -> Self {
        Self {
            revision: 0,
            capacity: capacity.max(1),
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    /// Empties the cache when the store has moved on since it was filled.
    fn sync(&mut self, revision: u64) {
        if self.revision != revision {
            if !self.entries.is_empty() {
                debug!(from = self.revision, to = revision, "search cache invalidated");
            }
            self.clear();
            self.revision = revision;
        }
    }

    fn get(&self, key: &str) -> Option<&Vec<RecordId>> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, ids: Vec<RecordId>) {
        if self.entries.insert(key.clone(), ids).is_none() {
            self.order.push_back(key);
        }
        if self.entries.len() > self.capacity {
            let evict = (self.capacity / 2).max(1);
            for key in self.order.drain(..evict) {
                self.entries.remove(&key);
            }
        }
    }

    fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct EngineState {
    cache: Mutex<ResultCache>,
    history: Mutex<VecDeque<HistoryEntry>>,
    generation: AtomicU64,
    events: broadcast::Sender<SearchEvent>,
}

#[derive(Clone)]
pub struct SearchEngine {
    store: MetadataStore,
    cfg: SearchConfig,
    state: Arc<EngineState>,
}

impl SearchEngine {
    pub fn new(store: MetadataStore, cfg: &SearchConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            cfg: cfg.clone(),
            state: Arc::new(EngineState {
                cache: Mutex::new(ResultCache::new(cfg.result_cache_size)),
                history: Mutex::new(VecDeque::new()),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.state.events.subscribe()
    }

    pub async fn execute(&self, params: SearchParams) -> Result<SearchOutcome, SearchError> {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(SearchEvent::Started { generation });
        let key = params.signature();
        let revision = self.store.revision();

        let hit = {
            let mut cache = self.state.cache.lock();
            cache.sync(revision);
            cache.get(&key).cloned()
        };
        if let Some(ids) = hit {
            let records = self.store.read(|set| materialize(set, &ids));
            debug!(generation, count = records.len(), "search served from cache");
            self.emit(SearchEvent::Completed {
                generation,
                count: records.len(),
                cached: true,
            });
            return Ok(SearchOutcome {
                generation,
                cached: true,
                records,
            });
        }

        let store = self.store.clone();
        let state = Arc::clone(&self.state);
        let query = params.clone();
        let joined = tokio::task::spawn_blocking(move || {
            let is_current = || state.generation.load(Ordering::SeqCst) == generation;
            store.read(|set| {
                run_query(set, &query, &is_current).map(|ids| {
                    let records = materialize(set, &ids);
                    (ids, records)
                })
            })
        })
        .await;

        let (ids, records) = match joined {
            Ok(Some(found)) => found,
            Ok(None) => {
                debug!(generation, "search superseded");
                self.emit(SearchEvent::Superseded { generation });
                return Err(SearchError::Superseded { generation });
            }
            Err(err) => {
                let message = err.to_string();
                error!(generation, error = %message, "search task failed");
                self.emit(SearchEvent::Failed {
                    generation,
                    message: message.clone(),
                });
                return Err(SearchError::Failed { generation, message });
            }
        };

        // A mutation that landed mid-query makes the ids stale for caching.
        if self.store.revision() == revision {
            let mut cache = self.state.cache.lock();
            cache.sync(revision);
            cache.insert(key, ids);
        }
        self.record_history(params, records.len());

        info!(generation, count = records.len(), "search completed");
        self.emit(SearchEvent::Completed {
            generation,
            count: records.len(),
            cached: false,
        });
        Ok(SearchOutcome {
            generation,
            cached: false,
            records,
        })
    }

    /// Completions for a partial search text: history first, then column values.
    pub fn suggestions(&self, partial: &str) -> Vec<String> {
        if partial.chars().count() < self.cfg.min_suggestion_len {
            return Vec::new();
        }
        let needle = partial.to_lowercase();
        let limit = self.cfg.max_suggestions;
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for entry in self.state.history.lock().iter() {
            let text = &entry.params.text;
            if !text.is_empty() && text.to_lowercase().contains(&needle) && seen.insert(text.clone()) {
                out.push(text.clone());
            }
        }

        self.store.read(|set| {
            let columns: Vec<Column> = crate::models::Field::ALL
                .into_iter()
                .map(Column::Schema)
                .chain(set.extra_columns().iter().cloned().map(Column::Extra))
                .filter(Column::is_textual)
                .collect();
            for column in &columns {
                for record in set.records() {
                    if out.len() >= limit {
                        return;
                    }
                    let value = column.value(record);
                    if !value.is_empty()
                        && value.to_lowercase().contains(&needle)
                        && seen.insert(value.to_string())
                    {
                        out.push(value.into_owned());
                    }
                }
            }
        });

        out.truncate(limit);
        out
    }

    /// Most frequent search texts, ties going to the most recently used.
    pub fn popular_searches(&self) -> Vec<PopularSearch> {
        let history = self.state.history.lock();
        let mut tally: Vec<PopularSearch> = Vec::new();
        for entry in history.iter() {
            let text = &entry.params.text;
            if text.is_empty() {
                continue;
            }
            match tally.iter_mut().find(|p| &p.text == text) {
                Some(existing) => {
                    existing.count += 1;
                    existing.last_used = existing.last_used.max(entry.timestamp);
                }
                None => tally.push(PopularSearch {
                    text: text.clone(),
                    count: 1,
                    last_used: entry.timestamp,
                }),
            }
        }
        tally.sort_by(|a, b| b.count.cmp(&a.count).then(b.last_used.cmp(&a.last_used)));
        tally.truncate(self.cfg.popular_limit);
        tally
    }

    /// Past searches, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.state.history.lock().iter().cloned().collect()
    }

    pub fn clear_cache(&self) {
        self.state.cache.lock().clear();
        debug!("search cache cleared");
    }

    pub fn clear_history(&self) {
        self.state.history.lock().clear();
    }

    pub fn cached_queries(&self) -> usize {
        self.state.cache.lock().len()
    }

    fn record_history(&self, params: SearchParams, result_count: usize) {
        let mut history = self.state.history.lock();
        history.push_front(HistoryEntry {
            params,
            timestamp: crate::models::now(),
            result_count,
        });
        history.truncate(self.cfg.history_size);
    }

    fn emit(&self, event: SearchEvent) {
        // No subscribers is fine.
        let _ = self.state.events.send(event);
    }
}

fn materialize(set: &RecordSet, ids: &[RecordId]) -> Vec<MetadataRecord> {
    ids.iter().filter_map(|&id| set.record(id).cloned()).collect()
}

/// Runs the query stages over `set`. Returns `None` as soon as `is_current`
/// reports that a newer search has started.
pub fn run_query(
    set: &RecordSet,
    params: &SearchParams,
    is_current: &dyn Fn() -> bool,
) -> Option<Vec<RecordId>> {
    // Free text: any textual column contains the text.
    let text = params.text.to_lowercase();
    let mut ids: Vec<RecordId> = if text.is_empty() {
        set.ids().collect()
    } else {
        set.ids()
            .filter(|&id| {
                set.record(id)
                    .map(|r| r.text_values().any(|v| v.to_lowercase().contains(&text)))
                    .unwrap_or(false)
            })
            .collect()
    };
    if !is_current() {
        return None;
    }

    // Filters: exact match, list means membership.
    for (name, value) in &params.filters {
        let accepted: Vec<&str> = match value {
            FilterValue::One(v) => vec![v.as_str()],
            FilterValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        };
        if accepted.is_empty() || accepted.iter().all(|v| v.is_empty() || *v == ALL) {
            continue;
        }
        let Some(column) = set.column(name) else {
            warn!(field = %name, "ignoring search filter on unknown column");
            continue;
        };
        ids.retain(|&id| {
            set.record(id)
                .map(|r| accepted.contains(&&*column.value(r)))
                .unwrap_or(false)
        });
    }
    if let Some(range) = &params.date_range {
        ids.retain(|&id| set.record(id).map(|r| range.contains(r.last_modified)).unwrap_or(false));
    }
    if !is_current() {
        return None;
    }

    if let Some(name) = params.sort_by.as_deref().filter(|s| !s.is_empty()) {
        match set.column(name) {
            Some(column) => sort_ids(set, &mut ids, &column, params.sort_order),
            None => warn!(field = %name, "ignoring sort on unknown column"),
        }
    }
    if !is_current() {
        return None;
    }
    Some(ids)
}

/// Stable in both directions: equal keys keep their relative order.
fn sort_ids(set: &RecordSet, ids: &mut [RecordId], column: &Column, order: SortOrder) {
    let records = set.records();
    ids.sort_by(|&a, &b| {
        let (ra, rb) = (&records[a], &records[b]);
        let ord = match column {
            Column::Schema(field) => ra.compare(rb, *field),
            Column::Extra(_) => column.value(ra).cmp(&column.value(rb)),
        };
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::HashMode;
    use crate::config::MetadataConfig;
    use crate::safety::PathSafetyGate;

    fn open_store(dir: &std::path::Path) -> MetadataStore {
        let cfg = MetadataConfig {
            path: dir.join("metadata.csv").to_string_lossy().into_owned(),
            backup_dir: dir.join("backups").to_string_lossy().into_owned(),
            max_backups: 3,
            coalesce_window_secs: 0,
        };
        MetadataStore::open(&cfg, Arc::new(PathSafetyGate::unrestricted()), HashMode::None).unwrap()
    }

    fn seed(store: &MetadataStore, rows: &[(&str, &str, u64)]) {
        for (path, department, size) in rows {
            let mut record = MetadataRecord::placeholder(path);
            record.department = department.to_string();
            record.file_size = Some(*size);
            store.update(path, record).unwrap();
        }
    }

    fn record_set(rows: &[(&str, &str)]) -> RecordSet {
        let mut set = RecordSet::new();
        for (path, department) in rows {
            let mut record = MetadataRecord::placeholder(path);
            record.department = department.to_string();
            set.upsert(record);
        }
        set
    }

    #[test]
    fn result_cache_drops_oldest_half() {
        let mut cache = ResultCache::new(4);
        for i in 0..4 {
            cache.insert(format!("q{i}"), vec![i]);
        }
        assert_eq!(cache.len(), 4);
        cache.insert("q4".into(), vec![4]);
        assert_eq!(cache.len(), 3);
        assert!(cache.get("q0").is_none() && cache.get("q1").is_none());
        assert_eq!(cache.get("q4"), Some(&vec![4]));

        cache.sync(7);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn filters_are_exact_and_all_is_skipped() {
        let set = record_set(&[
            ("/p/a.dwg", "Electrical"),
            ("/p/b.dwg", "Electrical Controls"),
            ("/p/c.pdf", "Civil"),
        ]);
        let always = || true;

        let exact = SearchParams::default().filter("department", "Electrical");
        assert_eq!(run_query(&set, &exact, &always), Some(vec![0]));

        let all = SearchParams::default().filter("department", ALL);
        assert_eq!(run_query(&set, &all, &always), Some(vec![0, 1, 2]));

        let listed = SearchParams::default()
            .filter("department", vec!["Civil", "Electrical"])
            .filter("bogus", "x");
        assert_eq!(run_query(&set, &listed, &always), Some(vec![0, 2]));

        let text = SearchParams::text("ELECTRICAL");
        assert_eq!(run_query(&set, &text, &always), Some(vec![0, 1]));
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let set = record_set(&[
            ("/p/a.dwg", "Civil"),
            ("/p/b.dwg", "Electrical"),
            ("/p/c.dwg", "Civil"),
        ]);
        let always = || true;
        let asc = SearchParams::default().sorted("department", SortOrder::Asc);
        assert_eq!(run_query(&set, &asc, &always), Some(vec![0, 2, 1]));
        let desc = SearchParams::default().sorted("department", SortOrder::Desc);
        assert_eq!(run_query(&set, &desc, &always), Some(vec![1, 0, 2]));
    }

    #[test]
    fn stale_generation_stops_the_query() {
        let set = record_set(&[("/p/a.dwg", "Civil")]);
        let never = || false;
        assert_eq!(run_query(&set, &SearchParams::default(), &never), None);
    }

    #[test]
    fn date_range_bounds_last_modified() {
        let mut set = RecordSet::new();
        for (path, ts) in [("/p/a", "2024-01-01 00:00:00"), ("/p/b", "2024-06-01 00:00:00")] {
            let mut record = MetadataRecord::placeholder(path);
            record.last_modified = crate::models::parse_timestamp(ts);
            set.upsert(record);
        }
        set.upsert(MetadataRecord::placeholder("/p/undated"));

        let params = SearchParams {
            date_range: Some(DateRange {
                from: crate::models::parse_timestamp("2024-03-01"),
                to: None,
            }),
            ..SearchParams::default()
        };
        assert_eq!(run_query(&set, &params, &|| true), Some(vec![1]));
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache_until_a_mutation() {
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        seed(&store, &[("/p/a.dwg", "Civil", 10), ("/p/b.dwg", "Civil", 5)]);
        let engine = SearchEngine::new(store.clone(), &SearchConfig::default());

        let params = SearchParams::default()
            .filter("department", "Civil")
            .sorted("file_size", SortOrder::Asc);
        let first = engine.execute(params.clone()).await.unwrap();
        let second = engine.execute(params.clone()).await.unwrap();
        assert!(!first.cached && second.cached);
        assert_eq!(first.records, second.records);
        assert_eq!(first.records[0].file_path, "/p/b.dwg");

        seed(&store, &[("/p/c.dwg", "Civil", 1)]);
        let third = engine.execute(params).await.unwrap();
        assert!(!third.cached);
        assert_eq!(third.records.len(), 3);
        assert_eq!(third.records[0].file_path, "/p/c.dwg");
    }

    #[tokio::test]
    async fn events_follow_the_lifecycle() {
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        seed(&store, &[("/p/a.dwg", "Civil", 1)]);
        let engine = SearchEngine::new(store, &SearchConfig::default());
        let mut events = engine.subscribe();

        engine.execute(SearchParams::text("civil")).await.unwrap();
        assert_eq!(events.recv().await.unwrap(), SearchEvent::Started { generation: 1 });
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Completed {
                generation: 1,
                count: 1,
                cached: false
            }
        );
    }

    #[tokio::test]
    async fn suggestions_prefer_history() {
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        seed(&store, &[("/p/panel.dwg", "Electrical", 1)]);
        let engine = SearchEngine::new(store, &SearchConfig::default());

        engine.execute(SearchParams::text("electrical panel")).await.unwrap();
        let suggestions = engine.suggestions("el");
        assert_eq!(suggestions[0], "electrical panel");
        assert!(suggestions.contains(&"Electrical".to_string()));
        assert!(suggestions.len() <= 10);
        assert!(engine.suggestions("e").is_empty());
    }

    #[tokio::test]
    async fn popular_searches_rank_by_count_then_recency() {
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        let engine = SearchEngine::new(store, &SearchConfig::default());

        let runs = [
            ("pump", SortOrder::Asc),
            ("valve", SortOrder::Asc),
            ("pump", SortOrder::Desc),
            ("panel", SortOrder::Asc),
        ];
        for (text, order) in runs {
            // Cache hits are not recorded, so repeats differ in sort order.
            let params = SearchParams::text(text).sorted("file_name", order);
            engine.execute(params).await.unwrap();
        }
        let popular = engine.popular_searches();
        assert_eq!(popular[0].text, "pump");
        assert_eq!(popular[0].count, 2);
        // Equal counts: the later search ranks first.
        assert_eq!(popular[1].text, "panel");
        assert_eq!(popular.len(), 3);

        engine.clear_history();
        assert!(engine.popular_searches().is_empty());
    }

    #[tokio::test]
    async fn history_keeps_the_most_recent_entries() {
        let temp = tempfile::tempdir().unwrap();
        let engine = SearchEngine::new(open_store(temp.path()), &SearchConfig::default());
        for i in 0..55 {
            engine.execute(SearchParams::text(format!("q{i}"))).await.unwrap();
        }
        let history = engine.history();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].params.text, "q54");
        assert_eq!(history[49].params.text, "q5");
    }

    #[test]
    fn newer_search_supersedes_one_still_running() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        seed(&store, &[("/p/a.dwg", "Civil", 1)]);
        let engine = SearchEngine::new(store, &SearchConfig::default());

        runtime.block_on(async {
            let mut events = engine.subscribe();
            // Occupy the only blocking thread so both queries queue behind it.
            let (release, parked) = std::sync::mpsc::channel::<()>();
            let blocker = tokio::task::spawn_blocking(move || parked.recv());

            let older = tokio::spawn({
                let engine = engine.clone();
                async move { engine.execute(SearchParams::text("civil")).await }
            });
            assert_eq!(events.recv().await.unwrap(), SearchEvent::Started { generation: 1 });
            let newer = tokio::spawn({
                let engine = engine.clone();
                async move { engine.execute(SearchParams::text("a.dwg")).await }
            });
            assert_eq!(events.recv().await.unwrap(), SearchEvent::Started { generation: 2 });

            release.send(()).unwrap();
            blocker.await.unwrap().unwrap();

            let older = older.await.unwrap();
            assert_eq!(older.unwrap_err(), SearchError::Superseded { generation: 1 });
            let newer = newer.await.unwrap().unwrap();
            assert_eq!(newer.generation, 2);
            assert_eq!(newer.records.len(), 1);

            let tail = [events.recv().await.unwrap(), events.recv().await.unwrap()];
            assert!(tail.contains(&SearchEvent::Superseded { generation: 1 }));
            assert!(tail.contains(&SearchEvent::Completed {
                generation: 2,
                count: 1,
                cached: false
            }));
            assert!(engine.history().iter().all(|h| h.params.text != "civil"));
        });
    }

    #[tokio::test]
    async fn suggestions_are_capped_with_history_first() {
        let temp = tempfile::tempdir().unwrap();
        let store = open_store(temp.path());
        let rows: Vec<(String, String)> = (0..12)
            .map(|i| (format!("/p/x{i}.dwg"), format!("Elec {i:02}")))
            .collect();
        let rows: Vec<(&str, &str, u64)> = rows.iter().map(|(p, d)| (p.as_str(), d.as_str(), 1)).collect();
        seed(&store, &rows);
        let engine = SearchEngine::new(store, &SearchConfig::default());

        engine.execute(SearchParams::text("electrical panel")).await.unwrap();
        let suggestions = engine.suggestions("el");
        assert_eq!(suggestions.len(), 10);
        assert_eq!(suggestions[0], "electrical panel");
        assert_eq!(suggestions[1], "Elec 00");
    }

    #[tokio::test]
    async fn popular_searches_are_capped() {
        let temp = tempfile::tempdir().unwrap();
        let engine = SearchEngine::new(open_store(temp.path()), &SearchConfig::default());
        for text in ["a1", "a2", "a3", "a4", "a5", "a6"] {
            engine.execute(SearchParams::text(text)).await.unwrap();
        }
        let repeat = SearchParams::text("a1").sorted("file_name", SortOrder::Desc);
        engine.execute(repeat).await.unwrap();

        let popular = engine.popular_searches();
        assert_eq!(popular.len(), 5);
        assert_eq!(popular[0].text, "a1");
        assert_eq!(popular[0].count, 2);
        assert!(popular.iter().all(|p| p.text != "a2"));
    }

    #[test]
    fn surrounding_spaces_are_part_of_the_text() {
        let set = record_set(&[("/p/pump room.dwg", "Civil"), ("/p/pump.dwg", "Civil")]);
        let params = SearchParams::text("pump ");
        assert_eq!(run_query(&set, &params, &|| true), Some(vec![0]));
    }
}
