use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cli::session::{self, SessionCommand};
use cli::{assign, logging, render};
use navigator_core::checksum::HashMode;
use navigator_core::config::{self, AppConfig};
use navigator_core::models::{Field, FilterValue, SortOrder};
use navigator_core::paths::PathManager;
use navigator_core::pipeline;
use navigator_core::scanner::ScanOptions;
use navigator_core::search::{DateRange, SearchEngine, SearchParams};
use navigator_core::{MetadataRecord, MetadataStore, PathSafetyGate, StoreError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&cfg.logging, cli.verbose);

    match cli.command {
        Commands::Index { paths, json } => run_index(&cfg, paths, json).await,
        Commands::Show { path, json } => run_show(&cfg, &path, json),
        Commands::Set { path, assignments } => run_set(&cfg, &path, &assignments),
        Commands::Search {
            text,
            filters,
            any,
            sort,
            desc,
            from,
            to,
            limit,
            json,
        } => {
            let params = build_params(text, &filters, &any, sort, desc, from, to)?;
            run_search(&cfg, params, limit, json).await
        }
        Commands::Suggest { partial, json } => run_suggest(&cfg, &partial, json),
        Commands::Session { json } => run_session(&cfg, json).await,
        Commands::Values { field, json } => {
            let store = open_store(&cfg)?;
            print_list(&store.unique_values(&field), json)
        }
        Commands::Stats { json } => run_stats(&cfg, json),
        Commands::Backups { json } => run_backups(&cfg, json),
        Commands::Restore { name } => {
            let store = open_store(&cfg)?;
            let count = store.restore_backup(&name)?;
            println!("restored {name}: {count} records");
            Ok(())
        }
        Commands::Import { file, json } => run_import(&cfg, &file, json),
        Commands::CheckPaths { json } => run_check_paths(&cfg, json).await,
        Commands::Tree { path, depth } => run_tree(&cfg, path, depth).await,
        Commands::Vocab { field, json } => run_vocab(&cfg, field.as_deref(), json),
    }
}

#[derive(Parser)]
#[command(name = "file-navigator")]
#[command(about = "Engineering file metadata index", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add default records for files (folders are walked)
    Index {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Show the metadata for a file, or its file facts when it has none
    Show {
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Edit metadata fields: field=value ...
    Set {
        path: String,
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Search the index
    Search {
        /// Free text matched against every text column
        #[arg(default_value = "")]
        text: String,
        /// Exact filter, field=value (repeatable)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        /// Membership filter, field=v1,v2 (repeatable)
        #[arg(long)]
        any: Vec<String>,
        /// Column to sort by
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, default_value_t = false)]
        desc: bool,
        /// Earliest last_modified (YYYY-MM-DD or timestamp)
        #[arg(long)]
        from: Option<String>,
        /// Latest last_modified (YYYY-MM-DD or timestamp)
        #[arg(long)]
        to: Option<String>,
        /// Maximum rows printed
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Suggest search texts for a partial input
    Suggest {
        partial: String,
        #[arg(long)]
        json: bool,
    },
    /// Read search, suggest, popular and history commands from stdin
    /// against one engine; history lasts for the session
    Session {
        /// One JSON document per response line
        #[arg(long)]
        json: bool,
    },
    /// Distinct values of a column
    Values {
        field: String,
        #[arg(long)]
        json: bool,
    },
    /// Summary statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// List metadata backups, oldest first
    Backups {
        #[arg(long)]
        json: bool,
    },
    /// Replace the index with a backup (the current state is backed up first)
    Restore { name: String },
    /// Merge rows from another metadata table keyed by file_path
    Import {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Check that the network paths are reachable
    CheckPaths {
        #[arg(long)]
        json: bool,
    },
    /// Print the folder tree below a path (default: the resolved root)
    Tree {
        path: Option<PathBuf>,
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },
    /// Print the value lists offered for classification fields
    Vocab {
        field: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

fn open_store(cfg: &AppConfig) -> Result<MetadataStore> {
    let gate = PathSafetyGate::from_config(cfg);
    let hash_mode = HashMode::from(cfg.index.hash_mode.as_deref().unwrap_or(""));
    MetadataStore::open(&cfg.metadata, Arc::new(gate), hash_mode)
        .with_context(|| format!("opening metadata file {}", cfg.metadata.path))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_list(values: &[String], json: bool) -> Result<()> {
    if json {
        return print_json(&values);
    }
    for value in values {
        println!("{value}");
    }
    Ok(())
}

async fn run_index(cfg: &AppConfig, paths: Vec<PathBuf>, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping scan");
            on_interrupt.cancel();
        }
    });

    let summary = pipeline::index_paths(&store, &paths, &ScanOptions::from(&cfg.index), cancel).await?;
    if json {
        return print_json(&summary);
    }
    println!(
        "index: discovered {}, added {}, skipped {}{}",
        summary.discovered,
        summary.added,
        summary.skipped.len(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    for (path, reason) in &summary.skipped {
        println!("  skipped {path}: {reason}");
    }
    Ok(())
}

fn run_show(cfg: &AppConfig, path: &str, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let Some(record) = store.get_for_display(path) else {
        bail!("no metadata and no readable file at {path}");
    };
    let access = store.gate().access(path);
    let indexed = store.read(|set| set.id_of(path).is_some());
    if json {
        return print_json(&serde_json::json!({
            "record": record,
            "indexed": indexed,
            "access": access,
        }));
    }
    for line in render::record_lines(&record) {
        println!("{line}");
    }
    if !indexed {
        println!("(not indexed)");
    }
    if access.protected {
        println!("(protected: read-only)");
    }
    Ok(())
}

fn run_set(cfg: &AppConfig, path: &str, assignments: &[String]) -> Result<()> {
    let store = open_store(cfg)?;
    let mut record = store
        .get_for_display(path)
        .unwrap_or_else(|| MetadataRecord::placeholder(path));
    let changed = assign::apply_assignments(&mut record, assignments)?;
    for (field, value) in assign::off_vocabulary(&cfg.vocabularies, &record, &changed) {
        warn!(field = %field, value = %value, "value is not in the configured list");
    }
    match store.update(path, record) {
        Ok(()) => {
            println!("updated {} field(s) on {path}", changed.len());
            Ok(())
        }
        Err(StoreError::AccessDenied(p)) => bail!("{p} is protected; metadata left unchanged"),
        Err(err) => Err(err.into()),
    }
}

fn parse_pairs(args: &[String]) -> Result<Vec<(String, String)>> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .with_context(|| format!("expected field=value, got {arg:?}"))
        })
        .collect()
}

fn parse_date(value: Option<String>) -> Result<Option<chrono::NaiveDateTime>> {
    value
        .map(|v| navigator_core::models::parse_timestamp(&v).with_context(|| format!("unreadable date {v:?}")))
        .transpose()
}

fn build_params(
    text: String,
    filters: &[String],
    any: &[String],
    sort: Option<String>,
    desc: bool,
    from: Option<String>,
    to: Option<String>,
) -> Result<SearchParams> {
    let mut params = SearchParams::text(text.trim());
    for (field, value) in parse_pairs(filters)? {
        params.filters.insert(field, FilterValue::One(value));
    }
    for (field, values) in parse_pairs(any)? {
        let list = values.split(',').map(|v| v.trim().to_string()).collect();
        params.filters.insert(field, FilterValue::Many(list));
    }
    params.sort_by = sort;
    params.sort_order = if desc { SortOrder::Desc } else { SortOrder::Asc };
    let (from, to) = (parse_date(from)?, parse_date(to)?);
    if from.is_some() || to.is_some() {
        params.date_range = Some(DateRange { from, to });
    }
    Ok(params)
}

async fn run_search(cfg: &AppConfig, params: SearchParams, limit: Option<usize>, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let engine = SearchEngine::new(store, &cfg.search);
    let outcome = engine.execute(params).await?;
    let shown = limit.unwrap_or(outcome.records.len()).min(outcome.records.len());
    if json {
        return print_json(&outcome.records[..shown]);
    }
    for record in &outcome.records[..shown] {
        println!("{}", render::record_row(record));
    }
    println!("{} match(es)", outcome.records.len());
    Ok(())
}

fn run_suggest(cfg: &AppConfig, partial: &str, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let engine = SearchEngine::new(store, &cfg.search);
    print_list(&engine.suggestions(partial), json)
}

async fn run_session(cfg: &AppConfig, json: bool) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    let store = open_store(cfg)?;
    let engine = SearchEngine::new(store, &cfg.search);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match session::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };
        match command {
            SessionCommand::Search(text) => {
                let outcome = engine.execute(SearchParams::text(text)).await?;
                if json {
                    println!("{}", serde_json::to_string(&outcome)?);
                } else {
                    for record in &outcome.records {
                        println!("{}", render::record_row(record));
                    }
                    println!(
                        "{} match(es){}",
                        outcome.records.len(),
                        if outcome.cached { " (cached)" } else { "" }
                    );
                }
            }
            SessionCommand::Suggest(partial) => {
                let suggestions = engine.suggestions(&partial);
                if json {
                    println!("{}", serde_json::to_string(&suggestions)?);
                } else {
                    println!("{}", suggestions.join(" | "));
                }
            }
            SessionCommand::Popular => {
                let popular = engine.popular_searches();
                if json {
                    println!("{}", serde_json::to_string(&popular)?);
                } else {
                    for entry in &popular {
                        println!("{:>4}  {}", entry.count, entry.text);
                    }
                }
            }
            SessionCommand::History => {
                let history = engine.history();
                if json {
                    println!("{}", serde_json::to_string(&history)?);
                } else {
                    for entry in &history {
                        println!("{}  {:?}  {}", entry.timestamp, entry.params.text, entry.result_count);
                    }
                }
            }
            SessionCommand::Quit => break,
        }
    }
    Ok(())
}

fn run_stats(cfg: &AppConfig, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let stats = store.statistics();
    if json {
        return print_json(&stats);
    }
    let date = |d: Option<chrono::NaiveDateTime>| navigator_core::models::format_timestamp(d).into_owned();
    println!("Total Files: {}", stats.total_files);
    println!("Departments: {}", stats.departments.join(", "));
    println!("File Types: {}", stats.file_types.join(", "));
    println!("Newest File: {}", date(stats.newest_file));
    println!("Oldest File: {}", date(stats.oldest_file));
    Ok(())
}

#[derive(Serialize)]
struct BackupRow {
    name: String,
    path: String,
    created: Option<chrono::NaiveDateTime>,
}

fn run_backups(cfg: &AppConfig, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let rows: Vec<BackupRow> = store
        .list_backups()?
        .into_iter()
        .map(|b| BackupRow {
            name: b.name,
            path: b.path.to_string_lossy().into_owned(),
            created: b.created,
        })
        .collect();
    if json {
        return print_json(&rows);
    }
    for row in &rows {
        println!("{}", row.name);
    }
    Ok(())
}

fn run_import(cfg: &AppConfig, file: &std::path::Path, json: bool) -> Result<()> {
    let store = open_store(cfg)?;
    let report = store
        .import_table(file)
        .with_context(|| format!("importing {}", file.display()))?;
    if json {
        return print_json(&report);
    }
    println!("imported {}, skipped {}", report.added.len(), report.skipped.len());
    Ok(())
}

async fn run_check_paths(cfg: &AppConfig, json: bool) -> Result<()> {
    let manager = PathManager::new(cfg.network_paths.clone());
    let checks = manager.verify_network_paths().await;
    let root = manager.resolve_root().await;
    if json {
        return print_json(&serde_json::json!({
            "paths": checks.iter().map(|(p, ok)| serde_json::json!({"path": p, "reachable": ok})).collect::<Vec<_>>(),
            "root": root,
            "protected": PathSafetyGate::from_config(cfg).protected_paths(),
        }));
    }
    for (path, ok) in &checks {
        println!("{:<12} {path}", if *ok { "reachable" } else { "unreachable" });
    }
    if root.network_available {
        info!(root = %root.path.display(), "network root in use");
    } else {
        println!("using fallback root {}", root.path.display());
    }
    Ok(())
}

async fn run_tree(cfg: &AppConfig, path: Option<PathBuf>, depth: usize) -> Result<()> {
    let manager = PathManager::new(cfg.network_paths.clone());
    let base = match path {
        Some(p) => p,
        None => manager.resolve_root().await.path,
    };
    println!("{}", base.display());
    for line in render::tree_lines(&manager.folder_tree(&base, Some(depth))) {
        println!("  {line}");
    }
    Ok(())
}

fn run_vocab(cfg: &AppConfig, field: Option<&str>, json: bool) -> Result<()> {
    let fields = [
        Field::Department,
        Field::Area,
        Field::DocumentType,
        Field::Source,
        Field::IssueStatus,
        Field::WorkStatus,
    ];
    let selected: Vec<Field> = match field {
        Some(name) => vec![name.parse::<Field>()?],
        None => fields.to_vec(),
    };
    let mut lists = std::collections::BTreeMap::new();
    for field in selected {
        let Some(values) = assign::vocabulary_for(&cfg.vocabularies, field) else {
            bail!("{field} has no value list");
        };
        lists.insert(field.name(), values);
    }
    if json {
        return print_json(&lists);
    }
    for (name, values) in lists {
        println!("{name}:");
        for value in values {
            println!("  {value}");
        }
    }
    Ok(())
}
