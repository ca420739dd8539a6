use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network_paths: NetworkPaths,
    pub metadata: MetadataConfig,
    pub safety: SafetyConfig,
    pub index: IndexConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
    /// Category name to lower-case extensions (with leading dot).
    pub file_types: BTreeMap<String, Vec<String>>,
    pub vocabularies: Vocabularies,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut file_types = BTreeMap::new();
        file_types.insert("drawing".to_string(), strings(&[".dwg", ".pdf", ".rvt"]));
        file_types.insert("document".to_string(), strings(&[".doc", ".docx", ".pdf"]));
        file_types.insert("spreadsheet".to_string(), strings(&[".xls", ".xlsx"]));
        Self {
            network_paths: NetworkPaths::default(),
            metadata: MetadataConfig::default(),
            safety: SafetyConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
            file_types,
            vocabularies: Vocabularies::default(),
        }
    }
}

impl AppConfig {
    /// Explicit protected prefixes, or the network shares when none are set.
    pub fn protected_paths(&self) -> Vec<String> {
        if !self.safety.protected_paths.is_empty() {
            return self.safety.protected_paths.clone();
        }
        [
            &self.network_paths.root,
            &self.network_paths.projects,
            &self.network_paths.templates,
        ]
        .into_iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect()
    }

    /// Categories whose extension list contains `ext` (matched case-insensitively).
    pub fn categories_for(&self, ext: &str) -> Vec<&str> {
        let ext = ext.to_lowercase();
        self.file_types
            .iter()
            .filter(|(_, exts)| exts.iter().any(|e| e.to_lowercase() == ext))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkPaths {
    pub root: String,
    pub projects: String,
    pub templates: String,
    /// Used in place of `root` when the share cannot be reached.
    pub fallback_root: Option<String>,
    pub connect_timeout_ms: u64,
}

impl Default for NetworkPaths {
    fn default() -> Self {
        Self {
            root: "P:/".to_string(),
            projects: "P:/Projects".to_string(),
            templates: "P:/Templates".to_string(),
            fallback_root: None,
            connect_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub path: String,
    pub backup_dir: String,
    pub max_backups: usize,
    /// Mutations within this many seconds of the latest backup reuse it. 0 disables.
    pub coalesce_window_secs: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            path: "local_metadata/metadata.csv".to_string(),
            backup_dir: "local_metadata/backups".to_string(),
            max_backups: 10,
            coalesce_window_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub protected_paths: Vec<String>,
    /// Defaults to the host convention (case-insensitive on Windows).
    pub case_insensitive: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub hash_mode: Option<String>,
    pub exclude: Vec<String>,
    pub include_hidden: bool,
    pub follow_links: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            hash_mode: None,
            exclude: Vec::new(),
            include_hidden: false,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub result_cache_size: usize,
    pub history_size: usize,
    pub max_suggestions: usize,
    pub min_suggestion_len: usize,
    pub popular_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_cache_size: 100,
            history_size: 50,
            max_suggestions: 10,
            min_suggestion_len: 2,
            popular_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// When set, logs are also written to a daily rolling file here.
    pub directory: Option<String>,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_name: "file_navigator.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabularies {
    pub departments: Vec<String>,
    pub areas: Vec<String>,
    pub document_types: Vec<String>,
    pub sources: Vec<String>,
    pub issue_statuses: Vec<String>,
    pub work_statuses: Vec<String>,
}

impl Default for Vocabularies {
    fn default() -> Self {
        Self {
            departments: strings(&[
                "Electrical",
                "Civil",
                "Facility Planning",
                "Piping",
                "Mechanical",
                "Automation",
                "Project Management",
            ]),
            areas: strings(&[
                "Furnace/Melting",
                "Lehr/Cooling",
                "Batch House",
                "Forming",
                "Cold End",
                "Quality Control Lab",
            ]),
            document_types: strings(&[
                "Plan View",
                "Single Line Diagram",
                "Elevation View",
                "Section View",
                "Equipment Layout",
            ]),
            sources: strings(&["Internal (CDMG)", "Vendor", "Client"]),
            issue_statuses: strings(&["For Review", "For Bid", "For Construction", "As-Built"]),
            work_statuses: strings(&["Not Started", "In Progress", "On Hold", "Complete"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("NAVIGATOR")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
