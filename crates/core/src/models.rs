//! Metadata record model and field catalogue.
//!
//! Text columns use the empty string for "unset"; typed columns (`file_size`,
//! timestamps) use `Option`.

use crate::checksum::HashMode;
use crate::error::{Result, StoreError};
use chrono::{DateTime, Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Index of a record in the store's arena.
pub type RecordId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FilePath,
    FileName,
    FileLocation,
    FileExtension,
    FileSize,
    DateAdded,
    LastModified,
    Checksum,
    ProjectNumber,
    Department,
    Area,
    #[serde(rename = "type")]
    DocumentType,
    Source,
    Revision,
    IssueStatus,
    WorkStatus,
    Scale,
    PaperSize,
    ApplicableCodes,
    EquipmentTags,
    RelatedDocuments,
    Priority,
    Milestone,
    ContractPhase,
    BudgetCode,
    DeliverableId,
    ApprovedBy,
    Comments,
}

impl Field {
    /// Header order of the persisted file.
    pub const ALL: [Field; 28] = [
        Field::FilePath,
        Field::FileName,
        Field::FileLocation,
        Field::FileExtension,
        Field::FileSize,
        Field::DateAdded,
        Field::LastModified,
        Field::Checksum,
        Field::ProjectNumber,
        Field::Department,
        Field::Area,
        Field::DocumentType,
        Field::Source,
        Field::Revision,
        Field::IssueStatus,
        Field::WorkStatus,
        Field::Scale,
        Field::PaperSize,
        Field::ApplicableCodes,
        Field::EquipmentTags,
        Field::RelatedDocuments,
        Field::Priority,
        Field::Milestone,
        Field::ContractPhase,
        Field::BudgetCode,
        Field::DeliverableId,
        Field::ApprovedBy,
        Field::Comments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::FilePath => "file_path",
            Field::FileName => "file_name",
            Field::FileLocation => "file_location",
            Field::FileExtension => "file_extension",
            Field::FileSize => "file_size",
            Field::DateAdded => "date_added",
            Field::LastModified => "last_modified",
            Field::Checksum => "checksum",
            Field::ProjectNumber => "project_number",
            Field::Department => "department",
            Field::Area => "area",
            Field::DocumentType => "type",
            Field::Source => "source",
            Field::Revision => "revision",
            Field::IssueStatus => "issue_status",
            Field::WorkStatus => "work_status",
            Field::Scale => "scale",
            Field::PaperSize => "paper_size",
            Field::ApplicableCodes => "applicable_codes",
            Field::EquipmentTags => "equipment_tags",
            Field::RelatedDocuments => "related_documents",
            Field::Priority => "priority",
            Field::Milestone => "milestone",
            Field::ContractPhase => "contract_phase",
            Field::BudgetCode => "budget_code",
            Field::DeliverableId => "deliverable_id",
            Field::ApprovedBy => "approved_by",
            Field::Comments => "comments",
        }
    }

    /// Columns searched by free text. Size and timestamps are not text.
    pub fn is_textual(&self) -> bool {
        !matches!(self, Field::FileSize | Field::DateAdded | Field::LastModified)
    }

    /// Captured from the filesystem; editors show these read-only.
    pub fn is_file_fact(&self) -> bool {
        matches!(
            self,
            Field::FilePath
                | Field::FileName
                | Field::FileLocation
                | Field::FileExtension
                | Field::FileSize
                | Field::DateAdded
                | Field::LastModified
                | Field::Checksum
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.name() == key || (*f == Field::DocumentType && key == "document_type"))
            .ok_or_else(|| StoreError::UnknownField(key.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataRecord {
    pub file_path: String,
    pub file_name: String,
    pub file_location: String,
    pub file_extension: String,
    pub file_size: Option<u64>,
    pub date_added: Option<NaiveDateTime>,
    pub last_modified: Option<NaiveDateTime>,
    pub checksum: String,

    pub project_number: String,
    pub department: String,
    pub area: String,

    #[serde(rename = "type")]
    pub document_type: String,
    pub source: String,
    pub revision: String,
    pub issue_status: String,
    pub work_status: String,
    pub scale: String,
    pub paper_size: String,

    pub applicable_codes: String,
    pub equipment_tags: String,
    pub related_documents: String,
    pub priority: String,
    pub milestone: String,
    pub contract_phase: String,
    pub budget_code: String,
    pub deliverable_id: String,
    pub approved_by: String,
    pub comments: String,

    /// Columns found in the persisted file that are not part of the schema.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MetadataRecord {
    /// A record carrying only what can be derived from the path string.
    pub fn placeholder(file_path: &str) -> Self {
        let path = Path::new(file_path);
        Self {
            file_path: file_path.to_string(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_location: path
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_extension: extension_of(path),
            ..Self::default()
        }
    }

    /// Default record for a file on disk: file facts filled, everything else empty.
    pub fn from_file(file_path: &str, hash_mode: HashMode) -> std::io::Result<Self> {
        let path = Path::new(file_path);
        let meta = fs::metadata(path)?;
        let last_modified = meta
            .modified()
            .ok()
            .map(|t| DateTime::<Local>::from(t).naive_local().trunc_subsecs(0));
        let checksum = if meta.is_file() {
            hash_mode.digest(path)?.unwrap_or_default()
        } else {
            String::new()
        };
        Ok(Self {
            file_size: Some(meta.len()),
            date_added: Some(now()),
            last_modified,
            checksum,
            ..Self::placeholder(file_path)
        })
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FileSize | Field::DateAdded | Field::LastModified => return None,
            Field::FilePath => &self.file_path,
            Field::FileName => &self.file_name,
            Field::FileLocation => &self.file_location,
            Field::FileExtension => &self.file_extension,
            Field::Checksum => &self.checksum,
            Field::ProjectNumber => &self.project_number,
            Field::Department => &self.department,
            Field::Area => &self.area,
            Field::DocumentType => &self.document_type,
            Field::Source => &self.source,
            Field::Revision => &self.revision,
            Field::IssueStatus => &self.issue_status,
            Field::WorkStatus => &self.work_status,
            Field::Scale => &self.scale,
            Field::PaperSize => &self.paper_size,
            Field::ApplicableCodes => &self.applicable_codes,
            Field::EquipmentTags => &self.equipment_tags,
            Field::RelatedDocuments => &self.related_documents,
            Field::Priority => &self.priority,
            Field::Milestone => &self.milestone,
            Field::ContractPhase => &self.contract_phase,
            Field::BudgetCode => &self.budget_code,
            Field::DeliverableId => &self.deliverable_id,
            Field::ApprovedBy => &self.approved_by,
            Field::Comments => &self.comments,
        };
        Some(value.as_str())
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let value = match field {
            Field::FileSize | Field::DateAdded | Field::LastModified => return None,
            Field::FilePath => &mut self.file_path,
            Field::FileName => &mut self.file_name,
            Field::FileLocation => &mut self.file_location,
            Field::FileExtension => &mut self.file_extension,
            Field::Checksum => &mut self.checksum,
            Field::ProjectNumber => &mut self.project_number,
            Field::Department => &mut self.department,
            Field::Area => &mut self.area,
            Field::DocumentType => &mut self.document_type,
            Field::Source => &mut self.source,
            Field::Revision => &mut self.revision,
            Field::IssueStatus => &mut self.issue_status,
            Field::WorkStatus => &mut self.work_status,
            Field::Scale => &mut self.scale,
            Field::PaperSize => &mut self.paper_size,
            Field::ApplicableCodes => &mut self.applicable_codes,
            Field::EquipmentTags => &mut self.equipment_tags,
            Field::RelatedDocuments => &mut self.related_documents,
            Field::Priority => &mut self.priority,
            Field::Milestone => &mut self.milestone,
            Field::ContractPhase => &mut self.contract_phase,
            Field::BudgetCode => &mut self.budget_code,
            Field::DeliverableId => &mut self.deliverable_id,
            Field::ApprovedBy => &mut self.approved_by,
            Field::Comments => &mut self.comments,
        };
        Some(value)
    }

    /// Cell text as persisted; empty when unset.
    pub fn value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::FileSize => self
                .file_size
                .map(|s| Cow::Owned(s.to_string()))
                .unwrap_or(Cow::Borrowed("")),
            Field::DateAdded => format_timestamp(self.date_added),
            Field::LastModified => format_timestamp(self.last_modified),
            other => Cow::Borrowed(self.text(other).unwrap_or("")),
        }
    }

    /// Parses `value` into `field`. Empty input unsets typed fields.
    pub fn set(&mut self, field: Field, value: &str) -> Result<()> {
        let invalid = || StoreError::InvalidValue {
            field: field.name().to_string(),
            value: value.to_string(),
        };
        let trimmed = value.trim();
        match field {
            Field::FileSize => {
                self.file_size = if trimmed.is_empty() {
                    None
                } else {
                    Some(parse_size(trimmed).ok_or_else(invalid)?)
                };
            }
            Field::DateAdded => {
                self.date_added = parse_optional_timestamp(trimmed).map_err(|_| invalid())?;
            }
            Field::LastModified => {
                self.last_modified = parse_optional_timestamp(trimmed).map_err(|_| invalid())?;
            }
            other => {
                if let Some(slot) = self.text_mut(other) {
                    *slot = value.to_string();
                }
            }
        }
        Ok(())
    }

    /// Ordering used by sorted search results. Unset values sort first.
    pub fn compare(&self, other: &Self, field: Field) -> Ordering {
        match field {
            Field::FileSize => self.file_size.cmp(&other.file_size),
            Field::DateAdded => self.date_added.cmp(&other.date_added),
            Field::LastModified => self.last_modified.cmp(&other.last_modified),
            text => self.text(text).cmp(&other.text(text)),
        }
    }

    /// Text cells for free-text matching: textual schema columns then extras.
    pub fn text_values(&self) -> impl Iterator<Item = &str> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |f| self.text(f))
            .chain(self.extra.values().map(String::as_str))
    }
}

/// Lower-cased extension with its leading dot, or empty.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Current local time at second precision, the resolution of the persisted file.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

pub fn format_timestamp(ts: Option<NaiveDateTime>) -> Cow<'static, str> {
    match ts {
        Some(t) => Cow::Owned(t.format(TIMESTAMP_FORMAT).to_string()),
        None => Cow::Borrowed(""),
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_optional_timestamp(value: &str) -> std::result::Result<Option<NaiveDateTime>, ()> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_timestamp(value).map(Some).ok_or(())
}

/// Spreadsheets sometimes hand integers back as `2048.0`.
fn parse_size(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// Human-readable type for an extension, as shown next to the file facts.
pub fn describe_extension(ext: &str) -> String {
    let ext = ext.to_lowercase();
    let known = match ext.as_str() {
        ".dwg" => "AutoCAD Drawing",
        ".pdf" => "PDF Document",
        ".doc" | ".docx" => "Word Document",
        ".xls" | ".xlsx" => "Excel Spreadsheet",
        ".rvt" => "Revit File",
        ".txt" => "Text File",
        ".csv" => "CSV File",
        ".zip" => "Compressed Archive",
        "" => return "Unknown".to_string(),
        _ => "",
    };
    if known.is_empty() {
        format!("{} File", ext.trim_start_matches('.').to_uppercase())
    } else {
        known.to_string()
    }
}

/// A search criterion value: one string or a set of accepted strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::One(v) => v.is_empty(),
            FilterValue::Many(vs) => vs.is_empty(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::One(value.to_string())
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::Many(values.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}
