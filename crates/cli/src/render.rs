//! Plain-text rendering for terminal output.

use navigator_core::models::{describe_extension, Field, MetadataRecord};
use navigator_core::paths::FolderTree;

pub fn format_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return String::new();
    };
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// One `label: value` line per non-empty field, file facts first.
pub fn record_lines(record: &MetadataRecord) -> Vec<String> {
    let mut lines = Vec::new();
    for field in Field::ALL {
        let value = match field {
            Field::FileSize => format_size(record.file_size),
            Field::FileExtension if !record.file_extension.is_empty() => format!(
                "{} ({})",
                record.file_extension,
                describe_extension(&record.file_extension)
            ),
            other => record.value(other).into_owned(),
        };
        if !value.is_empty() {
            lines.push(format!("{:<18} {}", format!("{}:", field.name()), value));
        }
    }
    for (name, value) in &record.extra {
        if !value.is_empty() {
            lines.push(format!("{:<18} {}", format!("{name}:"), value));
        }
    }
    lines
}

/// Compact one-line summary used in result lists.
pub fn record_row(record: &MetadataRecord) -> String {
    let tags: Vec<&str> = [&record.project_number, &record.department, &record.document_type]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if tags.is_empty() {
        record.file_path.clone()
    } else {
        format!("{}  [{}]", record.file_path, tags.join(" | "))
    }
}

pub fn tree_lines(tree: &FolderTree) -> Vec<String> {
    fn walk(tree: &FolderTree, depth: usize, out: &mut Vec<String>) {
        for (name, node) in tree {
            out.push(format!("{}{}/", "  ".repeat(depth), name));
            walk(&node.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(tree, 0, &mut out);
    out
}
