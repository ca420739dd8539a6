//! `field=value` edits applied to a record, plus vocabulary checks.

use navigator_core::config::Vocabularies;
use navigator_core::models::{Field, MetadataRecord};
use navigator_core::StoreError;

/// Splits `field=value`; the value may itself contain `=`.
pub fn parse_assignment(arg: &str) -> Result<(Field, String), StoreError> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| StoreError::UnknownField(arg.to_string()))?;
    let field: Field = name.trim().parse()?;
    Ok((field, value.to_string()))
}

/// Applies every assignment, refusing edits to file facts.
pub fn apply_assignments(record: &mut MetadataRecord, args: &[String]) -> Result<Vec<Field>, StoreError> {
    let mut changed = Vec::with_capacity(args.len());
    for arg in args {
        let (field, value) = parse_assignment(arg)?;
        if field.is_file_fact() {
            return Err(StoreError::InvalidValue {
                field: field.name().to_string(),
                value,
            });
        }
        record.set(field, &value)?;
        changed.push(field);
    }
    Ok(changed)
}

/// The configured vocabulary for a field, if it has one.
pub fn vocabulary_for(vocab: &Vocabularies, field: Field) -> Option<&[String]> {
    let list = match field {
        Field::Department => &vocab.departments,
        Field::Area => &vocab.areas,
        Field::DocumentType => &vocab.document_types,
        Field::Source => &vocab.sources,
        Field::IssueStatus => &vocab.issue_statuses,
        Field::WorkStatus => &vocab.work_statuses,
        _ => return None,
    };
    Some(list.as_slice())
}

/// Fields whose value is set but missing from the field's vocabulary.
pub fn off_vocabulary(vocab: &Vocabularies, record: &MetadataRecord, fields: &[Field]) -> Vec<(Field, String)> {
    fields
        .iter()
        .filter_map(|&field| {
            let list = vocabulary_for(vocab, field)?;
            let value = record.value(field);
            if value.is_empty() || list.iter().any(|v| v == value.as_ref()) {
                None
            } else {
                Some((field, value.into_owned()))
            }
        })
        .collect()
}
