//! Section merge rules shared by `add` and `write`.
//!
//! Entries already in the destination keep their position; incoming entries
//! are appended in source order. An incoming entry is dropped when the
//! destination already holds one with the same label and normalized body, so
//! dedup works per entry (one note's section body), not per line. Empty
//! entries are never carried over.

use crate::notes::document::{Document, SectionEntry};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("section `{0}` does not exist in the target document")]
    UnknownSection(String),
}

/// Append `incoming` into section `name` of `dest`, returning how many
/// entries were new.
pub fn merge_entries<I>(dest: &mut Document, name: &str, incoming: I) -> Result<usize, MergeError>
where
    I: IntoIterator<Item = SectionEntry>,
{
    let section = dest
        .section_mut(name)
        .ok_or_else(|| MergeError::UnknownSection(name.to_string()))?;

    let mut added = 0usize;
    for entry in incoming {
        if entry.is_empty() || section.contains(&entry) {
            continue;
        }
        section.entries.push(entry);
        added += 1;
    }
    Ok(added)
}

/// Fold one section of a daily note into a month archive, labeling every
/// entry with the note's date.
pub fn archive_section(
    dest: &mut Document,
    note: &Document,
    name: &str,
    label: &str,
) -> Result<usize, MergeError> {
    let source = note
        .section(name)
        .ok_or_else(|| MergeError::UnknownSection(name.to_string()))?;
    let relabeled = source
        .entries
        .iter()
        .map(|entry| SectionEntry {
            label: Some(label.to_string()),
            body: entry.body.clone(),
        })
        .collect::<Vec<_>>();
    merge_entries(dest, name, relabeled)
}

/// Merge every section of `src` into `dest`.
pub fn merge_document(dest: &mut Document, src: &Document) -> Result<usize, MergeError> {
    let mut added = 0usize;
    for section in src.sections() {
        added += merge_entries(dest, &section.name, section.entries.iter().cloned())?;
    }
    Ok(added)
}
