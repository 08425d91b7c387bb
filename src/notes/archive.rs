use crate::error::ArchiveError;
use crate::notes::date::{is_archivable, month_key, parse_file_name};
use crate::notes::document::{Document, NoteLayout};
use crate::notes::merge::{archive_section, merge_document};
use crate::notes::store::NoteStore;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Archived {
        month_key: String,
        added_entries: usize,
    },
    TooRecent,
}

#[derive(Debug, Clone)]
pub struct WrittenArchive {
    pub month_key: String,
    pub path: PathBuf,
    pub merged_existing: bool,
}

/// Folds daily notes into one in-memory archive per month.
///
/// `reference` is the instant note ages are measured against. `add` only
/// mutates the month buckets; nothing touches storage until `write`.
pub struct Archiver<S> {
    layout: NoteLayout,
    store: S,
    reference: NaiveDateTime,
    months: BTreeMap<String, Document>,
}

impl<S: NoteStore> Archiver<S> {
    pub fn new(layout: NoteLayout, store: S, reference: NaiveDateTime) -> Self {
        Self {
            layout,
            store,
            reference,
            months: BTreeMap::new(),
        }
    }

    pub fn months(&self) -> &BTreeMap<String, Document> {
        &self.months
    }

    pub fn add(&mut self, file_name: &str) -> Result<AddOutcome, ArchiveError> {
        let config = self.layout.config();
        let file_date = parse_file_name(file_name, &config.file.time_format).map_err(|source| {
            ArchiveError::UnparsableFileName {
                file: file_name.to_string(),
                source,
            }
        })?;

        if !is_archivable(file_date, self.reference, config.archive.after_days) {
            tracing::debug!(file = file_name, "note is too recent to archive");
            return Ok(AddOutcome::TooRecent);
        }

        let mut note = self.layout.daily(file_date);
        self.store
            .read(&mut note)
            .map_err(|source| ArchiveError::UnreadableFile {
                file: file_name.to_string(),
                source,
            })?;

        let key = month_key(file_date, &config.archive.month_time_format);
        let label = self.layout.entry_label(file_date);
        let layout = &self.layout;
        let bucket = self
            .months
            .entry(key.clone())
            .or_insert_with(|| layout.month_archive(file_date));

        let mut added_entries = 0usize;
        for name in &layout.config().section.names {
            added_entries += archive_section(bucket, &note, name, &label).map_err(|source| {
                ArchiveError::MergeFailed {
                    file: file_name.to_string(),
                    source,
                }
            })?;
        }

        tracing::debug!(file = file_name, month = %key, added_entries, "note added to archive");
        Ok(AddOutcome::Archived {
            month_key: key,
            added_entries,
        })
    }

    /// True when everything `file_name` would contribute is already in its
    /// month archive on disk. Ignores the in-memory buckets.
    pub fn is_on_disk(&self, file_name: &str) -> Result<bool, ArchiveError> {
        let config = self.layout.config();
        let file_date = parse_file_name(file_name, &config.file.time_format).map_err(|source| {
            ArchiveError::UnparsableFileName {
                file: file_name.to_string(),
                source,
            }
        })?;

        let mut existing = self.layout.month_archive(file_date);
        if !self.store.exists(&existing) {
            return Ok(false);
        }
        let path = existing.path().to_path_buf();
        self.store
            .read(&mut existing)
            .map_err(|source| ArchiveError::ReadExisting {
                path: path.clone(),
                source,
            })?;

        let mut note = self.layout.daily(file_date);
        self.store
            .read(&mut note)
            .map_err(|source| ArchiveError::UnreadableFile {
                file: file_name.to_string(),
                source,
            })?;

        let label = self.layout.entry_label(file_date);
        let mut expected = self.layout.month_archive(file_date);
        for name in &config.section.names {
            archive_section(&mut expected, &note, name, &label).map_err(|source| {
                ArchiveError::MergeFailed {
                    file: file_name.to_string(),
                    source,
                }
            })?;
        }
        let missing = merge_document(&mut existing, &expected)
            .map_err(|source| ArchiveError::MergeExisting { path, source })?;
        Ok(missing == 0)
    }

    /// Persist every month bucket, merging each into the archive already on
    /// disk when there is one. Stops at the first failure; months written
    /// before it stay written.
    pub fn write(self) -> Result<Vec<WrittenArchive>, ArchiveError> {
        let mut written = Vec::with_capacity(self.months.len());

        for (key, bucket) in self.months {
            let path = bucket.path().to_path_buf();
            let merged_existing = self.store.exists(&bucket);

            let target = if merged_existing {
                let mut existing = self.layout.month_archive(bucket.date());
                self.store
                    .read(&mut existing)
                    .map_err(|source| ArchiveError::ReadExisting {
                        path: path.clone(),
                        source,
                    })?;
                merge_document(&mut existing, &bucket).map_err(|source| {
                    ArchiveError::MergeExisting {
                        path: path.clone(),
                        source,
                    }
                })?;
                existing
            } else {
                bucket
            };

            self.store
                .overwrite(&target)
                .map_err(|source| ArchiveError::WriteFailed {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(path = %path.display(), month = %key, "wrote archive file");

            written.push(WrittenArchive {
                month_key: key,
                path,
                merged_existing,
            });
        }

        Ok(written)
    }
}
