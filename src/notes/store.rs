use crate::notes::config::NoteConfig;
use crate::notes::document::Document;
use crate::notes::format::{parse_document, render_document};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;

/// Persistence used by the archiver. Every call addresses the document's
/// canonical path.
pub trait NoteStore {
    fn read(&self, doc: &mut Document) -> Result<()>;
    fn overwrite(&self, doc: &Document) -> Result<()>;
    fn exists(&self, doc: &Document) -> bool;
}

impl<T: NoteStore + ?Sized> NoteStore for &T {
    fn read(&self, doc: &mut Document) -> Result<()> {
        (**self).read(doc)
    }

    fn overwrite(&self, doc: &Document) -> Result<()> {
        (**self).overwrite(doc)
    }

    fn exists(&self, doc: &Document) -> bool {
        (**self).exists(doc)
    }
}

#[derive(Debug, Clone)]
pub struct FsNoteStore {
    config: NoteConfig,
}

impl FsNoteStore {
    pub fn new(config: NoteConfig) -> Self {
        Self { config }
    }
}

impl NoteStore for FsNoteStore {
    fn read(&self, doc: &mut Document) -> Result<()> {
        let path = doc.path().to_path_buf();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_document(&self.config, doc, &raw)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn overwrite(&self, doc: &Document) -> Result<()> {
        let path = doc.path();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => std::path::Path::new("."),
        };
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;

        // Stage next to the target so the rename never crosses devices.
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("failed to stage write in {}", parent.display()))?;
        staged
            .write_all(render_document(&self.config, doc).as_bytes())
            .with_context(|| format!("failed to write staged copy of {}", path.display()))?;
        staged
            .persist(path)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    fn exists(&self, doc: &Document) -> bool {
        doc.path().is_file()
    }
}
