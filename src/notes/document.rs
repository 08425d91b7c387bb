use crate::notes::config::NoteConfig;
use crate::notes::date::{first_of_month, month_key};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Daily,
    MonthArchive,
}

/// One block of section content.
///
/// Daily notes carry a single unlabeled entry per section. Archive entries
/// are labeled with the rendered date of the note they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub label: Option<String>,
    pub body: String,
}

impl SectionEntry {
    pub fn new(label: Option<String>, body: &str) -> Self {
        Self {
            label,
            body: normalize_body(body),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Two entries are the same archived content when label and normalized
    /// body match.
    pub fn same_content(&self, other: &SectionEntry) -> bool {
        self.label == other.label && self.body == other.body
    }
}

/// Trim trailing whitespace on every line and drop blank lines at both ends.
pub fn normalize_body(raw: &str) -> String {
    let lines = raw.lines().map(str::trim_end).collect::<Vec<_>>();
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<SectionEntry>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn contains(&self, entry: &SectionEntry) -> bool {
        self.entries.iter().any(|e| e.same_content(entry))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    kind: DocumentKind,
    date: NaiveDate,
    path: PathBuf,
    sections: Vec<Section>,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    pub fn clear(&mut self) {
        for section in &mut self.sections {
            section.entries.clear();
        }
    }
}

/// Where documents live and how their names are derived.
#[derive(Debug, Clone)]
pub struct NoteLayout {
    dir: PathBuf,
    config: NoteConfig,
}

impl NoteLayout {
    pub fn new(dir: impl Into<PathBuf>, config: NoteConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    pub fn config(&self) -> &NoteConfig {
        &self.config
    }

    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        let stem = date.format(&self.config.file.time_format).to_string();
        self.dir.join(format!("{stem}.{}", self.config.file.ext))
    }

    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.config.archive.file_prefix,
            month_key(date, &self.config.archive.month_time_format),
            self.config.file.ext
        ))
    }

    pub fn daily(&self, date: NaiveDate) -> Document {
        Document {
            kind: DocumentKind::Daily,
            date,
            path: self.daily_path(date),
            sections: self.empty_sections(),
        }
    }

    pub fn month_archive(&self, date: NaiveDate) -> Document {
        let date = first_of_month(date);
        Document {
            kind: DocumentKind::MonthArchive,
            date,
            path: self.archive_path(date),
            sections: self.empty_sections(),
        }
    }

    pub fn entry_label(&self, date: NaiveDate) -> String {
        let archive = &self.config.archive;
        format!(
            "{}{}{}",
            archive.section_content_prefix,
            date.format(&archive.section_content_time_format),
            archive.section_content_suffix
        )
    }

    fn empty_sections(&self) -> Vec<Section> {
        self.config.section.names.iter().map(Section::new).collect()
    }
}
