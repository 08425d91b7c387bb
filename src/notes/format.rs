use crate::notes::config::NoteConfig;
use crate::notes::date::month_key;
use crate::notes::document::{Document, DocumentKind, SectionEntry};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Marks an archive body line that would otherwise read back as a heading or
/// an entry label.
const ESCAPE: char = '\\';

pub fn render_header(config: &NoteConfig, doc: &Document) -> String {
    match doc.kind() {
        DocumentKind::Daily => doc.date().format(&config.header.time_format).to_string(),
        DocumentKind::MonthArchive => format!(
            "{}{}",
            config.archive.header_prefix,
            month_key(doc.date(), &config.archive.month_time_format)
        ),
    }
}

pub fn render_document(config: &NoteConfig, doc: &Document) -> String {
    let mut out = String::new();
    out.push_str(&render_header(config, doc));
    out.push_str("\n\n");

    for section in doc.sections() {
        out.push_str(&config.section.heading(&section.name));
        out.push('\n');
        for entry in &section.entries {
            if let Some(label) = &entry.label {
                out.push_str(label);
                out.push('\n');
            }
            for line in entry.body.lines() {
                if doc.kind() == DocumentKind::MonthArchive && is_structural(config, line) {
                    out.push(ESCAPE);
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        for _ in 0..config.section.trailing_newlines {
            out.push('\n');
        }
    }

    out
}

fn parse_entry_label(config: &NoteConfig, line: &str) -> Option<String> {
    let archive = &config.archive;
    let inner = line
        .strip_prefix(archive.section_content_prefix.as_str())?
        .strip_suffix(archive.section_content_suffix.as_str())?;
    NaiveDate::parse_from_str(inner, &archive.section_content_time_format).ok()?;
    Some(line.to_string())
}

fn is_heading(config: &NoteConfig, line: &str) -> bool {
    config
        .section
        .names
        .iter()
        .any(|name| config.section.heading(name) == line)
}

/// A line that, with any leading escapes removed, reads as structure.
fn is_structural(config: &NoteConfig, line: &str) -> bool {
    let core = line.trim_end().trim_start_matches(ESCAPE);
    is_heading(config, core) || parse_entry_label(config, core).is_some()
}

fn unescape<'a>(config: &NoteConfig, line: &'a str) -> &'a str {
    match line.strip_prefix(ESCAPE) {
        Some(rest) if is_structural(config, rest) => rest,
        _ => line,
    }
}

fn split_entries(config: &NoteConfig, kind: DocumentKind, lines: &[&str]) -> Vec<SectionEntry> {
    if kind == DocumentKind::Daily {
        return vec![SectionEntry::new(None, &lines.join("\n"))];
    }

    let mut out = Vec::new();
    let mut label: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();
    for line in lines {
        if let Some(next) = parse_entry_label(config, line.trim_end()) {
            if label.is_some() || !body.is_empty() {
                out.push(SectionEntry::new(label.take(), &body.join("\n")));
                body.clear();
            }
            label = Some(next);
            continue;
        }
        body.push(unescape(config, line));
    }
    if label.is_some() || !body.is_empty() {
        out.push(SectionEntry::new(label, &body.join("\n")));
    }
    out
}

/// Replace the sections of `doc` with the content parsed from `raw`.
pub fn parse_document(config: &NoteConfig, doc: &mut Document, raw: &str) -> Result<()> {
    doc.clear();

    let mut header_seen = false;
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut current: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut parsed: Vec<(String, Vec<SectionEntry>)> = Vec::new();

    for (idx, line) in raw.lines().enumerate() {
        let trimmed = line.trim_end();
        let heading = config
            .section
            .names
            .iter()
            .find(|name| config.section.heading(name) == trimmed);

        if let Some(name) = heading {
            if let Some(open) = current.take() {
                parsed.push((open, split_entries(config, doc.kind(), &body)));
                body.clear();
            }
            if !seen.insert(name.clone()) {
                bail!("line {}: section `{name}` appears more than once", idx + 1);
            }
            current = Some(name.clone());
            continue;
        }

        if current.is_some() {
            body.push(line);
            continue;
        }
        if trimmed.trim().is_empty() {
            continue;
        }
        if header_seen {
            bail!("line {}: text outside of any section", idx + 1);
        }
        header_seen = true;
    }
    if let Some(open) = current.take() {
        parsed.push((open, split_entries(config, doc.kind(), &body)));
    }

    if seen.is_empty() {
        bail!("no configured sections found");
    }

    for (name, entries) in parsed {
        if let Some(section) = doc.section_mut(&name) {
            section
                .entries
                .extend(entries.into_iter().filter(|e| !e.is_empty()));
        }
    }
    Ok(())
}
