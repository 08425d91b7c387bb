use crate::notes::paths::NotePaths;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub time_format: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            time_format: "[%a] %d %b %Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub names: Vec<String>,
    pub prefix: String,
    pub suffix: String,
    pub trailing_newlines: usize,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            names: vec!["TODO".to_string(), "DONE".to_string(), "NOTES".to_string()],
            prefix: "___".to_string(),
            suffix: "___".to_string(),
            trailing_newlines: 1,
        }
    }
}

impl SectionConfig {
    pub fn heading(&self, name: &str) -> String {
        format!("{}{}{}", self.prefix, name, self.suffix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub ext: String,
    pub time_format: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            ext: "txt".to_string(),
            time_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub after_days: u32,
    pub file_prefix: String,
    pub header_prefix: String,
    pub section_content_prefix: String,
    pub section_content_suffix: String,
    pub section_content_time_format: String,
    pub month_time_format: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            after_days: 14,
            file_prefix: "archive-".to_string(),
            header_prefix: "ARCHIVE ".to_string(),
            section_content_prefix: "[".to_string(),
            section_content_suffix: "]".to_string(),
            section_content_time_format: "%Y-%m-%d".to_string(),
            month_time_format: "%b%Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NoteConfig {
    pub header: HeaderConfig,
    pub section: SectionConfig,
    pub file: FileConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialNoteConfig {
    header: Option<HeaderConfig>,
    section: Option<SectionConfig>,
    file: Option<FileConfig>,
    archive: Option<ArchiveConfig>,
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_csv(var: &str, fallback: &[String]) -> Vec<String> {
    match env::var(var) {
        Ok(v) => {
            let out = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>();
            if out.is_empty() {
                fallback.to_vec()
            } else {
                out
            }
        }
        Err(_) => fallback.to_vec(),
    }
}

fn is_valid_time_format(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

pub fn validate(cfg: &NoteConfig) -> Result<()> {
    if cfg.section.names.is_empty() {
        return Err(anyhow!("invalid section names: at least one section is required"));
    }
    let mut seen = BTreeSet::new();
    for name in &cfg.section.names {
        if name.trim().is_empty() {
            return Err(anyhow!("invalid section names: names cannot be blank"));
        }
        if !seen.insert(name.as_str()) {
            return Err(anyhow!("invalid section names: `{name}` is listed twice"));
        }
    }
    if cfg.section.prefix.is_empty() && cfg.section.suffix.is_empty() {
        return Err(anyhow!(
            "invalid section markers: prefix and suffix cannot both be empty"
        ));
    }

    let ext = cfg.file.ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        return Err(anyhow!(
            "invalid file extension `{}`: use a bare extension such as `txt`",
            cfg.file.ext
        ));
    }

    for (label, format) in [
        ("header.time_format", &cfg.header.time_format),
        ("file.time_format", &cfg.file.time_format),
        (
            "archive.section_content_time_format",
            &cfg.archive.section_content_time_format,
        ),
        ("archive.month_time_format", &cfg.archive.month_time_format),
    ] {
        if !is_valid_time_format(format) {
            return Err(anyhow!("invalid {label}: `{format}` is not a strftime format"));
        }
    }

    // File names and archive entry labels are parsed back into dates.
    let probe = NaiveDate::from_ymd_opt(2021, 3, 24).ok_or_else(|| anyhow!("invalid probe date"))?;
    for (label, format) in [
        ("file.time_format", &cfg.file.time_format),
        (
            "archive.section_content_time_format",
            &cfg.archive.section_content_time_format,
        ),
    ] {
        let rendered = probe.format(format).to_string();
        match NaiveDate::parse_from_str(&rendered, format) {
            Ok(parsed) if parsed == probe => {}
            _ => {
                return Err(anyhow!(
                    "invalid {label}: `{format}` does not identify a single calendar day"
                ));
            }
        }
    }

    // Every day of a month shares one key; different months never do.
    let month = &cfg.archive.month_time_format;
    let key = |y: i32, m: u32, d: u32| -> Result<String> {
        let date =
            NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| anyhow!("invalid probe date"))?;
        Ok(date.format(month).to_string())
    };
    let march = key(2021, 3, 1)?;
    if key(2021, 3, 24)? != march || key(2021, 4, 1)? == march || key(2022, 3, 1)? == march {
        return Err(anyhow!(
            "invalid archive.month_time_format: `{month}` does not identify a single month"
        ));
    }

    for (label, prefix) in [
        ("section.prefix", &cfg.section.prefix),
        (
            "archive.section_content_prefix",
            &cfg.archive.section_content_prefix,
        ),
    ] {
        if prefix.starts_with('\\') {
            return Err(anyhow!("invalid {label}: `{prefix}` cannot start with a backslash"));
        }
    }

    Ok(())
}

fn merge_file_config(paths: &NotePaths, base: &mut NoteConfig) -> Result<()> {
    let path = &paths.config_file;
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| anyhow!("failed to read config {}: {err}", path.display()))?;
    let parsed: PartialNoteConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(header) = parsed.header {
        base.header = header;
    }
    if let Some(section) = parsed.section {
        base.section = section;
    }
    if let Some(file) = parsed.file {
        base.file = file;
    }
    if let Some(archive) = parsed.archive {
        base.archive = archive;
    }
    Ok(())
}

pub fn load_config(paths: &NotePaths) -> Result<NoteConfig> {
    let mut cfg = NoteConfig::default();
    merge_file_config(paths, &mut cfg)?;

    cfg.archive.after_days = env_or_u32("NOTEFOLD_ARCHIVE_AFTER_DAYS", cfg.archive.after_days);
    cfg.archive.month_time_format =
        env_or_string("NOTEFOLD_MONTH_TIME_FORMAT", &cfg.archive.month_time_format);
    cfg.section.names = env_or_csv("NOTEFOLD_SECTION_NAMES", &cfg.section.names);
    cfg.file.ext = env_or_string("NOTEFOLD_FILE_EXT", &cfg.file.ext);
    cfg.file.time_format = env_or_string("NOTEFOLD_FILE_TIME_FORMAT", &cfg.file.time_format);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::{NoteConfig, PartialNoteConfig, validate};

    #[test]
    fn defaults_are_valid() {
        validate(&NoteConfig::default()).expect("defaults validate");
    }

    #[test]
    fn rejects_duplicate_section_names() {
        let mut cfg = NoteConfig::default();
        cfg.section.names = vec!["TODO".to_string(), "TODO".to_string()];
        let err = validate(&cfg).expect_err("duplicate names");
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn rejects_dotted_extension() {
        let mut cfg = NoteConfig::default();
        cfg.file.ext = ".md".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_file_format_without_day() {
        let mut cfg = NoteConfig::default();
        cfg.file.time_format = "%Y-%m".to_string();
        let err = validate(&cfg).expect_err("month-only file format");
        assert!(err.to_string().contains("file.time_format"));
    }

    #[test]
    fn rejects_broken_strftime() {
        let mut cfg = NoteConfig::default();
        cfg.archive.month_time_format = "%Q%".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_month_format_without_month() {
        for format in ["%Y", "%m", "%b", "%Y-%m-%d"] {
            let mut cfg = NoteConfig::default();
            cfg.archive.month_time_format = format.to_string();
            let err = validate(&cfg).expect_err(format);
            assert!(err.to_string().contains("archive.month_time_format"));
        }

        let mut cfg = NoteConfig::default();
        cfg.archive.month_time_format = "%Y-%m".to_string();
        validate(&cfg).expect("year and month");
    }

    #[test]
    fn rejects_backslash_markers() {
        let mut cfg = NoteConfig::default();
        cfg.archive.section_content_prefix = "\\[".to_string();
        let err = validate(&cfg).expect_err("backslash prefix");
        assert!(err.to_string().contains("backslash"));
    }

    #[test]
    fn partial_tables_keep_field_defaults() {
        let parsed: PartialNoteConfig = toml::from_str(
            r#"
[archive]
after_days = 3
month_time_format = "%Y-%m"
"#,
        )
        .expect("parse toml");
        let archive = parsed.archive.expect("archive table");
        assert_eq!(archive.after_days, 3);
        assert_eq!(archive.month_time_format, "%Y-%m");
        assert_eq!(archive.file_prefix, "archive-");
        assert!(parsed.section.is_none());
    }
}
