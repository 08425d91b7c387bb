use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::commands::archive::list_note_files;
use crate::notes::config::load_config;
use crate::notes::paths::resolve_paths;

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

const ENV_PREFIX: &str = "NOTEFOLD_";

fn unknown_env_keys<I>(keys: I, prefix: &str, allowlist: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = keys
        .into_iter()
        .filter(|key| key.starts_with(prefix) && !allowlist.contains(&key.as_str()))
        .collect::<Vec<_>>();
    out.sort();
    out
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("home={}", paths.home.display()));
    report.detail(format!("notes_dir={}", paths.notes_dir.display()));
    report.detail(format!(
        "config_file={} (present={})",
        paths.config_file.display(),
        paths.config_file.is_file()
    ));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));

    let unknown = unknown_env_keys(env::vars().map(|(k, _)| k), ENV_PREFIX, ENV_ALLOWLIST);
    for key in unknown {
        report.issue(format!("unrecognized environment variable {key}"));
    }

    let config = match load_config(&paths) {
        Ok(config) => config,
        Err(err) => {
            report.issue(format!("config invalid: {err:#}"));
            return Ok(report);
        }
    };
    report.detail(format!("section.names={}", config.section.names.join(",")));
    report.detail(format!("file.ext={}", config.file.ext));
    report.detail(format!("file.time_format={}", config.file.time_format));
    report.detail(format!(
        "archive.month_time_format={}",
        config.archive.month_time_format
    ));
    report.detail(format!("archive.after_days={}", config.archive.after_days));

    if !paths.notes_dir.is_dir() {
        report.issue("missing notes dir (set NOTEFOLD_NOTES_DIR or NOTEFOLD_HOME)");
        return Ok(report);
    }
    let notes = list_note_files(&paths.notes_dir, &config.file)?;
    report.detail(format!("note_files={}", notes.len()));

    Ok(report)
}
