use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::Path;

use crate::commands::CommandReport;
use crate::notes::archive::{AddOutcome, Archiver};
use crate::notes::audit;
use crate::notes::config::{FileConfig, NoteConfig, load_config};
use crate::notes::date::is_note_file_name;
use crate::notes::document::NoteLayout;
use crate::notes::paths::{NotePaths, resolve_paths};
use crate::notes::store::{FsNoteStore, NoteStore};

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub delete: bool,
    pub no_write: bool,
}

/// Note files in `dir`, sorted by name so same-month notes accumulate in
/// date order for date-like file formats.
pub fn list_note_files(dir: &Path, file: &FileConfig) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            continue;
        };
        if is_note_file_name(&name, file) {
            out.push(name);
        }
    }
    out.sort();
    Ok(out)
}

fn record_audit(paths: &NotePaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = audit::append_event(paths, phase, status, message) {
        tracing::warn!(error = %format!("{err:#}"), "failed to append audit event");
    }
}

/// Without a write, a note may only go once its month archive on disk
/// already holds all of its content.
fn already_archived<S: NoteStore>(
    archiver: &Archiver<S>,
    archived: &[String],
    report: &mut CommandReport,
) -> Vec<String> {
    let mut out = Vec::new();
    for name in archived {
        match archiver.is_on_disk(name) {
            Ok(true) => out.push(name.clone()),
            Ok(false) => {
                tracing::warn!(file = %name, "not in an archive on disk yet, keeping");
                report.detail(format!("kept [{name}]: not in an archive on disk yet"));
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                tracing::warn!(file = %name, error = %format!("{err:#}"), "keeping note");
                report.detail(format!("kept [{name}]: {err:#}"));
            }
        }
    }
    out
}

pub fn run(opts: &ArchiveOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    run_with(&paths, config, opts, Local::now().naive_local())
}

pub fn run_with(
    paths: &NotePaths,
    config: NoteConfig,
    opts: &ArchiveOptions,
    reference: NaiveDateTime,
) -> Result<CommandReport> {
    let mut report = CommandReport::new("archive");
    report.detail(format!("notes_dir={}", paths.notes_dir.display()));
    report.detail(format!("archive.after_days={}", config.archive.after_days));

    if !paths.notes_dir.is_dir() {
        report.issue("notes dir does not exist");
        return Ok(report);
    }

    let candidates = list_note_files(&paths.notes_dir, &config.file)?;
    let layout = NoteLayout::new(&paths.notes_dir, config.clone());
    let mut archiver = Archiver::new(layout, FsNoteStore::new(config), reference);

    let mut archived = Vec::new();
    let mut too_recent = 0usize;
    let mut skipped = 0usize;
    for name in &candidates {
        match archiver.add(name) {
            Ok(AddOutcome::Archived {
                month_key,
                added_entries,
            }) => {
                report.detail(format!(
                    "added [{name}] to {month_key} new_entries={added_entries}"
                ));
                archived.push(name.clone());
            }
            Ok(AddOutcome::TooRecent) => too_recent += 1,
            Err(err) if !err.is_per_file() => return Err(err.into()),
            Err(err) => {
                let err = anyhow::Error::from(err);
                tracing::warn!(
                    file = %name,
                    error = %format!("{err:#}"),
                    "skipping unarchivable file"
                );
                report.detail(format!("skipped unarchivable file [{name}]: {err:#}"));
                skipped += 1;
            }
        }
    }
    report.detail(format!("candidates={}", candidates.len()));
    report.detail(format!("archived={}", archived.len()));
    report.detail(format!("too_recent={too_recent}"));
    report.detail(format!("skipped={skipped}"));

    let deletable = if opts.no_write {
        report.detail("write skipped (--no-write)");
        if opts.delete {
            already_archived(&archiver, &archived, &mut report)
        } else {
            Vec::new()
        }
    } else {
        let written = archiver.write()?;
        for archive in &written {
            let path = archive.path.display().to_string();
            report.detail(format!("archive.path={path}"));
            record_audit(
                paths,
                "archive",
                "ok",
                &format!(
                    "wrote {path} month={} merged_existing={}",
                    archive.month_key, archive.merged_existing
                ),
            );
        }
        archived
    };

    if !opts.delete {
        return Ok(report);
    }

    let mut deleted = 0usize;
    for name in &deletable {
        let path = paths.notes_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                deleted += 1;
                record_audit(paths, "delete", "ok", &format!("removed {}", path.display()));
            }
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "unable to remove file");
                report.detail(format!("unable to remove file [{name}]: {err}"));
                record_audit(
                    paths,
                    "delete",
                    "failed",
                    &format!("could not remove {}: {err}", path.display()),
                );
            }
        }
    }
    report.detail(format!("deleted={deleted}"));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{ArchiveOptions, list_note_files, run_with};
    use crate::notes::config::NoteConfig;
    use crate::notes::paths::NotePaths;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn paths_in(root: &Path) -> NotePaths {
        NotePaths {
            home: root.to_path_buf(),
            notes_dir: root.join("notes"),
            config_file: root.join("config.toml"),
            logs_dir: root.join("logs"),
        }
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 10)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("reference")
    }

    fn config() -> NoteConfig {
        let mut cfg = NoteConfig::default();
        cfg.archive.after_days = 3;
        cfg
    }

    fn write_note(dir: &Path, name: &str, notes: &str) {
        let text = format!("header\n\n___TODO___\n\n___DONE___\n\n___NOTES___\n{notes}\n\n");
        fs::write(dir.join(name), text).expect("write note");
    }

    #[test]
    fn lists_only_note_files_in_name_order() {
        let tmp = tempdir().expect("tempdir");
        let dir = tmp.path();
        fs::write(dir.join("2024-04-06.txt"), "").expect("write");
        fs::write(dir.join("2024-04-05.txt"), "").expect("write");
        fs::write(dir.join("archive-Mar2024.txt"), "").expect("write");
        fs::write(dir.join("2024-04-04.md"), "").expect("write");
        fs::create_dir(dir.join("2024-04-01.txt")).expect("mkdir");

        let names = list_note_files(dir, &config().file).expect("list");
        assert_eq!(names, vec!["2024-04-05.txt", "2024-04-06.txt"]);
    }

    #[test]
    fn archives_old_notes_and_deletes_only_archived_ones() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.notes_dir).expect("mkdir");
        write_note(&paths.notes_dir, "2024-04-05.txt", "fifth");
        write_note(&paths.notes_dir, "2024-04-06.txt", "sixth");
        write_note(&paths.notes_dir, "2024-04-09.txt", "ninth");
        fs::write(paths.notes_dir.join("2024-04-04.txt"), "not a note\nat all\n").expect("write");

        let opts = ArchiveOptions {
            delete: true,
            no_write: false,
        };
        let report = run_with(&paths, config(), &opts, reference()).expect("run");
        assert!(report.ok);
        assert!(report.details.iter().any(|d| d == "archived=2"));
        assert!(report.details.iter().any(|d| d == "skipped=1"));
        assert!(
            report
                .details
                .iter()
                .any(|d| d.starts_with("skipped unarchivable file [2024-04-04.txt]"))
        );

        let archive = fs::read_to_string(paths.notes_dir.join("archive-Apr2024.txt"))
            .expect("archive written");
        assert!(archive.contains("[2024-04-05]\nfifth\n[2024-04-06]\nsixth\n"));
        assert!(!archive.contains("ninth"));

        assert!(!paths.notes_dir.join("2024-04-05.txt").exists());
        assert!(!paths.notes_dir.join("2024-04-06.txt").exists());
        assert!(paths.notes_dir.join("2024-04-09.txt").exists());
        assert!(paths.notes_dir.join("2024-04-04.txt").exists());

        let audit = fs::read_to_string(paths.logs_dir.join("audit.log")).expect("audit log");
        assert!(audit.contains("\"phase\":\"archive\""));
        assert!(audit.contains("\"phase\":\"delete\""));
    }

    #[test]
    fn no_write_leaves_the_directory_untouched() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.notes_dir).expect("mkdir");
        write_note(&paths.notes_dir, "2024-04-05.txt", "fifth");

        let opts = ArchiveOptions {
            delete: false,
            no_write: true,
        };
        let report = run_with(&paths, config(), &opts, reference()).expect("run");
        assert!(report.ok);
        assert!(!paths.notes_dir.join("archive-Apr2024.txt").exists());
        assert!(paths.notes_dir.join("2024-04-05.txt").exists());
    }

    #[test]
    fn delete_without_write_keeps_notes_missing_from_archives() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.notes_dir).expect("mkdir");
        write_note(&paths.notes_dir, "2024-04-05.txt", "fifth");

        let opts = ArchiveOptions {
            delete: true,
            no_write: true,
        };
        let report = run_with(&paths, config(), &opts, reference()).expect("run");
        assert!(report.ok);
        assert!(report.details.iter().any(|d| d == "deleted=0"));
        assert!(
            report
                .details
                .iter()
                .any(|d| d.starts_with("kept [2024-04-05.txt]"))
        );
        assert!(paths.notes_dir.join("2024-04-05.txt").exists());
        assert!(!paths.notes_dir.join("archive-Apr2024.txt").exists());
    }

    #[test]
    fn delete_without_write_removes_notes_already_archived() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.notes_dir).expect("mkdir");
        write_note(&paths.notes_dir, "2024-04-05.txt", "fifth");
        write_note(&paths.notes_dir, "2024-04-06.txt", "sixth");
        run_with(&paths, config(), &ArchiveOptions::default(), reference()).expect("archive");
        write_note(&paths.notes_dir, "2024-04-06.txt", "sixth, edited later");

        let opts = ArchiveOptions {
            delete: true,
            no_write: true,
        };
        let report = run_with(&paths, config(), &opts, reference()).expect("run");
        assert!(report.details.iter().any(|d| d == "deleted=1"));
        assert!(!paths.notes_dir.join("2024-04-05.txt").exists());
        assert!(paths.notes_dir.join("2024-04-06.txt").exists());
    }

    #[test]
    fn second_run_leaves_archive_unchanged() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.notes_dir).expect("mkdir");
        write_note(&paths.notes_dir, "2024-04-05.txt", "fifth");
        let archive_path = paths.notes_dir.join("archive-Apr2024.txt");

        let opts = ArchiveOptions::default();
        run_with(&paths, config(), &opts, reference()).expect("first run");
        let first = fs::read_to_string(&archive_path).expect("archive");
        run_with(&paths, config(), &opts, reference()).expect("second run");
        let second = fs::read_to_string(&archive_path).expect("archive");

        assert_eq!(first, second);
        assert_eq!(second.matches("fifth").count(), 1);
    }

    #[test]
    fn missing_notes_dir_is_an_issue() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_in(tmp.path());
        let report =
            run_with(&paths, config(), &ArchiveOptions::default(), reference()).expect("run");
        assert!(!report.ok);
        assert_eq!(report.issues, vec!["notes dir does not exist"]);
    }
}
