use crate::notes::paths::NotePaths;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn audit_log_path(paths: &NotePaths) -> PathBuf {
    paths.logs_dir.join("audit.log")
}

fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}

pub fn append_event(paths: &NotePaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = audit_log_path(paths);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{append_event, audit_log_path};
    use crate::notes::paths::NotePaths;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn appends_one_json_line_per_event() {
        let tmp = tempdir().expect("tempdir");
        let paths = NotePaths {
            home: tmp.path().to_path_buf(),
            notes_dir: tmp.path().to_path_buf(),
            config_file: tmp.path().join("config.toml"),
            logs_dir: tmp.path().join("logs"),
        };

        append_event(&paths, "archive", "ok", "wrote archive-Apr2024.txt").expect("first");
        append_event(&paths, "delete", "ok", "removed 2024-04-05.txt").expect("second");

        let raw = fs::read_to_string(audit_log_path(&paths)).expect("read audit log");
        let lines = raw.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json");
        assert_eq!(first["phase"], "archive");
        assert_eq!(first["message"], "wrote archive-Apr2024.txt");
    }
}
