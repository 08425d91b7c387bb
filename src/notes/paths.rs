use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct NotePaths {
    pub home: PathBuf,
    pub notes_dir: PathBuf,
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    env_path(var).unwrap_or(fallback)
}

pub fn resolve_paths() -> Result<NotePaths> {
    let home = match env_path("NOTEFOLD_HOME") {
        Some(home) => home,
        None => required_home_dir()?.join(".notefold"),
    };

    let notes_dir = env_or_default_path("NOTEFOLD_NOTES_DIR", home.clone());
    let config_file = env_or_default_path("NOTEFOLD_CONFIG_PATH", home.join("config.toml"));
    let logs_dir = env_or_default_path("NOTEFOLD_LOGS_DIR", home.join("logs"));

    Ok(NotePaths {
        home,
        notes_dir,
        config_file,
        logs_dir,
    })
}
