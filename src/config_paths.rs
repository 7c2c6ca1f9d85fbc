//! Where sm-highlight looks for its user files
//!
//! ```text
//! sm-highlight/
//! ├── config.yaml      defaults for grammar, selector, theme and language
//! ├── themes/{id}.yaml user themes, shadowing a built-in with the same id
//! └── logs/            daily rotated debug log
//! ```
//!
//! The directory is `$XDG_CONFIG_HOME/sm-highlight` or `~/.config/sm-highlight`
//! on Unix and macOS, `%APPDATA%\sm-highlight` on Windows. Nothing is created
//! here except the logs directory.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "sm-highlight";

/// Root of the user files, or `None` when no home directory is known
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// Directory searched for user themes before the built-in ones
pub fn themes_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("themes"))
}

/// The file a user theme with this id would be loaded from
pub fn theme_file(id: &str) -> Option<PathBuf> {
    themes_dir().map(|dir| dir.join(format!("{}.yaml", id)))
}

/// Optional YAML file with highlighting defaults; CLI flags override it
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Create the logs directory for the file log layer, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = logs_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&logs)?;
    Ok(logs)
}
