// Linkshelf platform paths
// Config and data directories for Windows, macOS and Linux, selected with `cfg(target_os)`.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "linkshelf";

/// Overrides the data directory (and with it the database location).
pub const DATA_DIR_ENV: &str = "LINKSHELF_DATA_DIR";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Returns the configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/linkshelf`, else `~/.config/linkshelf`
/// - **macOS**: `~/Library/Application Support/linkshelf`
/// - **Windows**: `%APPDATA%/linkshelf`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        appdata_dir().join(APP_DIR)
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
            _ => home_dir().join(".config").join(APP_DIR),
        }
    }
}

/// Returns the data directory. `LINKSHELF_DATA_DIR` wins on every platform.
///
/// - **Linux**: `$XDG_DATA_HOME/linkshelf`, else `~/.local/share/linkshelf`
/// - **macOS**: `~/Library/Application Support/linkshelf`
/// - **Windows**: `%APPDATA%/linkshelf`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    #[cfg(target_os = "windows")]
    {
        appdata_dir().join(APP_DIR)
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().join("Library").join("Application Support").join(APP_DIR)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        match env::var("XDG_DATA_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
            _ => home_dir().join(".local").join("share").join(APP_DIR),
        }
    }
}

/// Location of the SQLite database file.
pub fn get_database_path() -> PathBuf {
    get_data_dir().join("linkshelf.db")
}

#[cfg(target_os = "windows")]
fn appdata_dir() -> PathBuf {
    env::var("APPDATA")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
}
