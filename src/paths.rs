//! XDG-style path utilities for locating the configuration file.

use std::path::{Path, PathBuf};

const APP_NAME: &str = "papertrans";
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Returns the configuration directory for papertrans.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/papertrans` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/papertrans` otherwise
///
/// Returns `None` when neither is available.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|xdg| !xdg.is_empty())
        .map(|xdg| PathBuf::from(xdg).join(APP_NAME))
        .or_else(|| dirs::home_dir().map(|home| home.join(".config").join(APP_NAME)))
}

/// Returns the configuration file used when none is given on the command line.
///
/// `./config.yaml` wins if it exists, then the user configuration directory.
/// Falls back to `config.yaml` in the working directory so the "not found"
/// error names a sensible path.
pub fn default_config_path() -> PathBuf {
    let local = Path::new(CONFIG_FILE_NAME);
    if local.is_file() {
        return local.to_path_buf();
    }

    config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
        .unwrap_or_else(|| local.to_path_buf())
}
