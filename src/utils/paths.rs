use dirs::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

const DEFAULT_DIR_NAME: &str = ".student_form";
const CONFIG_FILE: &str = "config.json";
const STORAGE_FILE: &str = "storage.json";

/// Returns the application data directory, defaulting to `~/.student_form`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("STUDENT_FORM_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Path of the key-value file that holds the draft slot.
pub fn storage_file_in(base: &Path) -> PathBuf {
    base.join(STORAGE_FILE)
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
