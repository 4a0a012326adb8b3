use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    errors::{FormError, Result},
    utils::{
        paths::{app_data_dir, config_file_in, ensure_dir},
        persistence::write_atomic,
    },
};

pub const DEFAULT_DRAFT_KEY: &str = "studentFormDraft";
pub const DEFAULT_EXPORT_FILE: &str = "student-information.json";

/// Tunable timings and names. Every field falls back to its default when
/// missing from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub autosave_delay_ms: u64,
    pub notification_timeout_ms: u64,
    pub submission_delay_ms: u64,
    pub draft_key: String,
    pub export_file_name: String,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_delay_ms: 1000,
            notification_timeout_ms: 5000,
            submission_delay_ms: 1500,
            draft_key: DEFAULT_DRAFT_KEY.into(),
            export_file_name: DEFAULT_EXPORT_FILE.into(),
            quiet: false,
        }
    }
}

impl Config {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }

    pub fn submission_delay(&self) -> Duration {
        Duration::from_millis(self.submission_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.draft_key.trim().is_empty() {
            return Err(FormError::Config("draft_key must not be empty".into()));
        }
        if self.export_file_name.trim().is_empty() {
            return Err(FormError::Config(
                "export_file_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| FormError::Config(format!("{}: {}", self.path.display(), err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();

        let config = manager.load().unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.autosave_delay(), Duration::from_millis(1000));
        assert_eq!(config.draft_key, "studentFormDraft");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "submission_delay_ms": 0 }"#).unwrap();

        let config = manager.load().unwrap();

        assert_eq!(config.submission_delay_ms, 0);
        assert_eq!(config.notification_timeout_ms, 5000);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            quiet: true,
            autosave_delay_ms: 250,
            ..Config::default()
        };

        manager.save(&config).unwrap();

        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn empty_draft_key_is_rejected() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "draft_key": "  " }"#).unwrap();

        assert!(matches!(manager.load(), Err(FormError::Config(_))));
    }
}
