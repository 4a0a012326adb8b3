use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::{FormError, Result},
    utils::{
        paths::{app_data_dir, ensure_dir, storage_file_in},
        persistence::write_atomic,
    },
};

use super::KeyValueStore;

/// Key-value store kept as one JSON object in a file. Every write rewrites
/// the whole file atomically.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `storage.json` inside `base` (or the application data
    /// directory), creating the directory if needed.
    pub fn in_dir(base: Option<PathBuf>) -> Result<Self> {
        let base = base.unwrap_or_else(app_data_dir);
        ensure_dir(&base)?;
        Ok(Self::new(storage_file_in(&base)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|err| {
            FormError::Storage(format!(
                "storage file `{}` is unreadable: {}",
                self.path.display(),
                err
            ))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, &json)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_a_new_handle() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::in_dir(Some(dir.path().to_path_buf())).unwrap();
        store.set("studentFormDraft", r#"{"firstName":"Jo"}"#).unwrap();
        store.set("other", "kept").unwrap();

        let reopened = JsonFileStore::in_dir(Some(dir.path().to_path_buf())).unwrap();

        assert_eq!(
            reopened.get("studentFormDraft").unwrap().as_deref(),
            Some(r#"{"firstName":"Jo"}"#)
        );
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("kept"));
        assert_eq!(reopened.get("missing").unwrap(), None);
    }

    #[test]
    fn remove_only_touches_the_named_key() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::in_dir(Some(dir.path().to_path_buf())).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        store.remove("a").unwrap();
        store.remove("never-set").unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_reports_storage_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::in_dir(Some(dir.path().to_path_buf())).unwrap();
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.get("a"), Err(FormError::Storage(_))));
    }
}
