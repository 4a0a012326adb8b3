use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::Result;

use super::paths::ensure_dir;

const TMP_SUFFIX: &str = "tmp";

/// Writes `data` to `path` atomically by staging to a sibling temporary file.
pub fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("slot.json");

        write_atomic(&path, "{}").expect("write");

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_write_preserves_original_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("slot.json");
        write_atomic(&path, "{\"a\":\"1\"}").unwrap();

        // A directory at the temp location makes File::create fail.
        fs::create_dir_all(tmp_path(&path)).unwrap();
        assert!(write_atomic(&path, "{\"a\":\"2\"}").is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":\"1\"}");
    }
}
