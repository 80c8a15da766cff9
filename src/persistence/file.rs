use super::{KeyValueStore, TRACING_TARGET};
use crate::error::StoreError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Directory-backed store: one `<slot>.json` file per slot.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-save never leaves a half-written slot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::Io(format!("Could not create store directory '{}': {}", dir.display(), e))
        })?;
        Ok(Self { dir, quota: None })
    }

    /// Limits the summed size of all slot files in the directory.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(StoreError::Io(format!("Invalid slot name '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.{}", key, EXTENSION)))
    }

    fn used_bytes_except(&self, skip: &Path) -> Result<usize, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StoreError::Io(format!("Could not list '{}': {}", self.dir.display(), e))
        })?;
        let mut total = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                total += meta.len() as usize;
            }
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!(
                "Could not read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        if let Some(limit) = self.quota {
            let requested = self.used_bytes_except(&path)? + value.len();
            if requested > limit {
                return Err(StoreError::QuotaExceeded { requested, limit });
            }
        }

        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io(format!("Could not write '{}': {}", path.display(), e))
        })?;

        tracing::trace!(
            target: TRACING_TARGET,
            path = %path.display(),
            bytes = value.len(),
            "Slot written"
        );
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!(
                "Could not remove '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}
