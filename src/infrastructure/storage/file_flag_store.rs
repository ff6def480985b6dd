//! JSON file flag store.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::domain::repositories::{FlagStore, PREFS_NAMESPACE, StoreError};

/// Flag store persisted as a JSON object in `{dir}/{namespace}.json`.
///
/// Writes go to a temporary file which is then renamed over the store, so a
/// crash mid-write leaves the previous contents intact. Every read-modify-write
/// holds an exclusive OS lock on `{dir}/{namespace}.json.lock`, so separate
/// instances and separate processes on the same file are serialized too.
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileFlagStore {
    /// Opens the default `link_first_launch_prefs` namespace under `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_namespace(dir, PREFS_NAMESPACE)
    }

    pub fn with_namespace(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", namespace)),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes a key so that reads fall back to their default again.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.lock_file()?;
        let mut values = self.read_all()?;
        let removed = values.remove(key).is_some();
        if removed {
            self.write_all(&values)?;
        }
        Ok(removed)
    }

    /// Takes the exclusive file lock. Released when the handle is dropped.
    fn lock_file(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.path.with_extension("json.lock"))?;
        file.lock()?;
        Ok(file)
    }

    fn read_all(&self) -> Result<BTreeMap<String, bool>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, bool>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl FlagStore for FileFlagStore {
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.get(key).copied().unwrap_or(default))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.lock_file()?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }

    fn take_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.lock_file()?;
        let mut values = self.read_all()?;
        let previous = values.get(key).copied().unwrap_or(default);
        if values.get(key) != Some(&false) {
            values.insert(key.to_string(), false);
            self.write_all(&values)?;
        }
        Ok(previous)
    }
}
