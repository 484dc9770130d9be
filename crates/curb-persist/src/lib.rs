//! JSON file-backed persistence for Curbside marketplace state.
//!
//! [`JsonStore`] snapshots a serializable value to `<dir>/<name>.json`.
//! Writes go through a temp file and rename so a crash mid-write never
//! leaves a truncated snapshot. A missing or unreadable snapshot loads as
//! the type's `Default` with a warning, never an error: losing a snapshot
//! must not take the service down.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while saving a snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Filesystem operation failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// The snapshot path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("serialization failed for {name}: {source}")]
    Serialization {
        /// Store name.
        name: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// A named JSON snapshot file inside a state directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    name: String,
}

impl JsonStore {
    /// Creates a store for `<dir>/<name>.json`.
    #[must_use]
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{name}.json")),
            name: name.to_string(),
        }
    }

    /// The snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the last snapshot, or `T::default()` if none is readable.
    #[must_use]
    pub fn load<T: DeserializeOwned + Default>(&self) -> T {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(name = %self.name, "no snapshot on disk, starting empty");
                return T::default();
            }
            Err(e) => {
                warn!(name = %self.name, error = %e, "failed to read snapshot, starting empty");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(name = %self.name, error = %e, "corrupt snapshot, starting empty");
                T::default()
            }
        }
    }

    /// Writes a snapshot atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if serialization or any filesystem step
    /// fails; the previous snapshot is left intact in that case.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(value).map_err(|e| PersistError::Serialization {
            name: self.name.clone(),
            source: e,
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(|e| PersistError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| PersistError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(name = %self.name, bytes = json.len(), "snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "things");

        let value: HashMap<String, u32> = store.load();
        assert!(value.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "things");

        let mut value = HashMap::new();
        value.insert("a".to_string(), 1u32);
        value.insert("b".to_string(), 2u32);
        store.save(&value).expect("save");

        let loaded: HashMap<String, u32> = store.load();
        assert_eq!(loaded, value);
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "things");

        store.save(&vec![1u32, 2, 3]).expect("save");
        store.save(&vec![4u32]).expect("save");

        let loaded: Vec<u32> = store.load();
        assert_eq!(loaded, vec![4]);
    }

    #[test]
    fn corrupt_snapshot_loads_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(dir.path(), "things");

        std::fs::write(store.path(), b"{not json").expect("write");
        let loaded: Vec<u32> = store.load();
        assert!(loaded.is_empty());
    }

    #[test]
    fn creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonStore::new(&dir.path().join("nested/state"), "things");

        store.save(&vec![1u32]).expect("save");
        let loaded: Vec<u32> = store.load();
        assert_eq!(loaded, vec![1]);
    }
}
