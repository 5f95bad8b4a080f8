//! File-backed key-value store.

use crate::{KeyValueBackend, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;

/// Backend persisting every key in one JSON object file
///
/// Each call re-reads the file and each write rewrites it, so separate
/// processes over the same path see each other's writes on their next call
/// and the last writer wins. Writes go to a uniquely named sibling temporary
/// file first and are renamed into place.
///
/// A file that does not parse makes reads fail with [`StorageError::Corrupt`].
/// The next write moves it aside to `<path>.corrupt` and starts over from an
/// empty object.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Create a backend over `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(error.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|error| StorageError::Corrupt {
            path: self.path.clone(),
            reason: error.to_string(),
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let encoded = serde_json::to_string_pretty(entries)?;
        let mut staging = NamedTempFile::new_in(parent)?;
        staging.write_all(encoded.as_bytes())?;
        staging.persist(&self.path).map_err(|error| error.error)?;
        Ok(())
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut aside = self.path.clone().into_os_string();
        aside.push(".corrupt");
        PathBuf::from(aside)
    }

    fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt { reason, .. }) => {
                let aside = self.corrupt_path();
                tracing::warn!(
                    path = %self.path.display(),
                    aside = %aside.display(),
                    %reason,
                    "Storage file is corrupt, moving it aside and starting empty"
                );
                match fs::rename(&self.path, &aside) {
                    // Another handle moved it first
                    Err(error) if error.kind() == ErrorKind::NotFound => {},
                    other => other?,
                }
                BTreeMap::new()
            },
            Err(error) => return Err(error),
        };
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        tracing::trace!(key, path = %self.path.display(), "Removing key from storage file");
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("storage.json"));

        assert!(backend.get("theme").unwrap().is_none());
        backend.remove("theme").unwrap();
    }

    #[test]
    fn test_two_handles_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let first = FileBackend::new(&path);
        let second = FileBackend::new(&path);

        first.set("theme", "\"dark\"").unwrap();
        second.set("language", "\"hi\"").unwrap();

        assert_eq!(second.get("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(first.get("language").unwrap().as_deref(), Some("\"hi\""));

        first.remove("theme").unwrap();
        assert!(second.get("theme").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_fails_reads_until_the_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{truncated").unwrap();

        let backend = FileBackend::new(&path);
        assert!(matches!(backend.get("theme"), Err(StorageError::Corrupt { .. })));

        backend.set("theme", "\"dark\"").unwrap();

        assert_eq!(backend.get("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(fs::read_to_string(dir.path().join("storage.json.corrupt")).unwrap(), "{truncated");
    }

    #[test]
    fn test_remove_also_recovers_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2").unwrap();

        let backend = FileBackend::new(&path);
        backend.remove("theme").unwrap();

        assert!(backend.get("theme").unwrap().is_none());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn test_concurrent_handles_never_leave_a_torn_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let writers: Vec<_> = (0..8)
            .map(|n| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let backend = FileBackend::new(path);
                    for round in 0..10 {
                        backend.set(&format!("key-{n}"), &round.to_string()).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        // Handles do not coordinate, so some updates may be lost, but every
        // rename installs a whole file and no staging file is left behind.
        let contents = fs::read_to_string(&path).unwrap();
        let entries: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert!(!entries.is_empty());
        assert!(entries.values().all(|value| value.parse::<u32>().unwrap() < 10));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
