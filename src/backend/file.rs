//! File Backend
//!
//! Persists the whole store as one JSON object of string keys to string
//! values. Every operation reads the file fresh; writes replace it through a
//! uniquely named temporary file in the same directory and a rename.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::trace;

use crate::backend::Backend;
use crate::error::{CacheError, Result};

type Items = BTreeMap<String, String>;

// == File Backend ==
/// Durable backend stored in a single JSON file.
///
/// A missing file is an empty store. Operations from the same process are
/// serialized by a mutex; nothing coordinates separate processes.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    // == Constructor ==
    /// Creates a backend over `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Items> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Items::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Items::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, items: &Items) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Dropping an unpersisted temp file deletes it
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec(items)?)?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        trace!(path = %self.path.display(), items = items.len(), "file backend saved");
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| CacheError::Backend("file backend lock poisoned".to_string()))
    }
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.guard()?;
        let mut items = self.load()?;
        items.insert(key.to_string(), value);
        self.save(&items)
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let _guard = self.guard()?;
        let mut items = self.load()?;
        if items.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&items)?;
        Ok(true)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("store.json"));

        assert!(backend.get("anything").unwrap().is_none());
        assert!(!backend.remove("anything").unwrap());
        assert!(!backend.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        FileBackend::new(&path)
            .set("key1", "value1".to_string())
            .unwrap();

        let reopened = FileBackend::new(&path);
        assert_eq!(reopened.get("key1").unwrap().as_deref(), Some("value1"));
        assert!(reopened.remove("key1").unwrap());
        assert!(FileBackend::new(&path).get("key1").unwrap().is_none());
    }

    #[test]
    fn test_file_is_a_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let backend = FileBackend::new(&path);
        backend.set("k", "v".to_string()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "k": "v" }));
    }

    #[test]
    fn test_concurrent_writers_leave_valid_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let handles: Vec<_> = (0..4)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    // Separate instances, like separate processes
                    let backend = FileBackend::new(path);
                    for n in 0..25 {
                        backend.set(&format!("w{writer}-{n}"), n.to_string()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Updates may be lost between instances but the file stays whole
        let backend = FileBackend::new(&path);
        assert!(backend.get("w0-0").is_ok());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn test_failed_persist_cleans_up() {
        let dir = tempdir().unwrap();
        // A directory in the way makes the final rename fail
        let path = dir.path().join("store.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let result = FileBackend::new(&path).save(&Items::new());
        assert!(matches!(result, Err(CacheError::Io(_))));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let result = FileBackend::new(&path).get("k");
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
