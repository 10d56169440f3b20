//! Shared key/value storage visible to every tab
//!
//! Each shell process is one tab. Tabs on the same machine share a storage
//! directory; tabs inside one process can share a [`MemoryStorage`].

mod signal;

pub use signal::{LogoutSignal, LOGOUT_SIGNAL_KEY};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Last-writer-wins string storage shared between tabs
pub trait SharedStorage: Send + Sync + fmt::Debug {
    /// Read a value, `None` if the key was never written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Storage backed by one file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Storage(format!("Invalid storage key: {:?}", key)));
        }
        Ok(self.dir.join(key))
    }
}

impl SharedStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        fs::create_dir_all(&self.dir)?;

        // Readers in other processes must never see a half-written value
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process storage; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get_item("auth_logout").unwrap(), None);
        storage.set_item("auth_logout", "1700000000000").unwrap();
        assert_eq!(
            storage.get_item("auth_logout").unwrap().as_deref(),
            Some("1700000000000")
        );

        storage.set_item("auth_logout", "1700000000001").unwrap();
        assert_eq!(
            storage.get_item("auth_logout").unwrap().as_deref(),
            Some("1700000000001")
        );
    }

    #[test]
    fn test_file_storage_is_shared_between_handles() {
        let dir = TempDir::new().unwrap();
        let tab_a = FileStorage::new(dir.path());
        let tab_b = FileStorage::new(dir.path());

        tab_a.set_item("chat_session_id", "abc").unwrap();
        assert_eq!(tab_b.get_item("chat_session_id").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.set_item("../escape", "x"),
            Err(Error::Storage(_))
        ));
        assert!(matches!(storage.get_item(""), Err(Error::Storage(_))));
    }

    #[test]
    fn test_memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(other.get_item("missing").unwrap(), None);
    }
}
