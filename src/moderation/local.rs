//! # Local Filesystem Object Store
//!
//! Keys map to paths under a root directory. Keys are relative, use `/` as
//! the only separator and never contain `..` segments.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::errors::{ModerationError, ModerationResult};
use super::store::ObjectStore;

/// Object store rooted at a local directory
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn full_path(&self, key: &str) -> ModerationResult<PathBuf> {
        let invalid = key.is_empty()
            || key.starts_with('/')
            || key.contains('\\')
            || key.contains('\0')
            || key.split('/').any(|segment| segment == "..");
        if invalid {
            return Err(ModerationError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

fn io_error(key: &str, e: io::Error) -> ModerationError {
    if e.kind() == io::ErrorKind::NotFound {
        ModerationError::ObjectNotFound(key.to_string())
    } else {
        ModerationError::Io(e.to_string())
    }
}

impl ObjectStore for LocalObjectStore {
    fn write(&self, key: &str, data: &[u8]) -> ModerationResult<()> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ModerationError::Io(e.to_string()))?;
        }

        fs::write(&full_path, data).map_err(|e| ModerationError::Io(e.to_string()))
    }

    fn read(&self, key: &str) -> ModerationResult<Vec<u8>> {
        let full_path = self.full_path(key)?;
        if full_path.is_dir() {
            return Err(ModerationError::ObjectNotFound(key.to_string()));
        }
        fs::read(&full_path).map_err(|e| io_error(key, e))
    }

    fn delete(&self, key: &str) -> ModerationResult<()> {
        let full_path = self.full_path(key)?;
        fs::remove_file(&full_path).map_err(|e| io_error(key, e))
    }

    fn exists(&self, key: &str) -> ModerationResult<bool> {
        Ok(self.full_path(key)?.is_file())
    }

    fn list(&self, prefix: &str) -> ModerationResult<Vec<String>> {
        let dir = prefix.trim_end_matches('/');
        let full_path = self.full_path(dir)?;
        let mut keys = Vec::new();

        if full_path.is_dir() {
            let entries = fs::read_dir(&full_path).map_err(|e| ModerationError::Io(e.to_string()))?;
            for entry in entries.flatten() {
                if !entry.path().is_file() {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    keys.push(format!("{}/{}", dir, name));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
