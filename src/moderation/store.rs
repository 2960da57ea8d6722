//! # Object Store Trait

use super::errors::ModerationResult;

/// Flat key → bytes store holding comment documents
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Write data to key, replacing any existing object
    fn write(&self, key: &str, data: &[u8]) -> ModerationResult<()>;

    /// Read the object at key
    fn read(&self, key: &str) -> ModerationResult<Vec<u8>>;

    /// Delete the object at key
    fn delete(&self, key: &str) -> ModerationResult<()>;

    /// Check if key exists
    fn exists(&self, key: &str) -> ModerationResult<bool>;

    /// List keys under prefix, sorted
    fn list(&self, prefix: &str) -> ModerationResult<Vec<String>>;

    /// Copy an object to a new key
    fn copy(&self, from: &str, to: &str) -> ModerationResult<()> {
        let data = self.read(from)?;
        self.write(to, &data)
    }

    /// Move an object: copy, then delete the source
    fn move_object(&self, from: &str, to: &str) -> ModerationResult<()> {
        self.copy(from, to)?;
        self.delete(from)
    }
}
